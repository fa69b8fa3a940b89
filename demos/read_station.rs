use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use time::format_description::FormatItem;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

use mdfs::{IdMode, MdfsReader, StationOptions, VariableCatalog};

/// 観測日時の書式
const DATETIME_FMT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// 地点データのMDFSファイルを読み込んで、局ごとの要素を出力する。
#[derive(Debug, Parser)]
struct Args {
    /// 要素辞書（JSON）のパス
    #[arg(long)]
    catalog: PathBuf,

    /// 局IDを常に32ビット整数として読み込む
    #[arg(long)]
    numeric_id: bool,

    /// 出力する局の最大数
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// MDFSファイルのパス
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let catalog = Arc::new(VariableCatalog::from_path(&args.catalog)?);
    let options = StationOptions {
        id_mode: if args.numeric_id {
            IdMode::Numeric
        } else {
            IdMode::FromHeader
        },
        ..Default::default()
    };
    let reader = MdfsReader::new(Arc::clone(&catalog)).with_station_options(options);
    let table = reader.read_station(&args.path)?;

    let header = table.header();
    println!("{} {}", header.description, header.level_description);
    println!("UTC: {}", header.utc_time.format(DATETIME_FMT)?);
    println!("局数: {}", table.len());
    for index in 0..table.len().min(args.limit) {
        let Some(record) = table.row(index) else {
            break;
        };
        println!("{} ({:.3}, {:.3})", record.id, record.lon, record.lat);
        for (var_id, value) in &record.values {
            let name = catalog.name(*var_id).unwrap_or_default();
            println!("  {var_id:>5} {name}: {value:.1}");
        }
    }

    Ok(())
}
