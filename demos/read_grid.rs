use std::path::PathBuf;

use clap::Parser;
use time::format_description::FormatItem;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;

use mdfs::{GridData, GridDecoder};

/// 初期時刻と予報対象時刻の書式
const DATETIME_FMT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:00");

/// 格子データのMDFSファイルを読み込んで、ヘッダと値の統計を出力する。
#[derive(Debug, Parser)]
struct Args {
    /// MDFSファイルのパス
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let grid = GridDecoder::new().decode(mdfs::open_path(&args.path)?)?;
    let header = grid.header();
    println!(
        "{} {} {} {}",
        header.model_name, header.element, header.description, header.level
    );
    println!("初期時刻(UTC): {}", header.utc_time.format(DATETIME_FMT)?);
    if let Some(valid_time) = header.valid_time() {
        println!("予報対象時刻(UTC): {}", valid_time.format(DATETIME_FMT)?);
    }
    let (lat_number, lon_number) = grid.shape();
    println!("格子数: 緯度方向{lat_number} x 経度方向{lon_number}");

    match grid.data() {
        GridData::Scalar(values) => {
            let (min, max) = min_max(values.iter().copied());
            println!("最小値: {min}, 最大値: {max}");
        }
        GridData::Vector { norm, direction } => {
            let (min, max) = min_max(norm.iter().copied());
            println!("大きさ 最小値: {min}, 最大値: {max}");
            let (min, max) = min_max(direction.iter().copied());
            println!("方位角 最小値: {min}, 最大値: {max}");
        }
        GridData::Unsupported => println!("データ種別{}は座標のみ", header.data_type),
    }

    Ok(())
}

fn min_max<I>(values: I) -> (f32, f32)
where
    I: Iterator<Item = f32>,
{
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}
