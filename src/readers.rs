use std::fs::OpenOptions;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use time::{Date, Duration, Month, PrimitiveDateTime, Time};

use crate::catalog::VariableCatalog;
use crate::cursor::ByteCursor;
use crate::error::{MdfsError, MdfsResult};
use crate::grid::{GridDecoder, GridField};
use crate::station::{StationDecoder, StationOptions, StationTable};

/// MDFSファイルの先頭4バイト
pub const MAGIC: &[u8; 4] = b"mdfs";

/// gzipで圧縮されたファイルの先頭バイト
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// bzip2で圧縮されたファイルの先頭バイト
const BZIP2_MAGIC: &[u8] = b"BZh";

/// MDFSファイルに記録されているデータの種類
///
/// ファイル自体は種類を示さないため、呼び出し側が指定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// 地点データ
    Station,
    /// 格子データ
    Grid,
}

/// 読み込んだデータ
#[derive(Debug, Clone, PartialEq)]
pub enum MdfsData {
    Station(StationTable),
    Grid(GridField),
}

/// MDFSファイル・リーダー
///
/// 要素辞書は複数のリーダー、スレッドで共有できる。
#[derive(Debug, Clone)]
pub struct MdfsReader {
    /// 要素辞書
    catalog: Arc<VariableCatalog>,
    /// 地点データの読み込み設定
    station_options: StationOptions,
}

impl MdfsReader {
    /// リーダーを構築する。
    ///
    /// # 引数
    ///
    /// * `catalog` - 地点データの要素の型を引く要素辞書
    pub fn new(catalog: Arc<VariableCatalog>) -> Self {
        Self {
            catalog,
            station_options: StationOptions::default(),
        }
    }

    /// 地点データの読み込み設定を変更したリーダーを返す。
    pub fn with_station_options(mut self, options: StationOptions) -> Self {
        self.station_options = options;
        self
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    /// 地点データのファイルを読み込む。
    pub fn read_station<P>(&self, path: P) -> MdfsResult<StationTable>
    where
        P: AsRef<Path>,
    {
        self.decode_station(open_path(path)?)
    }

    /// 格子データのファイルを読み込む。
    pub fn read_grid<P>(&self, path: P) -> MdfsResult<GridField>
    where
        P: AsRef<Path>,
    {
        GridDecoder::new().decode(open_path(path)?)
    }

    /// 指定された種類のデータとしてファイルを読み込む。
    ///
    /// # 引数
    ///
    /// * `path` - MDFSファイルのパス
    /// * `kind` - ファイルに記録されているデータの種類
    ///
    /// # 戻り値
    ///
    /// 読み込んだデータ
    pub fn read<P>(&self, path: P, kind: PayloadKind) -> MdfsResult<MdfsData>
    where
        P: AsRef<Path>,
    {
        match kind {
            PayloadKind::Station => self.read_station(path).map(MdfsData::Station),
            PayloadKind::Grid => self.read_grid(path).map(MdfsData::Grid),
        }
    }

    /// メモリ上の地点データを読み込む。
    pub fn decode_station_bytes(&self, bytes: Vec<u8>) -> MdfsResult<StationTable> {
        self.decode_station(open_bytes(bytes)?)
    }

    /// メモリ上の格子データを読み込む。
    pub fn decode_grid_bytes(&self, bytes: Vec<u8>) -> MdfsResult<GridField> {
        GridDecoder::new().decode(open_bytes(bytes)?)
    }

    fn decode_station(&self, cursor: ByteCursor) -> MdfsResult<StationTable> {
        StationDecoder::new(&self.catalog, self.station_options).decode(cursor)
    }
}

/// MDFSファイルを開く。
///
/// ファイルがgzipまたはbzip2で圧縮されている場合は展開する。
/// ファイルはすべて読み込んだ後に閉じる。
///
/// # 引数
///
/// * `path` - MDFSファイルのパス
///
/// # 戻り値
///
/// 先頭4バイトの直後を読み込み位置とするカーソル
pub fn open_path<P>(path: P) -> MdfsResult<ByteCursor>
where
    P: AsRef<Path>,
{
    let file = OpenOptions::new()
        .read(true)
        .open(path.as_ref())
        .map_err(|e| MdfsError::Open(format!("{e}")))?;
    let mut raw = vec![];
    BufReader::new(file)
        .read_to_end(&mut raw)
        .map_err(|e| MdfsError::Open(format!("{e}")))?;

    let bytes = if raw.starts_with(GZIP_MAGIC) {
        tracing::debug!(path = %path.as_ref().display(), "gzipで圧縮されたファイルを展開します");
        inflate(GzDecoder::new(raw.as_slice()), "gzip")?
    } else if raw.starts_with(BZIP2_MAGIC) {
        tracing::debug!(path = %path.as_ref().display(), "bzip2で圧縮されたファイルを展開します");
        inflate(BzDecoder::new(raw.as_slice()), "bzip2")?
    } else {
        raw
    };

    open_bytes(bytes)
}

/// ストリームからMDFSファイルを読み込む。
///
/// ストリームは展開済みであることを想定している。
pub fn open_reader<R>(mut reader: R) -> MdfsResult<ByteCursor>
where
    R: Read,
{
    let mut bytes = vec![];
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| MdfsError::Open(format!("{e}")))?;

    open_bytes(bytes)
}

/// メモリ上のMDFSファイルの先頭4バイトを検証する。
///
/// # 戻り値
///
/// 先頭4バイトの直後を読み込み位置とするカーソル
pub fn open_bytes(bytes: Vec<u8>) -> MdfsResult<ByteCursor> {
    let mut cursor = ByteCursor::new(bytes);
    let magic = cursor
        .read_fixed(MAGIC.len())
        .map_err(|_| MdfsError::InvalidMagic(vec![]))?;
    if magic != MAGIC {
        return Err(MdfsError::InvalidMagic(magic.to_vec()));
    }

    Ok(cursor)
}

fn inflate<R>(mut decoder: R, format: &str) -> MdfsResult<Vec<u8>>
where
    R: Read,
{
    let mut bytes = vec![];
    decoder
        .read_to_end(&mut bytes)
        .map_err(|e| MdfsError::Decompress(format!("{format}: {e}")))?;

    Ok(bytes)
}

/// ヘッダに記録されている地方時をUTCに変換する。
///
/// # 引数
///
/// * `year`〜`second` - 地方時
/// * `tz` - UTCとの時差（時間）
#[allow(clippy::too_many_arguments)]
pub(crate) fn read_utc_date_time(
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
    second: i32,
    tz: i32,
) -> MdfsResult<PrimitiveDateTime> {
    let component = |name: &str, value: i32| {
        u8::try_from(value).map_err(|_| {
            MdfsError::InvalidDateTime(format!("ファイルに記録されている{name}({value})が不正です。"))
        })
    };
    let month_enum = Month::try_from(component("月", month)?).map_err(|e| {
        MdfsError::InvalidDateTime(format!("ファイルに記録されている月({month})が不正です。{e}"))
    })?;
    let date = Date::from_calendar_date(year, month_enum, component("日", day)?).map_err(|e| {
        MdfsError::InvalidDateTime(format!(
            "ファイルに記録されている年月日から、日付を構築できませんでした。{e}"
        ))
    })?;
    let time = Time::from_hms(
        component("時", hour)?,
        component("分", minute)?,
        component("秒", second)?,
    )
    .map_err(|e| {
        MdfsError::InvalidDateTime(format!(
            "ファイルに記録されている時分秒から、時間を構築できませんでした。{e}"
        ))
    })?;

    PrimitiveDateTime::new(date, time)
        .checked_sub(Duration::hours(tz as i64))
        .ok_or_else(|| MdfsError::InvalidDateTime(format!("時差({tz})が不正です。")))
}
