use ndarray::Array2;
use time::{Duration, PrimitiveDateTime};

use crate::cursor::ByteCursor;
use crate::error::{MdfsError, MdfsResult};
use crate::readers::read_utc_date_time;

/// 予備領域のバイト数
const RESERVED_BYTES: usize = 100;

/// スカラー格子を示すデータ種別
const SCALAR_GRID: i16 = 4;

/// ベクトル格子を示すデータ種別
const VECTOR_GRID: i16 = 11;

/// 格子の軸の定義
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    /// 開始値（度）
    pub start: f32,
    /// 終了値（度）
    pub end: f32,
    /// 格子間隔（度）
    pub spacing: f32,
    /// 格子数
    pub number: i32,
}

impl Axis {
    /// 軸の座標を返す。
    ///
    /// 座標は開始値から格子間隔ずつ増やした`number`個の値である。
    /// 終了値は検証にのみ使用し、座標の数は常に格子数と一致する。
    pub fn coordinates(&self) -> Vec<f64> {
        let start = self.start as f64;
        let spacing = self.spacing as f64;
        (0..self.number.max(0))
            .map(|i| start + i as f64 * spacing)
            .collect()
    }

    fn read(cursor: &mut ByteCursor) -> MdfsResult<Self> {
        Ok(Self {
            start: cursor.read_f32()?,
            end: cursor.read_f32()?,
            spacing: cursor.read_f32()?,
            number: cursor.read_i32()?,
        })
    }

    fn reaches_end(&self) -> bool {
        let last = self.start as f64 + (self.number - 1) as f64 * self.spacing as f64;
        (last - self.end as f64).abs() <= (self.spacing as f64).abs() / 2.0
    }
}

/// 等値線の定義
///
/// 読み込むだけで使用しない。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isoline {
    pub start: f32,
    pub end: f32,
    pub spacing: f32,
}

/// 格子データのヘッダ
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    /// データ種別
    ///
    /// 4: スカラー格子、11: ベクトル格子
    pub data_type: i16,

    /// モデル名
    pub model_name: String,

    /// 要素名
    pub element: String,

    /// データの説明
    pub description: String,

    /// 層
    pub level: f32,

    /// 初期時刻（UTC）
    pub utc_time: PrimitiveDateTime,

    /// 予報時間（時間）
    pub period: i32,

    /// 経度方向の軸
    pub lon: Axis,

    /// 緯度方向の軸
    pub lat: Axis,

    /// 等値線
    pub isoline: Isoline,
}

impl GridHeader {
    /// 予報対象時刻を返す。
    pub fn valid_time(&self) -> Option<PrimitiveDateTime> {
        self.utc_time
            .checked_add(Duration::hours(self.period as i64))
    }
}

/// 格子の値
#[derive(Debug, Clone, PartialEq)]
pub enum GridData {
    /// スカラー格子
    Scalar(Array2<f32>),

    /// ベクトル格子
    Vector {
        /// 大きさ
        norm: Array2<f32>,
        /// 方位角（度、北を0とする時計回り）
        direction: Array2<f32>,
    },

    /// サポートしていないデータ種別
    ///
    /// 座標のみを持つ。
    Unsupported,
}

/// 格子データ
///
/// 値の配列の形状は（緯度方向の格子数、経度方向の格子数）である。
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    header: GridHeader,
    lon: Vec<f64>,
    lat: Vec<f64>,
    data: GridData,
}

impl GridField {
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// 経度方向の座標を返す。
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    /// 緯度方向の座標を返す。
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn data(&self) -> &GridData {
        &self.data
    }

    /// （緯度方向の格子数、経度方向の格子数）を返す。
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// スカラー格子の値を返す。
    pub fn grid(&self) -> Option<&Array2<f32>> {
        match &self.data {
            GridData::Scalar(grid) => Some(grid),
            _ => None,
        }
    }

    /// ベクトル格子の大きさを返す。
    pub fn norm(&self) -> Option<&Array2<f32>> {
        match &self.data {
            GridData::Vector { norm, .. } => Some(norm),
            _ => None,
        }
    }

    /// ベクトル格子の方位角を返す。
    pub fn direction(&self) -> Option<&Array2<f32>> {
        match &self.data {
            GridData::Vector { direction, .. } => Some(direction),
            _ => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.data, GridData::Vector { .. })
    }
}

/// 独自に定義された角度を、北を0とする時計回りの方位角に変換する。
///
/// 方位角は`270 - angle`を[0, 360)に収めた値である。
pub fn self_defined_to_direction(angle: f32) -> f32 {
    let direction = (270.0 - angle).rem_euclid(360.0);
    // 丸め誤差で360になる場合がある
    if direction >= 360.0 {
        direction - 360.0
    } else {
        direction
    }
}

/// 格子データのデコーダー
#[derive(Debug, Clone, Copy, Default)]
pub struct GridDecoder;

impl GridDecoder {
    pub fn new() -> Self {
        Self
    }

    /// 格子データを読み込む。
    ///
    /// `cursor`の読み込み位置は、先頭4バイトの`mdfs`の直後であることを想定している。
    ///
    /// # 引数
    ///
    /// * `cursor` - MDFSファイルのカーソル
    ///
    /// # 戻り値
    ///
    /// 格子データ
    pub fn decode(&self, mut cursor: ByteCursor) -> MdfsResult<GridField> {
        let header = read_grid_header(&mut cursor)?;
        tracing::debug!(
            model = %header.model_name,
            element = %header.element,
            data_type = header.data_type,
            lon_number = header.lon.number,
            lat_number = header.lat.number,
            "格子データのヘッダを読み込みました"
        );

        let invalid_geometry = || MdfsError::InvalidGeometry {
            lon_number: header.lon.number,
            lat_number: header.lat.number,
        };
        if header.lon.number <= 0 || header.lat.number <= 0 {
            return Err(invalid_geometry());
        }
        let lon_number = header.lon.number as usize;
        let lat_number = header.lat.number as usize;
        let block_num = lon_number
            .checked_mul(lat_number)
            .ok_or_else(invalid_geometry)?;

        for (name, axis) in [("経度", &header.lon), ("緯度", &header.lat)] {
            if !axis.reaches_end() {
                tracing::debug!(
                    axis = name,
                    start = axis.start,
                    end = axis.end,
                    spacing = axis.spacing,
                    number = axis.number,
                    "格子数から求めた終了値がヘッダの終了値と一致しません"
                );
            }
        }
        // 座標は値の読み込みでバイト数を検証した後に生成する
        let shape = (lat_number, lon_number);
        let data = match header.data_type {
            SCALAR_GRID => {
                let grid = read_values(&mut cursor, block_num)?;
                GridData::Scalar(to_array(shape, grid)?)
            }
            VECTOR_GRID => {
                let norm = read_values(&mut cursor, block_num)?;
                let angle = read_values(&mut cursor, block_num)?;
                let direction = angle.into_iter().map(self_defined_to_direction).collect();
                GridData::Vector {
                    norm: to_array(shape, norm)?,
                    direction: to_array(shape, direction)?,
                }
            }
            data_type => {
                tracing::warn!(data_type, "サポートしていないデータ種別のため座標のみを返します");
                GridData::Unsupported
            }
        };
        let lon = header.lon.coordinates();
        let lat = header.lat.coordinates();

        Ok(GridField {
            header,
            lon,
            lat,
            data,
        })
    }
}

fn read_values(cursor: &mut ByteCursor, block_num: usize) -> MdfsResult<Vec<f32>> {
    let bytes = block_num.checked_mul(4).ok_or(MdfsError::TruncatedInput {
        position: cursor.position(),
        requested: usize::MAX,
        remaining: cursor.remaining(),
    })?;
    let raw = cursor.read_fixed(bytes)?;

    Ok(raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn to_array(shape: (usize, usize), values: Vec<f32>) -> MdfsResult<Array2<f32>> {
    Array2::from_shape_vec(shape, values).map_err(|e| {
        MdfsError::Unexpected(format!("格子の値を配列に変換できませんでした。{e}"))
    })
}

fn read_grid_header(cursor: &mut ByteCursor) -> MdfsResult<GridHeader> {
    let data_type = cursor.read_i16()?;
    let model_name = cursor.read_text(20)?;
    let element = cursor.read_text(50)?;
    let description = cursor.read_text(30)?;
    let level = cursor.read_f32()?;
    let year = cursor.read_i32()?;
    let month = cursor.read_i32()?;
    let day = cursor.read_i32()?;
    let hour = cursor.read_i32()?;
    let tz = cursor.read_i32()?;
    let utc_time = read_utc_date_time(year, month, day, hour, 0, 0, tz)?;
    let period = cursor.read_i32()?;
    let lon = Axis::read(cursor)?;
    let lat = Axis::read(cursor)?;
    let isoline = Isoline {
        start: cursor.read_f32()?,
        end: cursor.read_f32()?,
        spacing: cursor.read_f32()?,
    };
    cursor.skip(RESERVED_BYTES)?;

    Ok(GridHeader {
        data_type,
        model_name,
        element,
        description,
        level,
        utc_time,
        period,
        lon,
        lat,
        isoline,
    })
}
