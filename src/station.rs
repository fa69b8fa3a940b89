use std::collections::BTreeMap;

use time::PrimitiveDateTime;

use crate::catalog::{resolve_type_tag, LongWidth, ScalarKind, VariableCatalog};
use crate::cursor::ByteCursor;
use crate::error::{MdfsError, MdfsResult};
use crate::readers::read_utc_date_time;

/// 予備領域のバイト数
const RESERVED_BYTES: usize = 98;

/// 品質管理コードとして扱う偶数の要素番号の範囲
const QUALITY_CODE_RANGE: std::ops::Range<i16> = 0..22;

/// 品質管理コード以外の偶数の要素番号に適用する型タグ
const QUALITY_BYTE_TAG: i32 = 1;

/// 局IDを文字列で記録していることを示す`id_type`
const TEXT_ID_TYPE: i16 = 1;

/// 局IDの記録方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMode {
    /// ヘッダの`id_type`に従う
    #[default]
    FromHeader,

    /// 常に32ビット整数として読み込む
    ///
    /// `id_type`の位置が予備領域だった旧形式のファイル向け。
    Numeric,
}

/// 地点データの読み込み設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StationOptions {
    /// 局IDの記録方法
    pub id_mode: IdMode,

    /// 型タグ4のバイト数
    pub long_width: LongWidth,
}

/// 地点データのヘッダ
#[derive(Debug, Clone, PartialEq)]
pub struct StationHeader {
    /// データ種別
    pub data_type: i16,

    /// データの説明
    pub description: String,

    /// 層
    pub level: f32,

    /// 層の説明
    pub level_description: String,

    /// 観測日時（UTC）
    pub utc_time: PrimitiveDateTime,

    /// 局IDの種別
    ///
    /// 1の場合は可変長の文字列、それ以外は32ビット整数。
    pub id_type: i16,

    /// 局数
    pub station_num: usize,

    /// ファイルが宣言している要素番号と予約値の組み合わせ
    ///
    /// 記録順に格納する。
    pub declared_quantities: Vec<(i16, i16)>,
}

/// 局ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationId {
    Numeric(i32),
    Text(String),
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id}"),
        }
    }
}

/// 局IDの列
#[derive(Debug, Clone, PartialEq)]
pub enum StationIds {
    Numeric(Vec<i32>),
    Text(Vec<String>),
}

impl StationIds {
    fn with_capacity(text: bool, capacity: usize) -> Self {
        if text {
            Self::Text(Vec::with_capacity(capacity))
        } else {
            Self::Numeric(Vec::with_capacity(capacity))
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(ids) => ids.len(),
            Self::Text(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 指定された位置の局IDを返す。
    pub fn get(&self, index: usize) -> Option<StationId> {
        match self {
            Self::Numeric(ids) => ids.get(index).copied().map(StationId::Numeric),
            Self::Text(ids) => ids.get(index).cloned().map(StationId::Text),
        }
    }

    /// 局IDが記録されている位置を返す。
    pub fn position(&self, id: &StationId) -> Option<usize> {
        match (self, id) {
            (Self::Numeric(ids), StationId::Numeric(id)) => ids.iter().position(|i| i == id),
            (Self::Text(ids), StationId::Text(id)) => ids.iter().position(|i| i == id),
            _ => None,
        }
    }
}

/// 要素の列
///
/// 値を記録していない局は`f64::NAN`になる。
#[derive(Debug, Clone, PartialEq)]
pub struct VariableColumn {
    /// 要素の値の型
    ///
    /// 要素辞書に登録されていない宣言だけの要素は`None`。
    pub kind: Option<ScalarKind>,

    /// 局ごとの値
    pub values: Vec<f64>,
}

impl VariableColumn {
    fn missing(kind: Option<ScalarKind>, len: usize) -> Self {
        Self {
            kind,
            values: vec![f64::NAN; len],
        }
    }

    /// 値を記録していない局の数を返す。
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// 1局分のデータ
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub id: StationId,
    pub lon: f32,
    pub lat: f32,
    /// 要素番号と値
    ///
    /// 値を記録していない要素は含まない。
    pub values: BTreeMap<i16, f64>,
}

/// 地点データ
///
/// すべての列は局数と同じ長さを持ち、同じ位置は同じ局を示す。
#[derive(Debug, Clone, PartialEq)]
pub struct StationTable {
    header: StationHeader,
    ids: StationIds,
    lon: Vec<f32>,
    lat: Vec<f32>,
    columns: BTreeMap<i16, VariableColumn>,
}

impl StationTable {
    pub fn header(&self) -> &StationHeader {
        &self.header
    }

    /// 局数を返す。
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    pub fn ids(&self) -> &StationIds {
        &self.ids
    }

    pub fn lon(&self) -> &[f32] {
        &self.lon
    }

    pub fn lat(&self) -> &[f32] {
        &self.lat
    }

    /// 要素番号の列を返す。
    pub fn column(&self, var_id: i16) -> Option<&VariableColumn> {
        self.columns.get(&var_id)
    }

    /// 列を持つ要素番号を昇順で返す。
    pub fn variable_ids(&self) -> impl Iterator<Item = i16> + '_ {
        self.columns.keys().copied()
    }

    pub fn columns(&self) -> &BTreeMap<i16, VariableColumn> {
        &self.columns
    }

    /// 局IDが記録されている位置を返す。
    pub fn position_of(&self, id: &StationId) -> Option<usize> {
        self.ids.position(id)
    }

    /// 指定された局の要素の値を返す。
    ///
    /// 局が値を記録していない場合は`None`を返す。
    pub fn value(&self, id: &StationId, var_id: i16) -> Option<f64> {
        let index = self.position_of(id)?;
        let value = *self.columns.get(&var_id)?.values.get(index)?;

        (!value.is_nan()).then_some(value)
    }

    /// 指定された位置の局のデータを返す。
    pub fn row(&self, index: usize) -> Option<StationRecord> {
        let id = self.ids.get(index)?;
        let values = self
            .columns
            .iter()
            .filter_map(|(&var_id, column)| {
                let value = column.values[index];
                (!value.is_nan()).then_some((var_id, value))
            })
            .collect();

        Some(StationRecord {
            id,
            lon: self.lon[index],
            lat: self.lat[index],
            values,
        })
    }

    /// 指定された局IDのデータを返す。
    pub fn station(&self, id: &StationId) -> Option<StationRecord> {
        self.row(self.position_of(id)?)
    }
}

/// 地点データのデコーダー
#[derive(Debug, Clone, Copy)]
pub struct StationDecoder<'a> {
    catalog: &'a VariableCatalog,
    options: StationOptions,
}

impl<'a> StationDecoder<'a> {
    pub fn new(catalog: &'a VariableCatalog, options: StationOptions) -> Self {
        Self { catalog, options }
    }

    /// 地点データを読み込む。
    ///
    /// `cursor`の読み込み位置は、先頭4バイトの`mdfs`の直後であることを想定している。
    ///
    /// # 引数
    ///
    /// * `cursor` - MDFSファイルのカーソル
    ///
    /// # 戻り値
    ///
    /// 地点データ
    pub fn decode(&self, mut cursor: ByteCursor) -> MdfsResult<StationTable> {
        let header = read_station_header(&mut cursor)?;
        let text_id = match self.options.id_mode {
            IdMode::FromHeader => header.id_type == TEXT_ID_TYPE,
            IdMode::Numeric => false,
        };
        let station_num = header.station_num;
        tracing::debug!(
            description = %header.description,
            utc_time = %header.utc_time,
            station_num,
            text_id,
            "地点データのヘッダを読み込みました"
        );

        // 1局あたり最低12バイトを占めるため、残りのバイト数で局数を検証
        if cursor.remaining() / 12 < station_num {
            return Err(MdfsError::TruncatedInput {
                position: cursor.position(),
                requested: station_num.saturating_mul(12),
                remaining: cursor.remaining(),
            });
        }

        let mut ids = StationIds::with_capacity(text_id, station_num);
        let mut lon = Vec::with_capacity(station_num);
        let mut lat = Vec::with_capacity(station_num);
        let mut columns: BTreeMap<i16, VariableColumn> = header
            .declared_quantities
            .iter()
            .filter(|(key, _)| is_odd(*key))
            .map(|&(key, _)| {
                // 宣言だけの要素は要素辞書に登録されていなくてもよい
                let kind = match self.catalog.lookup(key) {
                    Ok(tag) => Some(ScalarKind::try_from(tag)?),
                    Err(MdfsError::UnknownVariable(_)) => None,
                    Err(e) => return Err(e),
                };
                Ok((key, VariableColumn::missing(kind, station_num)))
            })
            .collect::<MdfsResult<BTreeMap<_, _>>>()?;

        for index in 0..station_num {
            match &mut ids {
                StationIds::Numeric(ids) => ids.push(cursor.read_i32()?),
                StationIds::Text(ids) => {
                    let length = cursor.read_i16()?;
                    let length = usize::try_from(length).map_err(|_| {
                        MdfsError::Decode(format!(
                            "{index}番目の局IDの長さが負の値です。`{length}`"
                        ))
                    })?;
                    ids.push(cursor.read_utf8(length)?);
                }
            }
            lon.push(cursor.read_f32()?);
            lat.push(cursor.read_f32()?);

            let q_num = cursor.read_i16()?;
            for _ in 0..q_num.max(0) {
                let var_id = cursor.read_i16()?;
                let (kind, value) = self.read_value(&mut cursor, var_id)?;
                if !is_odd(var_id) {
                    // 品質管理コード
                    continue;
                }
                let column = columns.entry(var_id).or_insert_with(|| {
                    tracing::debug!(var_id, "宣言されていない要素が記録されています");
                    VariableColumn::missing(Some(kind), station_num)
                });
                column.values[index] = value;
            }
        }

        Ok(StationTable {
            header,
            ids,
            lon,
            lat,
            columns,
        })
    }

    fn read_value(&self, cursor: &mut ByteCursor, var_id: i16) -> MdfsResult<(ScalarKind, f64)> {
        let tag = if !is_odd(var_id) && !QUALITY_CODE_RANGE.contains(&var_id) {
            QUALITY_BYTE_TAG
        } else {
            self.catalog.lookup(var_id)?
        };
        let (kind, width) = resolve_type_tag(tag, self.options.long_width)?;

        Ok((kind, read_scalar(cursor, kind, width)?))
    }
}

fn is_odd(var_id: i16) -> bool {
    var_id % 2 != 0
}

fn read_scalar(cursor: &mut ByteCursor, kind: ScalarKind, width: usize) -> MdfsResult<f64> {
    let value = match kind {
        ScalarKind::Byte | ScalarKind::Char => cursor.read_u8()? as f64,
        ScalarKind::Int16 => cursor.read_i16()? as f64,
        ScalarKind::Int32 => cursor.read_i32()? as f64,
        ScalarKind::Int64 if width == 4 => cursor.read_i32()? as f64,
        ScalarKind::Int64 => cursor.read_i64()? as f64,
        ScalarKind::Float32 => cursor.read_f32()? as f64,
        ScalarKind::Float64 => cursor.read_f64()?,
    };

    Ok(value)
}

fn read_station_header(cursor: &mut ByteCursor) -> MdfsResult<StationHeader> {
    let data_type = cursor.read_i16()?;
    let description = cursor.read_text(100)?;
    let level = cursor.read_f32()?;
    let level_description = cursor.read_text(50)?;
    let year = cursor.read_i32()?;
    let month = cursor.read_i32()?;
    let day = cursor.read_i32()?;
    let hour = cursor.read_i32()?;
    let minute = cursor.read_i32()?;
    let second = cursor.read_i32()?;
    let tz = cursor.read_i32()?;
    let utc_time = read_utc_date_time(year, month, day, hour, minute, second, tz)?;
    let id_type = cursor.read_i16()?;
    cursor.skip(RESERVED_BYTES)?;
    let station_num = usize::try_from(cursor.read_i32()?).unwrap_or(0);
    let quantity_num = cursor.read_i16()?;
    let mut declared_quantities = Vec::with_capacity(quantity_num.max(0) as usize);
    for _ in 0..quantity_num.max(0) {
        let key = cursor.read_i16()?;
        let value = cursor.read_i16()?;
        declared_quantities.push((key, value));
    }

    Ok(StationHeader {
        data_type,
        description,
        level,
        level_description,
        utc_time,
        id_type,
        station_num,
        declared_quantities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> VariableCatalog {
        let mut catalog = VariableCatalog::default();
        catalog.insert(1, 3, "省份");
        catalog.insert(11, 5, "气温");
        catalog.insert(13, 4, "编号");
        catalog.insert(4, 2, "");
        catalog
    }

    fn header_bytes(id_type: i16, station_num: i32, declared: &[i16]) -> Vec<u8> {
        let mut buf = vec![];
        buf.extend_from_slice(&0i16.to_le_bytes());
        buf.extend_from_slice(&[0u8; 100]);
        buf.extend_from_slice(&0f32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 50]);
        for v in [2024, 1, 1, 8, 0, 0, 8] {
            buf.extend_from_slice(&(v as i32).to_le_bytes());
        }
        buf.extend_from_slice(&id_type.to_le_bytes());
        buf.extend_from_slice(&[0u8; 98]);
        buf.extend_from_slice(&station_num.to_le_bytes());
        buf.extend_from_slice(&(declared.len() as i16).to_le_bytes());
        for key in declared {
            buf.extend_from_slice(&key.to_le_bytes());
            buf.extend_from_slice(&0i16.to_le_bytes());
        }
        buf
    }

    fn numeric_station(buf: &mut Vec<u8>, id: i32, values: &[(i16, &[u8])]) {
        buf.extend_from_slice(&id.to_le_bytes());
        buf.extend_from_slice(&116.5f32.to_le_bytes());
        buf.extend_from_slice(&39.9f32.to_le_bytes());
        buf.extend_from_slice(&(values.len() as i16).to_le_bytes());
        for (var_id, raw) in values {
            buf.extend_from_slice(&var_id.to_le_bytes());
            buf.extend_from_slice(raw);
        }
    }

    #[test]
    fn quality_codes_are_consumed_but_not_stored() {
        let mut buf = header_bytes(0, 1, &[11]);
        numeric_station(
            &mut buf,
            54511,
            &[
                (11, &2.5f32.to_le_bytes()),
                (12, &7i16.to_le_bytes()),
                (30, &[9]),
                (1, &0i32.to_le_bytes()),
            ],
        );
        let catalog = {
            let mut c = catalog();
            c.insert(12, 2, "");
            c
        };
        let table = StationDecoder::new(&catalog, StationOptions::default())
            .decode(ByteCursor::new(buf))
            .unwrap();

        assert_eq!(table.variable_ids().collect::<Vec<_>>(), vec![1, 11]);
        assert_eq!(table.column(11).unwrap().values, vec![2.5]);
        // 0も有効な値として格納する
        assert_eq!(table.column(1).unwrap().values, vec![0.0]);
        assert!(table.column(12).is_none());
        assert!(table.column(30).is_none());
    }

    #[test]
    fn long_values_follow_configured_width() {
        let mut buf = header_bytes(0, 1, &[13]);
        numeric_station(&mut buf, 1, &[(13, &42i32.to_le_bytes())]);
        let options = StationOptions {
            long_width: LongWidth::Four,
            ..Default::default()
        };
        let table = StationDecoder::new(&catalog(), options)
            .decode(ByteCursor::new(buf))
            .unwrap();
        assert_eq!(table.column(13).unwrap().values, vec![42.0]);
        assert_eq!(table.column(13).unwrap().kind, Some(ScalarKind::Int64));

        let mut buf = header_bytes(0, 1, &[13]);
        numeric_station(&mut buf, 1, &[(13, &(-7i64).to_le_bytes())]);
        let table = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf))
            .unwrap();
        assert_eq!(table.column(13).unwrap().values, vec![-7.0]);
    }

    #[test]
    fn numeric_id_mode_ignores_header_id_type() {
        let mut buf = header_bytes(1, 1, &[]);
        numeric_station(&mut buf, 58367, &[]);
        let options = StationOptions {
            id_mode: IdMode::Numeric,
            ..Default::default()
        };
        let table = StationDecoder::new(&catalog(), options)
            .decode(ByteCursor::new(buf))
            .unwrap();

        assert_eq!(table.ids(), &StationIds::Numeric(vec![58367]));
    }

    #[test]
    fn undeclared_odd_variable_gets_a_padded_column() {
        let mut buf = header_bytes(0, 2, &[]);
        numeric_station(&mut buf, 1, &[]);
        numeric_station(&mut buf, 2, &[(11, &1.0f32.to_le_bytes())]);
        let table = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf))
            .unwrap();

        let column = table.column(11).unwrap();
        assert!(column.values[0].is_nan());
        assert_eq!(column.values[1], 1.0);
        assert_eq!(column.missing_count(), 1);
    }

    #[test]
    fn unknown_variable_aborts_decode() {
        let mut buf = header_bytes(0, 1, &[]);
        numeric_station(&mut buf, 1, &[(99, &0f32.to_le_bytes())]);
        let result = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf));

        assert_eq!(result, Err(MdfsError::UnknownVariable(99)));
    }

    #[test]
    fn declared_variable_with_unknown_type_tag_aborts_decode() {
        let mut catalog = catalog();
        catalog.insert(15, 9, "");
        let mut buf = header_bytes(0, 1, &[15]);
        numeric_station(&mut buf, 1, &[]);
        let result =
            StationDecoder::new(&catalog, StationOptions::default()).decode(ByteCursor::new(buf));

        assert_eq!(result, Err(MdfsError::UnknownTypeTag(9)));
    }

    #[test]
    fn declared_variable_missing_from_catalog_has_no_kind() {
        let mut buf = header_bytes(0, 1, &[21]);
        numeric_station(&mut buf, 1, &[]);
        let table = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf))
            .unwrap();

        let column = table.column(21).unwrap();
        assert_eq!(column.kind, None);
        assert_eq!(column.missing_count(), 1);
    }

    #[test]
    fn unknown_type_tag_aborts_decode() {
        let mut catalog = catalog();
        catalog.insert(15, 9, "");
        let mut buf = header_bytes(0, 1, &[]);
        numeric_station(&mut buf, 1, &[(15, &[0])]);
        let result =
            StationDecoder::new(&catalog, StationOptions::default()).decode(ByteCursor::new(buf));

        assert_eq!(result, Err(MdfsError::UnknownTypeTag(9)));
    }

    #[test]
    fn station_count_larger_than_input_is_truncated() {
        let buf = header_bytes(0, 1_000_000, &[]);
        let result = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf));

        assert!(matches!(result, Err(MdfsError::TruncatedInput { .. })));
    }

    #[test]
    fn header_time_is_converted_to_utc() {
        let buf = header_bytes(0, 0, &[]);
        let table = StationDecoder::new(&catalog(), StationOptions::default())
            .decode(ByteCursor::new(buf))
            .unwrap();

        assert_eq!(
            table.header().utc_time,
            time::macros::datetime!(2024-01-01 00:00)
        );
        assert!(table.is_empty());
    }
}
