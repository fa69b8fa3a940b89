//! テスト用のMDFSファイルを組み立てるヘルパー

#![allow(dead_code)]

use mdfs::VariableCatalog;

/// 記録する要素の値
pub enum Value {
    Byte(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    fn write(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Byte(v) => buf.push(*v),
            Self::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
            Self::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// 局ID
pub enum Id {
    Numeric(i32),
    Text(&'static str),
    /// 長さとバイト列をそのまま書き込む
    Raw(i16, &'static [u8]),
}

/// 1局分のレコード
pub struct Station {
    pub id: Id,
    pub lon: f32,
    pub lat: f32,
    pub values: Vec<(i16, Value)>,
}

/// 固定長の文字列を書き込む。
pub fn put_text(buf: &mut Vec<u8>, bytes: &[u8], width: usize) {
    assert!(bytes.len() <= width);
    buf.extend_from_slice(bytes);
    buf.resize(buf.len() + width - bytes.len(), 0);
}

fn put_i32s(buf: &mut Vec<u8>, values: &[i32]) {
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

/// 地点データのMDFSファイルを組み立てる。
pub struct StationFile {
    pub description: Vec<u8>,
    pub level: f32,
    pub time: [i32; 7],
    pub id_type: i16,
    pub declared: Vec<i16>,
    pub stations: Vec<Station>,
}

impl Default for StationFile {
    fn default() -> Self {
        Self {
            // "地面填图" in GBK
            description: vec![0xb5, 0xd8, 0xc3, 0xe6, 0xcc, 0xee, 0xcd, 0xbc],
            level: 1000.0,
            time: [2024, 7, 1, 8, 0, 0, 8],
            id_type: 0,
            declared: vec![],
            stations: vec![],
        }
    }
}

impl StationFile {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = b"mdfs".to_vec();
        buf.extend_from_slice(&1i16.to_le_bytes());
        put_text(&mut buf, &self.description, 100);
        buf.extend_from_slice(&self.level.to_le_bytes());
        put_text(&mut buf, b"surface", 50);
        put_i32s(&mut buf, &self.time);
        buf.extend_from_slice(&self.id_type.to_le_bytes());
        buf.extend_from_slice(&[0u8; 98]);
        buf.extend_from_slice(&(self.stations.len() as i32).to_le_bytes());
        buf.extend_from_slice(&(self.declared.len() as i16).to_le_bytes());
        for key in &self.declared {
            buf.extend_from_slice(&key.to_le_bytes());
            buf.extend_from_slice(&0i16.to_le_bytes());
        }
        for station in &self.stations {
            match station.id {
                Id::Numeric(id) => buf.extend_from_slice(&id.to_le_bytes()),
                Id::Text(id) => {
                    buf.extend_from_slice(&(id.len() as i16).to_le_bytes());
                    buf.extend_from_slice(id.as_bytes());
                }
                Id::Raw(length, bytes) => {
                    buf.extend_from_slice(&length.to_le_bytes());
                    buf.extend_from_slice(bytes);
                }
            }
            buf.extend_from_slice(&station.lon.to_le_bytes());
            buf.extend_from_slice(&station.lat.to_le_bytes());
            buf.extend_from_slice(&(station.values.len() as i16).to_le_bytes());
            for (var_id, value) in &station.values {
                buf.extend_from_slice(&var_id.to_le_bytes());
                value.write(&mut buf);
            }
        }
        buf
    }
}

/// 軸の定義（開始値、終了値、間隔、格子数）
pub type Axis = (f32, f32, f32, i32);

/// 格子データのMDFSファイルを組み立てる。
pub struct GridFile {
    pub data_type: i16,
    pub time: [i32; 5],
    pub period: i32,
    pub lon: Axis,
    pub lat: Axis,
    pub values: Vec<f32>,
}

impl Default for GridFile {
    fn default() -> Self {
        Self {
            data_type: 4,
            time: [2024, 7, 1, 20, 8],
            period: 24,
            lon: (100.0, 101.0, 1.0, 2),
            lat: (30.0, 31.0, 1.0, 2),
            values: vec![1.0, 2.0, 3.0, 4.0],
        }
    }
}

impl GridFile {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = b"mdfs".to_vec();
        buf.extend_from_slice(&self.data_type.to_le_bytes());
        put_text(&mut buf, b"ECMWF", 20);
        // "温度" in GBK
        put_text(&mut buf, &[0xce, 0xc2, 0xb6, 0xc8], 50);
        put_text(&mut buf, b"850hPa", 30);
        buf.extend_from_slice(&850f32.to_le_bytes());
        put_i32s(&mut buf, &self.time);
        buf.extend_from_slice(&self.period.to_le_bytes());
        for (start, end, spacing, number) in [self.lon, self.lat] {
            buf.extend_from_slice(&start.to_le_bytes());
            buf.extend_from_slice(&end.to_le_bytes());
            buf.extend_from_slice(&spacing.to_le_bytes());
            buf.extend_from_slice(&number.to_le_bytes());
        }
        for v in [0f32, 40.0, 4.0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&[0u8; 100]);
        for v in &self.values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }
}

/// テスト用の要素辞書
pub fn catalog() -> VariableCatalog {
    let mut catalog = VariableCatalog::default();
    catalog.insert(1, 3, "省份");
    catalog.insert(11, 5, "气温");
    catalog.insert(13, 2, "风向");
    catalog.insert(15, 6, "降水");
    catalog.insert(17, 4, "编号");
    catalog.insert(19, 7, "天气");
    catalog.insert(2, 1, "");
    catalog.insert(12, 1, "");
    catalog
}
