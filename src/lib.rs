//! MDFS形式の気象データを読み込むクレート
//!
//! MDFSファイルには、地点データ（観測局ごとの要素の一覧）と格子データ
//! （緯度経度格子上のスカラー値またはベクトル値）の2種類がある。
//! ファイル自体はどちらの種類かを示さないため、呼び出し側が読み込み方法を選択する。
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mdfs::{MdfsReader, VariableCatalog};
//!
//! # fn main() -> Result<(), mdfs::MdfsError> {
//! let catalog = Arc::new(VariableCatalog::from_path("variables.json")?);
//! let reader = MdfsReader::new(catalog);
//! let table = reader.read_station("surface/plot/20240101080000.000")?;
//! let grid = reader.read_grid("ecmwf/t/850/24010108.024")?;
//! println!("{} {:?}", table.len(), grid.shape());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cursor;
pub mod error;
pub mod grid;
pub mod readers;
pub mod station;

pub use catalog::{resolve_type_tag, LongWidth, ScalarKind, VariableCatalog, VariableEntry};
pub use cursor::ByteCursor;
pub use error::{MdfsError, MdfsResult};
pub use grid::{GridData, GridDecoder, GridField, GridHeader};
pub use readers::{open_bytes, open_path, open_reader, MdfsData, MdfsReader, PayloadKind};
pub use station::{
    IdMode, StationDecoder, StationHeader, StationId, StationIds, StationOptions, StationRecord,
    StationTable, VariableColumn,
};
