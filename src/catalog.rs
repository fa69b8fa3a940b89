use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::{MdfsError, MdfsResult};

/// 要素の値の型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 1バイト
    Byte,
    /// 16ビット整数
    Int16,
    /// 32ビット整数
    Int32,
    /// 64ビット整数
    ///
    /// 旧形式のファイルでは32ビットで記録されている。`LongWidth`を参照。
    Int64,
    /// 32ビット浮動小数点数
    Float32,
    /// 64ビット浮動小数点数
    Float64,
    /// 1文字
    Char,
}

/// 型タグ4（64ビット整数）のバイト数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongWidth {
    /// 8バイト
    #[default]
    Eight,

    /// 4バイト
    ///
    /// 旧形式の解釈であり、非推奨。
    Four,
}

/// 型タグから要素の値の型に変換する。
impl TryFrom<i32> for ScalarKind {
    type Error = MdfsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            4 => Ok(Self::Int64),
            5 => Ok(Self::Float32),
            6 => Ok(Self::Float64),
            7 => Ok(Self::Char),
            _ => Err(MdfsError::UnknownTypeTag(value)),
        }
    }
}

impl ScalarKind {
    /// ファイルに記録されている値のバイト数を返す。
    pub fn width(self, long_width: LongWidth) -> usize {
        match self {
            Self::Byte | Self::Char => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 => match long_width {
                LongWidth::Eight => 8,
                LongWidth::Four => 4,
            },
            Self::Float64 => 8,
        }
    }
}

/// 型タグを要素の値の型とバイト数に変換する。
///
/// # 引数
///
/// * `tag` - 型タグ（1から7）
/// * `long_width` - 型タグ4のバイト数
///
/// # 戻り値
///
/// 要素の値の型とバイト数
pub fn resolve_type_tag(tag: i32, long_width: LongWidth) -> MdfsResult<(ScalarKind, usize)> {
    let kind = ScalarKind::try_from(tag)?;

    Ok((kind, kind.width(long_width)))
}

/// 要素辞書の1項目
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VariableEntry {
    /// 要素番号
    pub id: i16,

    /// 型タグ
    #[serde(rename = "type")]
    pub type_tag: i32,

    /// 要素名
    #[serde(default)]
    pub name: String,
}

/// 要素番号から型タグと要素名を引く要素辞書
///
/// 一度構築したら変更せず、複数の読み込みで共有する。
#[derive(Debug, Clone, Default)]
pub struct VariableCatalog {
    entries: HashMap<i16, VariableEntry>,
}

impl VariableCatalog {
    /// 項目から要素辞書を構築する。
    ///
    /// 同じ要素番号の項目が複数ある場合は、後の項目が優先される。
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = VariableEntry>,
    {
        Self {
            entries: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    /// JSON形式の要素辞書を読み込む。
    ///
    /// ```json
    /// [{"id": 601, "type": 5, "name": "温度"}]
    /// ```
    pub fn from_reader<R>(reader: R) -> MdfsResult<Self>
    where
        R: Read,
    {
        let entries: Vec<VariableEntry> = serde_json::from_reader(reader)
            .map_err(|e| MdfsError::Catalog(format!("JSONの解析に失敗しました。{e}")))?;

        Ok(Self::from_entries(entries))
    }

    /// JSON形式の要素辞書ファイルを読み込む。
    pub fn from_path<P>(path: P) -> MdfsResult<Self>
    where
        P: AsRef<Path>,
    {
        let file = OpenOptions::new()
            .read(true)
            .open(path.as_ref())
            .map_err(|e| MdfsError::Open(format!("{e}")))?;
        let catalog = Self::from_reader(BufReader::new(file))?;
        tracing::debug!(
            path = %path.as_ref().display(),
            variables = catalog.len(),
            "要素辞書を読み込みました"
        );

        Ok(catalog)
    }

    /// 項目を追加する。
    pub fn insert(&mut self, id: i16, type_tag: i32, name: impl Into<String>) {
        self.entries.insert(
            id,
            VariableEntry {
                id,
                type_tag,
                name: name.into(),
            },
        );
    }

    /// 要素番号の型タグを返す。
    pub fn lookup(&self, id: i16) -> MdfsResult<i32> {
        self.entries
            .get(&id)
            .map(|e| e.type_tag)
            .ok_or(MdfsError::UnknownVariable(id))
    }

    /// 要素番号の要素名を返す。
    pub fn name(&self, id: i16) -> Option<&str> {
        self.entries.get(&id).map(|e| e.name.as_str())
    }

    /// 登録されている要素の数を返す。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
