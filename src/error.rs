/// MDFSエラー型
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MdfsError {
    /// 予期しない例外
    #[error("{0}")]
    Unexpected(String),

    /// ファイル・オープン・エラー
    #[error("ファイルを開くときにエラーが発生しました。{0}")]
    Open(String),

    /// 圧縮されたファイルの展開に失敗
    #[error("圧縮されたファイルの展開に失敗しました。{0}")]
    Decompress(String),

    /// 先頭4バイトが`mdfs`ではない
    #[error("MDFSファイルではありません。先頭4バイトが`{0:?}`でした。")]
    InvalidMagic(Vec<u8>),

    /// 読み込むバイトが不足している
    #[error(
        "{position}バイト目から{requested}バイトを読み込めません。残りは{remaining}バイトです。"
    )]
    TruncatedInput {
        /// 読み込みを開始した位置
        position: usize,
        /// 読み込もうとしたバイト数
        requested: usize,
        /// 残りのバイト数
        remaining: usize,
    },

    /// 要素辞書に登録されていない要素番号
    #[error("要素辞書に登録されていない要素番号です。`{0}`")]
    UnknownVariable(i16),

    /// サポートしていない型タグ
    #[error("サポートしていない型タグです。`{0}`")]
    UnknownTypeTag(i32),

    /// 文字列の復号に失敗
    #[error("文字列を復号できませんでした。{0}")]
    Decode(String),

    /// 格子の数が不正
    #[error("格子の数が不正です。経度方向: {lon_number}、緯度方向: {lat_number}")]
    InvalidGeometry {
        /// 経度方向の格子数
        lon_number: i32,
        /// 緯度方向の格子数
        lat_number: i32,
    },

    /// ヘッダに記録されている日時が不正
    #[error("ヘッダに記録されている日時が不正です。{0}")]
    InvalidDateTime(String),

    /// 要素辞書ファイルの形式が不正
    #[error("要素辞書を読み込めませんでした。{0}")]
    Catalog(String),
}

/// MDFS結果型
pub type MdfsResult<T> = Result<T, MdfsError>;
