use encoding_rs::GBK;

use crate::error::{MdfsError, MdfsResult};

/// メモリ上のバイト列を先頭から順に読み込むカーソル
///
/// 数値はすべてリトルエンディアンで記録されているものとして読み込む。
/// 読み込み位置は前方にのみ移動する。
#[derive(Debug, Clone)]
pub struct ByteCursor {
    /// 読み込み対象のバイト列
    buf: Vec<u8>,
    /// 現在の読み込み位置
    position: usize,
}

macro_rules! read_number {
    ($(#[$attr:meta])* $func_name:ident, $type:ty) => {
        $(#[$attr])*
        pub fn $func_name(&mut self) -> MdfsResult<$type> {
            const BYTES: usize = std::mem::size_of::<$type>();
            let mut buf = [0u8; BYTES];
            buf.copy_from_slice(self.read_fixed(BYTES)?);

            Ok(<$type>::from_le_bytes(buf))
        }
    };
}

impl ByteCursor {
    /// バイト列の先頭を読み込み位置とするカーソルを構築する。
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, position: 0 }
    }

    /// 現在の読み込み位置を返す。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 読み込まれていないバイト数を返す。
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.position
    }

    /// 指定されたバイト数を読み込む。
    ///
    /// # 引数
    ///
    /// * `bytes` - 読み込むバイト数
    ///
    /// # 戻り値
    ///
    /// 読み込んだバイト列
    pub fn read_fixed(&mut self, bytes: usize) -> MdfsResult<&[u8]> {
        let start = self.ensure(bytes)?;
        self.position += bytes;

        Ok(&self.buf[start..start + bytes])
    }

    read_number!(
        /// 符号なし8ビット整数を読み込む。
        read_u8,
        u8
    );
    read_number!(
        /// 符号付き16ビット整数を読み込む。
        read_i16,
        i16
    );
    read_number!(
        /// 符号付き32ビット整数を読み込む。
        read_i32,
        i32
    );
    read_number!(
        /// 符号付き64ビット整数を読み込む。
        read_i64,
        i64
    );
    read_number!(
        /// 32ビット浮動小数点数を読み込む。
        read_f32,
        f32
    );
    read_number!(
        /// 64ビット浮動小数点数を読み込む。
        read_f64,
        f64
    );

    /// GBKで符号化された固定長の文字列を読み込む。
    ///
    /// 末尾を埋めているNULは取り除く。
    ///
    /// # 引数
    ///
    /// * `bytes` - 読み込むバイト数
    ///
    /// # 戻り値
    ///
    /// 読み込んだ文字列
    pub fn read_text(&mut self, bytes: usize) -> MdfsResult<String> {
        let position = self.position;
        let raw = self.read_fixed(bytes)?;
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let s = GBK
            .decode_without_bom_handling_and_without_replacement(&raw[..end])
            .ok_or_else(|| {
                MdfsError::Decode(format!(
                    "{position}バイト目から始まる{bytes}バイトの文字列がGBKで復号できません。"
                ))
            })?;

        Ok(s.into_owned())
    }

    /// UTF-8で符号化された文字列を読み込む。
    pub fn read_utf8(&mut self, bytes: usize) -> MdfsResult<String> {
        let position = self.position;
        let raw = self.read_fixed(bytes)?.to_vec();

        String::from_utf8(raw).map_err(|e| {
            MdfsError::Decode(format!(
                "{position}バイト目から始まる文字列がUTF-8で復号できません。{e}"
            ))
        })
    }

    /// 予備領域などを読み飛ばす。
    pub fn skip(&mut self, bytes: usize) -> MdfsResult<()> {
        self.ensure(bytes)?;
        self.position += bytes;

        Ok(())
    }

    fn ensure(&self, bytes: usize) -> MdfsResult<usize> {
        if self.remaining() < bytes {
            return Err(MdfsError::TruncatedInput {
                position: self.position,
                requested: bytes,
                remaining: self.remaining(),
            });
        }

        Ok(self.position)
    }
}
