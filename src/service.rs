//! Conversion Service
//!
//! 入力パスのスプレッドシートを読み込み、変換結果を出力パスに書き出すサービス。
//! 出力は同じディレクトリの一時ファイルに書き込んでから置き換えるため、
//! 失敗時に出力パスへ中途半端なファイルが残ることはありません。

use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::builder::Converter;
use crate::error::{ConversionError, XlsxToPdfError};

/// 文書変換の差し替え点
///
/// `ConversionService`はこのトレイトを通して変換処理を呼び出します。
/// 既定の実装は`Converter`です。
pub trait DocumentConverter: Send + Sync {
    /// `source`（入力ファイルの内容）を変換し、`output`に書き出す
    fn render(&self, source: &[u8], output: &mut dyn Write) -> Result<(), XlsxToPdfError>;
}

impl DocumentConverter for Converter {
    fn render(&self, source: &[u8], output: &mut dyn Write) -> Result<(), XlsxToPdfError> {
        self.convert(Cursor::new(source), output).map(|_| ())
    }
}

/// 変換サービス
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::ConversionService;
///
/// let service = ConversionService::default();
/// match service.convert("example.xlsx", "converted.pdf") {
///     Ok(path) => println!("written to {}", path.display()),
///     Err(e) if e.is_precondition() => eprintln!("missing input: {}", e),
///     Err(e) => eprintln!("conversion failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct ConversionService<C = Converter> {
    converter: C,
}

impl Default for ConversionService<Converter> {
    fn default() -> Self {
        Self::new(Converter::default())
    }
}

impl<C: DocumentConverter> ConversionService<C> {
    /// 変換器を指定してサービスを生成
    pub fn new(converter: C) -> Self {
        Self { converter }
    }

    /// `source`を変換して`target`に書き出す
    ///
    /// # 戻り値
    ///
    /// * `Ok(PathBuf)` - 書き出したファイルのパス（`target`）
    /// * `Err(ConversionError::PreconditionFailed)` - `source`が存在しない（何も書き込まない）
    /// * `Err(ConversionError::ConversionFailed)` - 読み込み・変換・書き込みに失敗した
    pub fn convert(
        &self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<PathBuf, ConversionError> {
        let (source, target) = (source.as_ref(), target.as_ref());

        if !source.exists() {
            error!(source = %source.display(), "source file not found");
            return Err(ConversionError::PreconditionFailed {
                path: source.to_path_buf(),
            });
        }

        match self.convert_existing(source, target) {
            Ok(bytes) => {
                info!(
                    source = %source.display(),
                    target = %target.display(),
                    bytes,
                    "converted spreadsheet"
                );
                Ok(target.to_path_buf())
            }
            Err(e) => {
                error!(
                    source = %source.display(),
                    target = %target.display(),
                    error = %e,
                    "conversion failed"
                );
                Err(e)
            }
        }
    }

    /// 変換本体（出力したバイト数を返す）
    fn convert_existing(&self, source: &Path, target: &Path) -> Result<u64, ConversionError> {
        let input = fs::read(source)?;

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            self.converter.render(&input, &mut writer)?;
            writer.flush()?;
        }

        let bytes = temp.as_file().metadata()?.len();
        temp.persist(target).map_err(|e| ConversionError::from(e.error))?;

        Ok(bytes)
    }
}
