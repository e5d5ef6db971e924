//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;

use thiserror::Error;

/// 変換ライブラリ（`Converter`）で使用するエラー型
///
/// Excelファイルの読み込み、解析、PDFレンダリング中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::XlsxToPdfError;
/// use std::fs::File;
///
/// fn read_excel_file(path: &str) -> Result<(), XlsxToPdfError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum XlsxToPdfError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの解析中に発生したエラー（calamine由来）
    ///
    /// ファイル形式が不正、破損したファイル、サポートされていない形式などが
    /// 原因となります。
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// UTF-8文字列の変換エラー
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// 数値の解析エラー
    #[error("Number parse error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConverterBuilder::build()`時に無効な設定が検出された場合や、
    /// 選択されたシートが存在しない場合に発生します。
    ///
    /// # 例
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, XlsxToPdfError};
    ///
    /// let result = ConverterBuilder::new()
    ///     .with_range((10, 0), (0, 0))  // 無効な範囲
    ///     .build();
    ///
    /// match result {
    ///     Err(XlsxToPdfError::Config(msg)) => {
    ///         println!("設定エラー: {}", msg);
    ///     }
    ///     _ => {}
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDFオブジェクトの生成・書き出し中に発生したエラー（lopdf由来）
    #[error("PDF rendering error: {0}")]
    Pdf(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

/// `ConversionService`の失敗結果
///
/// 前提条件違反（入力ファイルが存在しない）と、変換処理そのものの失敗を区別します。
/// 前提条件違反の場合は何も書き込まれません。
#[derive(Error, Debug)]
pub enum ConversionError {
    /// 入力ファイルが存在しない
    #[error("source file not found: {}", path.display())]
    PreconditionFailed {
        /// 見つからなかった入力パス
        path: PathBuf,
    },

    /// 読み込み・レンダリング・書き込みのいずれかに失敗した
    #[error("{reason}")]
    ConversionFailed {
        /// 下位エラーのメッセージ
        reason: String,
    },
}

impl ConversionError {
    /// 前提条件違反かどうか
    pub fn is_precondition(&self) -> bool {
        matches!(self, ConversionError::PreconditionFailed { .. })
    }
}

impl From<XlsxToPdfError> for ConversionError {
    fn from(e: XlsxToPdfError) -> Self {
        ConversionError::ConversionFailed {
            reason: e.to_string(),
        }
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(e: std::io::Error) -> Self {
        XlsxToPdfError::Io(e).into()
    }
}
