//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// セル結合の処理戦略
///
/// Excelの結合セルをPDFの表に描画する際の処理方法を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MergeStrategy {
    /// 結合範囲を1つの枠として描画（デフォルト）
    ///
    /// 親セル（左上）の値を結合範囲全体の枠の中に1回だけ描画します。
    /// 範囲内の他のセルの罫線は描画しません。
    Span,

    /// 結合セル範囲内のすべてのセルに親セルの値を複製
    ///
    /// 結合範囲（例: A1:C1）の各セルを通常のセルとして描画し、
    /// 親セル（A1）の値を範囲内のすべてのセルに複製します。
    DataDuplication,
}

/// 日付の出力形式
///
/// Excelの日付セルを文字列に変換する際の出力形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// ISO 8601形式（YYYY-MM-DD、時刻を含む場合は YYYY-MM-DD HH:MM:SS）
    ///
    /// 例: `2025-11-20`
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
    /// let converter = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d/%m/%Y".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}

/// 数式セルの出力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormulaMode {
    /// キャッシュされた結果値を出力（デフォルト）
    ///
    /// 例: `=SUM(A1:A10)` → `100`
    CachedValue,

    /// 数式文字列を出力
    ///
    /// 例: `=SUM(A1:A10)` → `=SUM(A1:A10)`
    Formula,
}

/// シート選択方式
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SheetSelector {
    /// すべてのシートを変換（デフォルト）
    All,

    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    Name(String),

    /// 複数のインデックス指定
    Indices(Vec<usize>),

    /// 複数のシート名指定
    Names(Vec<String>),
}

/// 用紙サイズ
///
/// 寸法はポートレート時の (幅, 高さ) をポイント（1/72インチ）で表します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PageSize {
    /// 210 × 297 mm（デフォルト）
    A4,
    /// 297 × 420 mm
    A3,
    /// 8.5 × 11 inch
    Letter,
    /// 8.5 × 14 inch
    Legal,
}

impl PageSize {
    /// ポートレート時の (幅, 高さ) をポイントで返す
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::A3 => (842.0, 1191.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }

    /// 名前（大文字小文字を区別しない）から用紙サイズを解決する
    ///
    /// ```rust
    /// use xlsxpdf::PageSize;
    ///
    /// assert_eq!(PageSize::from_name("letter"), Some(PageSize::Letter));
    /// assert_eq!(PageSize::from_name("B5"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "a3" => Some(PageSize::A3),
            "letter" => Some(PageSize::Letter),
            "legal" => Some(PageSize::Legal),
            _ => None,
        }
    }
}

/// 用紙の向き
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Orientation {
    /// 縦向き（デフォルト）
    Portrait,
    /// 横向き
    Landscape,
}
