//! Builder Module
//!
//! Fluent Builder APIを提供し、`Converter`インスタンスを段階的に構築する。

use std::io::{BufWriter, Read, Seek, Write};

use chrono::format::{Item, StrftimeItems};
use rayon::prelude::*;
use tracing::debug;

use crate::api::{DateFormat, FormulaMode, MergeStrategy, Orientation, PageSize, SheetSelector};
use crate::error::XlsxToPdfError;
use crate::formatter::CellFormatter;
use crate::grid::{LogicalGrid, MIN_COLUMN_WIDTH};
use crate::parser::WorkbookParser;
use crate::render::{PageContent, PageLayout, PdfRenderer};
use crate::security::SecurityConfig;
use crate::types::{CellCoord, CellRange};

/// フォントサイズの下限（ポイント）
const MIN_FONT_SIZE: u32 = 4;

/// フォントサイズの上限（ポイント）
const MAX_FONT_SIZE: u32 = 32;

/// 変換処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConversionConfig {
    /// シート選択方式
    pub sheet_selector: SheetSelector,

    /// セル結合戦略
    pub merge_strategy: MergeStrategy,

    /// 日付形式
    pub date_format: DateFormat,

    /// 数式出力モード
    pub formula_mode: FormulaMode,

    /// 非表示要素を含めるか
    pub include_hidden: bool,

    /// セル範囲制限（Option: Noneの場合は全範囲）
    pub range: Option<CellRange>,

    /// 用紙サイズ
    pub page_size: PageSize,

    /// 用紙の向き
    pub orientation: Orientation,

    /// フォントサイズ（ポイント）
    pub font_size: u32,

    /// 余白（ポイント）
    pub margin: u32,

    /// 2ページ目以降に1行目を繰り返すか
    pub repeat_header: bool,

    /// 列幅の上限（表示幅）
    pub max_column_chars: usize,

    /// コンテンツストリームを圧縮するか
    pub compression: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            sheet_selector: SheetSelector::All,
            merge_strategy: MergeStrategy::Span,
            date_format: DateFormat::Iso8601,
            formula_mode: FormulaMode::CachedValue,
            include_hidden: false,
            range: None,
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            font_size: 9,
            margin: 36,
            repeat_header: true,
            max_column_chars: 40,
            compression: true,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Converter`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::{ConverterBuilder, Orientation, PageSize, SheetSelector};
///
/// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
/// let converter = ConverterBuilder::new()
///     .with_sheet_selector(SheetSelector::Index(0))
///     .with_page_size(PageSize::Letter)
///     .with_orientation(Orientation::Landscape)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConverterBuilder {
    /// 内部設定（構築中）
    config: ConversionConfig,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - シート選択: すべてのシート（非表示シートを除く）
    /// - セル結合戦略: 1つの枠として描画（`Span`）
    /// - 日付形式: ISO 8601 (YYYY-MM-DD)
    /// - 数式モード: キャッシュ値を出力
    /// - 用紙: A4縦、余白36pt、フォント9pt
    /// - 見出し行の繰り返し: あり
    /// - 列幅の上限: 40文字
    /// - 圧縮: あり
    pub fn new() -> Self {
        Self {
            config: ConversionConfig::default(),
        }
    }

    /// 変換対象のシートを選択する
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, SheetSelector};
    ///
    /// // 単一シートを名前で指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Name("Sheet1".to_string()));
    ///
    /// // 複数シートを指定
    /// let builder = ConverterBuilder::new()
    ///     .with_sheet_selector(SheetSelector::Indices(vec![0, 2]));
    /// ```
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.config.sheet_selector = selector;
        self
    }

    /// セル結合の処理戦略を指定する
    pub fn with_merge_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.config.merge_strategy = strategy;
        self
    }

    /// 日付の出力形式を指定する
    ///
    /// ```rust,no_run
    /// use xlsxpdf::{ConverterBuilder, DateFormat};
    ///
    /// let builder = ConverterBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d/%m/%Y".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 数式セルの出力モードを指定する
    pub fn with_formula_mode(mut self, mode: FormulaMode) -> Self {
        self.config.formula_mode = mode;
        self
    }

    /// 非表示要素（非表示シート、行、列）を出力に含めるかを指定する
    ///
    /// * `true`: 非表示要素を含める
    /// * `false`: 非表示要素をスキップ（デフォルト）
    ///
    /// 非表示行・列はXLSX形式の入力でのみ判定できます。
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.include_hidden = include;
        self
    }

    /// 処理対象のセル範囲を制限する
    ///
    /// `start` / `end` は (row, col) の0始まり座標で、両端を含みます。
    /// `start.0 <= end.0` かつ `start.1 <= end.1` でなければ、`build()`時に
    /// `XlsxToPdfError::Config`を返します。
    ///
    /// ```rust,no_run
    /// use xlsxpdf::ConverterBuilder;
    ///
    /// // A1:C10
    /// let builder = ConverterBuilder::new()
    ///     .with_range((0, 0), (9, 2));
    /// ```
    pub fn with_range(mut self, start: (u32, u32), end: (u32, u32)) -> Self {
        self.config.range = Some(CellRange::new(
            CellCoord::new(start.0, start.1),
            CellCoord::new(end.0, end.1),
        ));
        self
    }

    /// 用紙サイズを指定する
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// 用紙の向きを指定する
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    /// フォントサイズ（ポイント、4〜32）を指定する
    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.config.font_size = font_size;
        self
    }

    /// 上下左右の余白（ポイント）を指定する
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.config.margin = margin;
        self
    }

    /// 2ページ目以降の先頭に1行目を繰り返すかを指定する
    pub fn repeat_header_row(mut self, repeat: bool) -> Self {
        self.config.repeat_header = repeat;
        self
    }

    /// 列幅の上限（表示幅）を指定する
    ///
    /// 上限を超える内容は`...`で切り詰められます。
    pub fn with_max_column_chars(mut self, max_chars: usize) -> Self {
        self.config.max_column_chars = max_chars;
        self
    }

    /// コンテンツストリームを圧縮するかを指定する
    pub fn with_compression(mut self, compression: bool) -> Self {
        self.config.compression = compression;
        self
    }

    /// 設定を検証し、`Converter`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxToPdfError::Config(String)`: 設定の検証に失敗した場合
    ///   * 範囲指定の開始座標が終了座標より大きい
    ///   * カスタム日付形式が不正な書式文字列
    ///   * フォントサイズが範囲外
    ///   * 余白が大きすぎて1行・1列も描画できない
    ///   * 列幅の上限が3未満
    ///
    /// ```rust,no_run
    /// use xlsxpdf::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
    /// let converter = ConverterBuilder::new().with_font_size(10).build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Converter, XlsxToPdfError> {
        // 1. セル範囲の検証
        if let Some(range) = &self.config.range {
            if range.start.row > range.end.row {
                return Err(XlsxToPdfError::Config(format!(
                    "Invalid range: start row ({}) > end row ({})",
                    range.start.row, range.end.row
                )));
            }

            if range.start.col > range.end.col {
                return Err(XlsxToPdfError::Config(format!(
                    "Invalid range: start col ({}) > end col ({})",
                    range.start.col, range.end.col
                )));
            }
        }

        // 2. カスタム日付形式の検証
        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            let has_error = StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error));
            if has_error || format_str.is_empty() {
                return Err(XlsxToPdfError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        // 3. ページ設定の検証
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.config.font_size) {
            return Err(XlsxToPdfError::Config(format!(
                "Font size {} is out of range ({}..={})",
                self.config.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE
            )));
        }

        if self.config.max_column_chars < MIN_COLUMN_WIDTH {
            return Err(XlsxToPdfError::Config(format!(
                "Max column chars must be at least {} (got {})",
                MIN_COLUMN_WIDTH, self.config.max_column_chars
            )));
        }

        PageLayout::new(
            self.config.page_size,
            self.config.orientation,
            self.config.margin,
            self.config.font_size,
        )
        .validate()?;

        // 4. Converterインスタンス生成
        Ok(Converter::new(self.config))
    }
}

/// 変換処理のファサード
///
/// スプレッドシートをPDFに変換するためのメインエントリーポイントです。
/// `ConverterBuilder`を使用して構築された設定に基づいて変換処理を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::ConverterBuilder;
/// use std::fs::File;
///
/// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
/// let converter = ConverterBuilder::new().build()?;
/// let input = File::open("example.xlsx")?;
/// let output = File::create("converted.pdf")?;
/// converter.convert(input, output)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter {
    /// 変換設定
    config: ConversionConfig,

    /// セルフォーマッター
    formatter: CellFormatter,
}

impl Default for Converter {
    /// デフォルト設定の`Converter`（`ConverterBuilder::new().build()`と同じ設定）
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}

impl Converter {
    pub(crate) fn new(config: ConversionConfig) -> Self {
        Self {
            formatter: CellFormatter::new(),
            config,
        }
    }

    /// スプレッドシートをPDFに変換
    ///
    /// # 処理フロー
    ///
    /// 1. 入力をメモリに読み込み、サイズ上限を検査
    /// 2. WorkbookParserの初期化（形式の自動判定、ZIP制限の検査、XMLメタデータの解析）
    /// 3. シート選択
    /// 4. 各シートを並列に処理（パース、フォーマット、グリッド構築、ページ描画）
    /// 5. シート順にページを並べて1つのPDF文書として書き出す
    ///
    /// # 戻り値
    ///
    /// * `Ok(usize)` - 出力したページ数
    /// * `Err(XlsxToPdfError)` - エラーが発生した場合
    ///
    /// ## メモリバッファからの変換
    ///
    /// ```rust,no_run
    /// use xlsxpdf::ConverterBuilder;
    /// use std::io::Cursor;
    ///
    /// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let excel_data: Vec<u8> = vec![]; // スプレッドシートのバイト列
    /// let mut pdf = Vec::new();
    /// converter.convert(Cursor::new(excel_data), &mut pdf)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert<R: Read + Seek, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<usize, XlsxToPdfError> {
        // 1. 入力データをメモリに読み込む（並列処理のため）
        let security_config = SecurityConfig::default();
        let mut buffer = Vec::new();
        let bytes_read = input.read_to_end(&mut buffer)?;

        if bytes_read as u64 > security_config.max_input_file_size {
            return Err(XlsxToPdfError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes_read, security_config.max_input_file_size
            )));
        }

        // 2. WorkbookParserの初期化
        let parser = WorkbookParser::open(buffer.clone())?;

        // 3. シート選択
        let sheet_names =
            parser.select_sheets(&self.config.sheet_selector, self.config.include_hidden)?;
        let Some(first_sheet) = sheet_names.first() else {
            return Err(XlsxToPdfError::Config(
                "No sheets selected for conversion".to_string(),
            ));
        };

        // メタデータは1回だけ解析して各シートで再利用
        let metadata = parser.metadata().clone();
        let renderer = PdfRenderer::new(&self.config);

        // 4. 各シートの処理を並列化（collectはシート順を保持する）
        let sheet_pages: Vec<Vec<PageContent>> = sheet_names
            .par_iter()
            .map(|sheet_name| {
                let mut parser =
                    WorkbookParser::open_with_existing_metadata(buffer.clone(), metadata.clone())?;

                let (sheet_metadata, raw_cells) = parser.parse_sheet(sheet_name, &self.config)?;

                let formatted_cells = raw_cells
                    .iter()
                    .map(|raw_cell| {
                        let content = self.formatter.format_cell(
                            raw_cell,
                            &self.config,
                            sheet_metadata.is_1904,
                        )?;
                        Ok((raw_cell.coord, content))
                    })
                    .collect::<Result<Vec<_>, XlsxToPdfError>>()?;

                let grid = LogicalGrid::build(formatted_cells, &sheet_metadata, &self.config);
                let pages = renderer.render_sheet(sheet_name, &grid)?;

                debug!(
                    sheet = %sheet_metadata.name,
                    index = sheet_metadata.index,
                    rows = grid.rows(),
                    cols = grid.cols(),
                    pages = pages.len(),
                    "rendered sheet"
                );
                Ok(pages)
            })
            .collect::<Result<_, XlsxToPdfError>>()?;

        // 5. シート順に書き出す
        let pages: Vec<PageContent> = sheet_pages.into_iter().flatten().collect();
        let mut writer = BufWriter::new(&mut output);
        let page_count = renderer.write_document(pages, first_sheet, &mut writer)?;
        writer.flush()?;

        debug!(sheets = sheet_names.len(), pages = page_count, "wrote PDF document");
        Ok(page_count)
    }

    /// スプレッドシートをPDFのバイト列に変換
    ///
    /// ```rust,no_run
    /// use std::fs::File;
    /// use xlsxpdf::ConverterBuilder;
    ///
    /// # fn main() -> Result<(), xlsxpdf::XlsxToPdfError> {
    /// let converter = ConverterBuilder::new().build()?;
    /// let pdf = converter.convert_to_vec(File::open("example.xlsx")?)?;
    /// assert!(pdf.starts_with(b"%PDF-"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn convert_to_vec<R: Read + Seek>(&self, input: R) -> Result<Vec<u8>, XlsxToPdfError> {
        let mut buffer = Vec::new();
        self.convert(input, &mut buffer)?;
        Ok(buffer)
    }
}
