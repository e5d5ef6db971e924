//! Render Module
//!
//! 論理グリッドをページ分割し、PDF文書として出力するモジュール。
//! PDFオブジェクトの生成と書き出しは`lopdf`に委譲します。
//!
//! 出力は決定的です。同じグリッドと設定からは、バイト単位で同一のPDFが生成されます
//! （タイムスタンプやランダムなIDを含めません）。

mod layout;
mod text;

use std::collections::HashSet;
use std::io::Write;
use std::ops::Range;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::builder::ConversionConfig;
use crate::error::XlsxToPdfError;
use crate::grid::LogicalGrid;

pub(crate) use layout::PageLayout;

/// フォントリソース名
const FONT_NAME: &str = "F1";

/// 見出し行の背景色（グレースケール）
const HEADER_FILL: f32 = 0.9;

/// 罫線の太さ
const LINE_WIDTH: f32 = 0.5;

/// 1ページ分の描画命令（エンコード済みのコンテンツストリーム）
#[derive(Debug, Clone)]
pub(crate) struct PageContent(Vec<u8>);

/// PDFレンダラー
#[derive(Debug, Clone)]
pub(crate) struct PdfRenderer {
    layout: PageLayout,
    max_column_chars: usize,
    repeat_header: bool,
    compress: bool,
}

impl PdfRenderer {
    /// 変換設定からレンダラーを生成
    pub fn new(config: &ConversionConfig) -> Self {
        let layout = PageLayout::new(
            config.page_size,
            config.orientation,
            config.margin,
            config.font_size,
        );
        Self {
            max_column_chars: config.max_column_chars.min(layout.max_column_chars()),
            layout,
            repeat_header: config.repeat_header,
            compress: config.compression,
        }
    }

    /// 1シート分のページを描画
    ///
    /// 列は帯ごと、行はページの高さごとに分割し、
    /// 各帯について上から下へページを並べます。
    pub fn render_sheet(
        &self,
        title: &str,
        grid: &LogicalGrid,
    ) -> Result<Vec<PageContent>, XlsxToPdfError> {
        if grid.is_empty() {
            return Ok(vec![self.render_page(title, grid, &[], 0..0, &[])?]);
        }

        let char_widths = grid.column_widths(self.max_column_chars);
        let widths: Vec<f32> = char_widths
            .iter()
            .map(|&chars| self.layout.column_width(chars))
            .collect();
        let bands = self.layout.column_bands(&widths);
        let row_chunks = self.paginate_rows(grid.rows());

        let mut pages = Vec::with_capacity(bands.len() * row_chunks.len());
        for band in &bands {
            for rows in &row_chunks {
                pages.push(self.render_page(title, grid, rows, band.clone(), &widths)?);
            }
        }

        Ok(pages)
    }

    /// 行をページごとに分割
    ///
    /// 見出し行の繰り返しが有効な場合、2ページ目以降の先頭にグリッドの1行目を置きます。
    fn paginate_rows(&self, total_rows: usize) -> Vec<Vec<usize>> {
        let per_page = self.layout.rows_per_page().max(1);
        let repeat = self.repeat_header && per_page > 1 && total_rows > per_page;

        let mut chunks = Vec::new();
        let mut next = 0;
        while next < total_rows {
            let mut rows = Vec::with_capacity(per_page);
            if repeat && next > 0 {
                rows.push(0);
            }
            let take = per_page - rows.len();
            let end = (next + take).min(total_rows);
            rows.extend(next..end);
            chunks.push(rows);
            next = end;
        }

        chunks
    }

    /// 1ページを描画
    fn render_page(
        &self,
        title: &str,
        grid: &LogicalGrid,
        rows: &[usize],
        band: Range<usize>,
        widths: &[f32],
    ) -> Result<PageContent, XlsxToPdfError> {
        let layout = &self.layout;
        let row_height = layout.row_height();
        let mut ops = Vec::new();

        // シート見出し
        let title_chars = layout.chars_fitting(layout.printable_width());
        push_text(
            &mut ops,
            &text::truncate_to_width(title, title_chars),
            layout.margin + layout.cell_padding(),
            baseline(layout.top(), row_height, layout.font_size),
            layout.font_size,
        );

        // 列の左端x座標（帯の先頭から）
        let mut col_x = Vec::with_capacity(band.len());
        let mut x = layout.margin;
        for col in band.clone() {
            col_x.push(x);
            x += widths[col];
        }
        let table_top = layout.top() - row_height;

        // 枠を描画するセル: (ページ上の行位置, 列, 行数, 列数)
        let mut boxes = Vec::new();
        let mut claimed = HashSet::new();
        for (pos, &row) in rows.iter().enumerate() {
            for col in band.clone() {
                if claimed.contains(&(pos, col)) {
                    continue;
                }
                let cell = grid.cell(row, col);
                let (span_rows, span_cols) = if cell.is_covered() { (1, 1) } else { cell.span };

                // ページ・帯の内側に切り詰めた結合範囲
                let box_rows = rows[pos..]
                    .iter()
                    .enumerate()
                    .take_while(|&(offset, &r)| offset == 0 || (r > row && r < row + span_rows))
                    .count();
                let box_cols = (col + span_cols).min(band.end) - col;

                for p in pos..pos + box_rows {
                    for c in col..col + box_cols {
                        claimed.insert((p, c));
                    }
                }
                boxes.push((pos, col, box_rows, box_cols));
            }
        }

        // 見出し行の背景
        if self.repeat_header && rows.first() == Some(&0) {
            let band_width: f32 = band.clone().map(|c| widths[c]).sum();
            ops.push(op("g", vec![real(HEADER_FILL)]));
            ops.push(op(
                "re",
                vec![
                    real(layout.margin),
                    real(table_top - row_height),
                    real(band_width),
                    real(row_height),
                ],
            ));
            ops.push(op("f", vec![]));
            ops.push(op("g", vec![real(0.0)]));
        }

        // 罫線
        if !boxes.is_empty() {
            ops.push(op("w", vec![real(LINE_WIDTH)]));
            for &(pos, col, box_rows, box_cols) in &boxes {
                let left = col_x[col - band.start];
                let width: f32 = (col..col + box_cols).map(|c| widths[c]).sum();
                let height = row_height * box_rows as f32;
                let bottom = table_top - row_height * pos as f32 - height;
                ops.push(op(
                    "re",
                    vec![real(left), real(bottom), real(width), real(height)],
                ));
            }
            ops.push(op("S", vec![]));
        }

        // セルの文字列
        for &(pos, col, _, box_cols) in &boxes {
            let cell = grid.cell(rows[pos], col);
            if cell.content.is_empty() || cell.is_covered() {
                continue;
            }
            let width: f32 = (col..col + box_cols).map(|c| widths[c]).sum();
            let content = text::truncate_to_width(&cell.content, layout.chars_fitting(width));
            let row_top = table_top - row_height * pos as f32;
            push_text(
                &mut ops,
                &content,
                col_x[col - band.start] + layout.cell_padding(),
                baseline(row_top, row_height, layout.font_size),
                layout.font_size,
            );
        }

        let content = Content { operations: ops };
        let bytes = content
            .encode()
            .map_err(|e| XlsxToPdfError::Pdf(e.to_string()))?;
        Ok(PageContent(bytes))
    }

    /// すべてのページを1つのPDF文書として書き出す
    ///
    /// 文書情報の`Title`には`title`、`Producer`には`xlsxpdf <version>`を設定します。
    pub fn write_document<W: Write>(
        &self,
        pages: Vec<PageContent>,
        title: &str,
        output: &mut W,
    ) -> Result<usize, XlsxToPdfError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_NAME => font_id,
            },
        });

        let page_count = pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for PageContent(bytes) in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(self.layout.width),
                real(self.layout.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(text::encode_text_string(title), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!("xlsxpdf ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        if self.compress {
            doc.compress();
        }
        doc.save_to(output)
            .map_err(|e| XlsxToPdfError::Pdf(e.to_string()))?;

        Ok(page_count)
    }
}

/// テキストのベースライン（行の上端から）
fn baseline(row_top: f32, row_height: f32, font_size: f32) -> f32 {
    row_top - row_height + (row_height - font_size * 0.6) / 2.0
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

/// 小数点以下2桁に丸めた実数
fn real(value: f32) -> Object {
    Object::Real(((value * 100.0).round() / 100.0).into())
}

fn push_text(ops: &mut Vec<Operation>, content: &str, x: f32, y: f32, font_size: f32) {
    ops.push(op("BT", vec![]));
    ops.push(op("Tf", vec![FONT_NAME.into(), real(font_size)]));
    ops.push(op("Td", vec![real(x), real(y)]));
    ops.push(op(
        "Tj",
        vec![Object::String(
            text::encode_win_ansi(content),
            StringFormat::Literal,
        )],
    ));
    ops.push(op("ET", vec![]));
}
