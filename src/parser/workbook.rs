//! Workbook Parser
//!
//! calamineを使用したスプレッドシート解析の実装。
//! 内容のシグネチャから形式（xlsx, xlsm, xlsb, xls, ods）を判定して開きます。

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, SheetVisible, Sheets};

use crate::api::SheetSelector;
use crate::builder::ConversionConfig;
use crate::error::XlsxToPdfError;
use crate::parser::metadata::{check_archive_limits, XlsxMetadataParser};
use crate::types::{CellCoord, CellRange, CellValue, MergedRegion, RawCellData, SheetMetadata};

/// ZIPローカルファイルヘッダのシグネチャ
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// ワークブックパーサー
///
/// calamineのラッパーとして、ワークブックレベルの操作を提供します。
pub(crate) struct WorkbookParser {
    /// calamineのワークブック（形式は自動判定）
    workbook: Sheets<Cursor<Vec<u8>>>,
    /// XMLメタデータ（XLSX以外は既定値）
    metadata: XlsxMetadataParser,
}

impl WorkbookParser {
    /// ワークブックを開き、XMLメタデータも解析する
    ///
    /// ZIPベースの入力は、calamineに渡す前にアーカイブ制限を検査します。
    pub fn open(buffer: Vec<u8>) -> Result<Self, XlsxToPdfError> {
        let metadata = if buffer.starts_with(ZIP_SIGNATURE) {
            check_archive_limits(Cursor::new(buffer.as_slice()))?;
            XlsxMetadataParser::new(Cursor::new(buffer.as_slice()))?
        } else {
            XlsxMetadataParser::default()
        };

        Self::open_with_existing_metadata(buffer, metadata)
    }

    /// ワークブックを開き、解析済みのメタデータを再利用する
    ///
    /// シートごとの並列処理で、ワークブックを再オープンする際に使用します。
    pub fn open_with_existing_metadata(
        buffer: Vec<u8>,
        metadata: XlsxMetadataParser,
    ) -> Result<Self, XlsxToPdfError> {
        let workbook = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { workbook, metadata })
    }

    /// すべてのシート名を取得
    pub fn get_sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// メタデータを取得（並列処理での再利用用）
    pub fn metadata(&self) -> &XlsxMetadataParser {
        &self.metadata
    }

    /// シートが非表示かどうか
    fn is_hidden_sheet(&self, sheet_name: &str) -> bool {
        self.workbook
            .sheets_metadata()
            .iter()
            .any(|sheet| sheet.name == sheet_name && sheet.visible != SheetVisible::Visible)
    }

    /// シート選択方式に基づいてシートを選択
    ///
    /// `All`は非表示シートを除外します（`include_hidden`が`true`の場合を除く）。
    /// 明示的に指定されたシートは、非表示でも選択されます。
    pub fn select_sheets(
        &self,
        selector: &SheetSelector,
        include_hidden: bool,
    ) -> Result<Vec<String>, XlsxToPdfError> {
        let all_sheet_names = self.get_sheet_names();

        let by_index = |index: usize| {
            all_sheet_names.get(index).cloned().ok_or_else(|| {
                XlsxToPdfError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    all_sheet_names.len()
                ))
            })
        };
        let by_name = |name: &String| {
            if all_sheet_names.contains(name) {
                Ok(name.clone())
            } else {
                Err(XlsxToPdfError::Config(format!("Sheet '{}' not found", name)))
            }
        };

        match selector {
            SheetSelector::All => Ok(all_sheet_names
                .iter()
                .filter(|name| include_hidden || !self.is_hidden_sheet(name))
                .cloned()
                .collect()),
            SheetSelector::Index(index) => Ok(vec![by_index(*index)?]),
            SheetSelector::Name(name) => Ok(vec![by_name(name)?]),
            SheetSelector::Indices(indices) => indices.iter().map(|&i| by_index(i)).collect(),
            SheetSelector::Names(names) => names.iter().map(by_name).collect(),
        }
    }

    /// シートをパースして、メタデータとセルデータを抽出
    ///
    /// セル座標はシート上の絶対座標（A1 = (0, 0)）です。
    pub fn parse_sheet(
        &mut self,
        sheet_name: &str,
        config: &ConversionConfig,
    ) -> Result<(SheetMetadata, Vec<RawCellData>), XlsxToPdfError> {
        let range = self.workbook.worksheet_range(sheet_name)?;
        let metadata = self.collect_metadata(sheet_name)?;

        // 数式は1回だけ取得して全セルで再利用する
        let formula_range = self.workbook.worksheet_formula(sheet_name).ok();

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut cells = Vec::new();

        for (row_offset, row) in range.rows().enumerate() {
            let row_idx = start_row + row_offset as u32;
            if !config.include_hidden && metadata.hidden_rows.contains(&row_idx) {
                continue;
            }

            for (col_offset, cell) in row.iter().enumerate() {
                let col_idx = start_col + col_offset as u32;
                if !config.include_hidden && metadata.hidden_cols.contains(&col_idx) {
                    continue;
                }

                let coord = CellCoord::new(row_idx, col_idx);
                if let Some(range) = &config.range {
                    if !range.contains(coord) {
                        continue;
                    }
                }

                let value = convert_value(cell);
                let formula = formula_at(&formula_range, coord);
                if value.is_empty() && formula.is_none() {
                    continue;
                }

                cells.push(RawCellData {
                    coord,
                    value,
                    formula,
                });
            }
        }

        Ok((metadata, cells))
    }

    /// シートのメタデータを収集
    fn collect_metadata(&mut self, sheet_name: &str) -> Result<SheetMetadata, XlsxToPdfError> {
        let index = self
            .workbook
            .sheet_names()
            .iter()
            .position(|name| name == sheet_name)
            .ok_or_else(|| XlsxToPdfError::Config(format!("Sheet '{}' not found", sheet_name)))?;

        // 結合セルはXLSXのみ取得可能
        let merged_regions = match &mut self.workbook {
            Sheets::Xlsx(xlsx) => {
                xlsx.load_merged_regions()
                    .map_err(|e| XlsxToPdfError::Parse(e.into()))?;
                match xlsx.worksheet_merge_cells(sheet_name) {
                    Some(Ok(regions)) => regions
                        .iter()
                        .map(|dims| {
                            MergedRegion::new(CellRange::new(
                                CellCoord::new(dims.start.0, dims.start.1),
                                CellCoord::new(dims.end.0, dims.end.1),
                            ))
                        })
                        .collect(),
                    Some(Err(_)) | None => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        Ok(SheetMetadata {
            name: sheet_name.to_string(),
            index,
            merged_regions,
            hidden_rows: self.metadata.hidden_rows(sheet_name),
            hidden_cols: self.metadata.hidden_cols(sheet_name),
            is_1904: self.metadata.is_1904(),
        })
    }
}

/// calamineのセル値を内部表現に変換
fn convert_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

/// 絶対座標で数式文字列を取得
fn formula_at(formula_range: &Option<Range<String>>, coord: CellCoord) -> Option<String> {
    formula_range
        .as_ref()
        .and_then(|range| range.get_value((coord.row, coord.col)))
        .filter(|f| !f.is_empty())
        .cloned()
}
