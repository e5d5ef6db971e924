//! Grid Module
//!
//! スパースなセルデータから稠密なグリッド構造への変換を提供するモジュール。
//! 非表示行・列を詰め、セル結合の処理戦略（Span / DataDuplication）を適用します。

use std::collections::HashMap;

use unicode_width::UnicodeWidthStr;

use crate::api::MergeStrategy;
use crate::builder::ConversionConfig;
use crate::types::{CellCoord, CellRange, MergedRegion, SheetMetadata};

/// 列幅の最小値（表示幅）
pub(crate) const MIN_COLUMN_WIDTH: usize = 3;

/// フォーマット済みセル
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cell {
    /// 表示文字列
    pub content: String,

    /// 結合セルの一部かどうか（親セル自身は含まない）
    pub is_merged: bool,

    /// 結合セルの親座標（グリッド上の座標）
    pub merge_parent: Option<CellCoord>,

    /// 親セルが占める (行数, 列数)。通常セルは (1, 1)、他の枠に含まれるセルは (0, 0)
    pub span: (usize, usize),
}

impl Cell {
    /// 新しい通常セルを生成
    pub fn new(content: String) -> Self {
        Self {
            content,
            is_merged: false,
            merge_parent: None,
            span: (1, 1),
        }
    }

    /// 新しい結合セルを生成
    pub fn new_merged(content: String, parent: CellCoord) -> Self {
        Self {
            content,
            is_merged: true,
            merge_parent: Some(parent),
            span: (1, 1),
        }
    }

    /// 空セルを生成
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    /// 他のセルの枠に含まれて描画されないセルかどうか
    pub fn is_covered(&self) -> bool {
        self.span == (0, 0)
    }
}

/// 論理的なグリッド構造
///
/// 行・列インデックスはシート上の座標ではなく、表示対象の行・列を詰めた連番です。
#[derive(Debug)]
pub(crate) struct LogicalGrid {
    /// グリッドデータ（行 × 列）
    cells: Vec<Vec<Cell>>,

    /// 行数
    rows: usize,

    /// 列数
    cols: usize,
}

impl LogicalGrid {
    /// スパースなセルデータから稠密なグリッド構造を構築
    ///
    /// # 引数
    ///
    /// * `formatted_cells` - フォーマット済みセルデータ（シート上の絶対座標と内容）
    /// * `metadata` - シートのメタデータ（結合セル、非表示行・列）
    /// * `config` - 変換設定（結合戦略、非表示要素、範囲制限）
    pub fn build(
        formatted_cells: Vec<(CellCoord, String)>,
        metadata: &SheetMetadata,
        config: &ConversionConfig,
    ) -> Self {
        let contents: HashMap<CellCoord, String> = formatted_cells.into_iter().collect();

        // 範囲制限で切り取った結合範囲
        let merged_regions: Vec<MergedRegion> = metadata
            .merged_regions
            .iter()
            .filter_map(|region| clip_region(region, config.range.as_ref()))
            .collect();

        // 1. 表示対象の行・列を決定
        let Some(extent) = Self::determine_extent(&contents, &merged_regions) else {
            return Self {
                cells: Vec::new(),
                rows: 0,
                cols: 0,
            };
        };

        let skip_hidden = !config.include_hidden;
        let row_map: Vec<u32> = (extent.start.row..=extent.end.row)
            .filter(|row| !(skip_hidden && metadata.hidden_rows.contains(row)))
            .collect();
        let col_map: Vec<u32> = (extent.start.col..=extent.end.col)
            .filter(|col| !(skip_hidden && metadata.hidden_cols.contains(col)))
            .collect();

        let rows = row_map.len();
        let cols = col_map.len();

        // 2. セルを配置
        let mut cells = vec![vec![Cell::empty(); cols]; rows];
        for (r, &row) in row_map.iter().enumerate() {
            for (c, &col) in col_map.iter().enumerate() {
                if let Some(content) = contents.get(&CellCoord::new(row, col)) {
                    cells[r][c] = Cell::new(content.clone());
                }
            }
        }

        let mut grid = LogicalGrid { cells, rows, cols };

        // 3. セル結合の処理
        for region in &merged_regions {
            let Some(dense) = dense_range(&region.range, &row_map, &col_map) else {
                continue;
            };
            let parent_content = contents.get(&region.parent).cloned().unwrap_or_default();

            match config.merge_strategy {
                MergeStrategy::Span => grid.apply_span(&dense, parent_content),
                MergeStrategy::DataDuplication => {
                    grid.apply_data_duplication(&dense, parent_content)
                }
            }
        }

        grid
    }

    /// 内容を持つセルと結合範囲を包む最小の矩形を算出（内部ヘルパー）
    fn determine_extent(
        contents: &HashMap<CellCoord, String>,
        merged_regions: &[MergedRegion],
    ) -> Option<CellRange> {
        let corners = contents
            .iter()
            .filter(|(_, content)| !content.is_empty())
            .flat_map(|(coord, _)| [*coord, *coord])
            .chain(
                merged_regions
                    .iter()
                    .filter(|region| contents.get(&region.parent).is_some_and(|c| !c.is_empty()))
                    .flat_map(|region| [region.range.start, region.range.end]),
            );

        corners.fold(None, |extent: Option<CellRange>, coord| {
            Some(match extent {
                None => CellRange::new(coord, coord),
                Some(range) => CellRange::new(
                    CellCoord::new(range.start.row.min(coord.row), range.start.col.min(coord.col)),
                    CellCoord::new(range.end.row.max(coord.row), range.end.col.max(coord.col)),
                ),
            })
        })
    }

    /// 枠結合戦略を適用（内部メソッド）
    ///
    /// 左上セルに値と占有サイズを設定し、範囲内の他のセルは空の被覆セルにします。
    fn apply_span(&mut self, range: &CellRange, parent_content: String) {
        let parent = range.start;
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                let (r, c) = (row as usize, col as usize);
                if row == parent.row && col == parent.col {
                    self.cells[r][c] = Cell {
                        content: parent_content.clone(),
                        is_merged: false,
                        merge_parent: None,
                        span: (
                            (range.end.row - range.start.row + 1) as usize,
                            (range.end.col - range.start.col + 1) as usize,
                        ),
                    };
                } else {
                    self.cells[r][c] = Cell {
                        span: (0, 0),
                        ..Cell::new_merged(String::new(), parent)
                    };
                }
            }
        }
    }

    /// データ重複フィル戦略を適用（内部メソッド）
    ///
    /// 結合セル範囲内のすべてのセルに親セルの値を複製します。
    fn apply_data_duplication(&mut self, range: &CellRange, parent_content: String) {
        let parent = range.start;
        for row in range.start.row..=range.end.row {
            for col in range.start.col..=range.end.col {
                let (r, c) = (row as usize, col as usize);
                if row == parent.row && col == parent.col {
                    self.cells[r][c] = Cell::new(parent_content.clone());
                } else {
                    self.cells[r][c] = Cell::new_merged(parent_content.clone(), parent);
                }
            }
        }
    }

    /// 列幅（表示幅）を計算
    ///
    /// 各列について結合の親セル以外の内容の最大表示幅を求め、
    /// `MIN_COLUMN_WIDTH`以上`max_chars`以下に収めます。
    /// 全角文字（日本語など）は表示幅2として計算します。
    pub fn column_widths(&self, max_chars: usize) -> Vec<usize> {
        let max_chars = max_chars.max(MIN_COLUMN_WIDTH);
        let mut widths = vec![MIN_COLUMN_WIDTH; self.cols];

        for row in &self.cells {
            for (col_idx, cell) in row.iter().enumerate() {
                if cell.span.1 > 1 {
                    continue;
                }
                widths[col_idx] = widths[col_idx].max(cell.content.width());
            }
        }

        widths.iter().map(|&w| w.min(max_chars)).collect()
    }

    /// 行数を取得
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 列数を取得
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 表示するセルがないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// セルを取得
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[row][col]
    }
}

/// 結合範囲を範囲制限で切り取る（親セルが範囲外なら除外）
fn clip_region(region: &MergedRegion, limit: Option<&CellRange>) -> Option<MergedRegion> {
    let Some(limit) = limit else {
        return Some(region.clone());
    };
    if !limit.contains(region.parent) {
        return None;
    }

    let end = CellCoord::new(
        region.range.end.row.min(limit.end.row),
        region.range.end.col.min(limit.end.col),
    );
    Some(MergedRegion::new(CellRange::new(region.range.start, end)))
}

/// シート座標の範囲を、表示対象の行・列を詰めたグリッド座標の範囲に変換
fn dense_range(range: &CellRange, row_map: &[u32], col_map: &[u32]) -> Option<CellRange> {
    let dense_span = |map: &[u32], start: u32, end: u32| {
        let first = map.iter().position(|&v| v >= start && v <= end)?;
        let last = map.iter().rposition(|&v| v >= start && v <= end)?;
        Some((first as u32, last as u32))
    };

    let (row_start, row_end) = dense_span(row_map, range.start.row, range.end.row)?;
    let (col_start, col_end) = dense_span(col_map, range.start.col, range.end.col)?;

    Some(CellRange::new(
        CellCoord::new(row_start, col_start),
        CellCoord::new(row_end, col_end),
    ))
}
