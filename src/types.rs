//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::collections::HashSet;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 日付・時刻（Excelのシリアル値）
    DateTime(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// エラー値（例: #DIV/0!）
    Error(String),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// セル範囲（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 指定された座標が範囲内にあるかを判定
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.start.row
            && coord.row <= self.end.row
            && coord.col >= self.start.col
            && coord.col <= self.end.col
    }
}

/// セル結合範囲の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MergedRegion {
    /// 結合範囲
    pub range: CellRange,

    /// 親セル（左上セル）の座標
    pub parent: CellCoord,
}

impl MergedRegion {
    /// 新しい結合範囲を生成
    pub fn new(range: CellRange) -> Self {
        Self {
            parent: range.start,
            range,
        }
    }
}

/// パーサーから抽出された生のセルデータ
#[derive(Debug, Clone)]
pub(crate) struct RawCellData {
    /// セル座標（シート上の絶対座標）
    pub coord: CellCoord,

    /// セルの値
    pub value: CellValue,

    /// 数式文字列（数式セルの場合）
    pub formula: Option<String>,
}

/// シートのメタデータ
#[derive(Debug, Clone)]
pub(crate) struct SheetMetadata {
    /// シート名
    pub name: String,

    /// シートインデックス（0始まり）
    pub index: usize,

    /// セル結合範囲のリスト
    pub merged_regions: Vec<MergedRegion>,

    /// 非表示行のインデックス
    pub hidden_rows: HashSet<u32>,

    /// 非表示列のインデックス
    pub hidden_cols: HashSet<u32>,

    /// 1904年エポックを使用するか（ワークブック全体の設定）
    pub is_1904: bool,
}

#[cfg(test)]
impl SheetMetadata {
    /// 結合情報・非表示情報を持たないメタデータを生成
    pub fn plain(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            merged_regions: Vec::new(),
            hidden_rows: HashSet::new(),
            hidden_cols: HashSet::new(),
            is_1904: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::String(String::new()).is_empty());
        assert!(!CellValue::Number(42.0).is_empty());
        assert!(!CellValue::DateTime(45658.0).is_empty());
        assert!(!CellValue::String("test".to_string()).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::new(CellCoord::new(0, 0), CellCoord::new(10, 5));

        assert!(range.contains(CellCoord::new(0, 0)));
        assert!(range.contains(CellCoord::new(5, 3)));
        assert!(range.contains(CellCoord::new(10, 5)));

        assert!(!range.contains(CellCoord::new(11, 5)));
        assert!(!range.contains(CellCoord::new(5, 6)));
    }

    #[test]
    fn test_merged_region_new() {
        let range = CellRange::new(CellCoord::new(2, 1), CellCoord::new(3, 4));
        let merged = MergedRegion::new(range);
        assert_eq!(merged.parent, CellCoord::new(2, 1));
        assert!(merged.range.contains(CellCoord::new(3, 4)));
        assert!(!merged.range.contains(CellCoord::new(1, 1)));
    }

    #[test]
    fn test_sheet_metadata_plain() {
        let metadata = SheetMetadata::plain("Sheet1", 0);
        assert_eq!(metadata.name, "Sheet1");
        assert_eq!(metadata.index, 0);
        assert!(metadata.merged_regions.is_empty());
        assert!(metadata.hidden_rows.is_empty());
        assert!(!metadata.is_1904);
    }
}
