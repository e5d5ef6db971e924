//! Layout Module
//!
//! ページの寸法と、表をページに割り付けるための幾何計算を提供するモジュール。
//! 単位はすべてポイント（1/72インチ）です。

use std::ops::Range;

use crate::api::{Orientation, PageSize};
use crate::error::XlsxToPdfError;
use crate::grid::MIN_COLUMN_WIDTH;

/// Courierの文字送り（1000分の600 em）
const COURIER_ADVANCE: f32 = 0.6;

/// 行の高さ（フォントサイズ比）
const LINE_SPACING: f32 = 1.6;

/// ページレイアウト
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageLayout {
    /// ページ幅
    pub width: f32,
    /// ページ高さ
    pub height: f32,
    /// 上下左右の余白
    pub margin: f32,
    /// フォントサイズ
    pub font_size: f32,
}

impl PageLayout {
    /// 用紙サイズと向きからレイアウトを生成
    pub fn new(page_size: PageSize, orientation: Orientation, margin: u32, font_size: u32) -> Self {
        let (short, long) = page_size.dimensions();
        let (width, height) = match orientation {
            Orientation::Landscape => (long, short),
            _ => (short, long),
        };

        Self {
            width,
            height,
            margin: margin as f32,
            font_size: font_size as f32,
        }
    }

    /// 少なくとも1行・1列を描画できるか検証
    pub fn validate(&self) -> Result<(), XlsxToPdfError> {
        if self.printable_width() < self.column_width(MIN_COLUMN_WIDTH) {
            return Err(XlsxToPdfError::Config(format!(
                "Margin {} leaves no room for a column on a {}pt wide page",
                self.margin, self.width
            )));
        }

        // 見出し行 + 表の1行
        if self.printable_height() < self.row_height() * 2.0 {
            return Err(XlsxToPdfError::Config(format!(
                "Margin {} leaves no room for a row on a {}pt high page",
                self.margin, self.height
            )));
        }

        Ok(())
    }

    /// 1文字の幅
    pub fn char_width(&self) -> f32 {
        self.font_size * COURIER_ADVANCE
    }

    /// セル左右の内側余白
    pub fn cell_padding(&self) -> f32 {
        self.char_width() / 2.0
    }

    /// 1行の高さ
    pub fn row_height(&self) -> f32 {
        self.font_size * LINE_SPACING
    }

    /// 印刷可能領域の幅
    pub fn printable_width(&self) -> f32 {
        self.width - self.margin * 2.0
    }

    /// 印刷可能領域の高さ
    pub fn printable_height(&self) -> f32 {
        self.height - self.margin * 2.0
    }

    /// 印刷可能領域の上端（y座標）
    pub fn top(&self) -> f32 {
        self.height - self.margin
    }

    /// 表示幅`chars`の列の幅
    pub fn column_width(&self, chars: usize) -> f32 {
        chars as f32 * self.char_width() + self.cell_padding() * 2.0
    }

    /// 幅`width`の枠に収まる表示幅
    pub fn chars_fitting(&self, width: f32) -> usize {
        let inner = width - self.cell_padding() * 2.0;
        if inner <= 0.0 {
            return 0;
        }
        // 浮動小数点の誤差で1文字減らないように少し余裕を持たせる
        ((inner + 0.01) / self.char_width()).floor() as usize
    }

    /// 1列に収まる最大の表示幅
    pub fn max_column_chars(&self) -> usize {
        self.chars_fitting(self.printable_width())
    }

    /// シート見出しを除いた、1ページに収まる表の行数
    pub fn rows_per_page(&self) -> usize {
        let available = self.printable_height() - self.row_height();
        ((available + 0.01) / self.row_height()).floor().max(0.0) as usize
    }

    /// 列をページ幅に収まる帯（column band）に分割
    ///
    /// 左から順に詰め、収まらなくなった列から次の帯を始めます。
    /// 1列だけでページ幅を超える列も、単独で1つの帯になります。
    pub fn column_bands(&self, widths: &[f32]) -> Vec<Range<usize>> {
        let limit = self.printable_width() + 0.01;
        let mut bands = Vec::new();
        let mut start = 0;
        let mut used = 0.0;

        for (idx, &w) in widths.iter().enumerate() {
            if idx > start && used + w > limit {
                bands.push(start..idx);
                start = idx;
                used = 0.0;
            }
            used += w;
        }
        if start < widths.len() {
            bands.push(start..widths.len());
        }

        bands
    }
}
