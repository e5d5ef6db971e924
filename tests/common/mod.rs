//! 統合テスト共通のフィクスチャとPDF検査ヘルパー

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use rust_xlsxwriter::{Workbook, XlsxError};

/// 見出し行とデータ2行の表（3行×3列）
pub fn report_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Report")?;

    worksheet.write_string(0, 0, "Region")?;
    worksheet.write_string(0, 1, "Units")?;
    worksheet.write_string(0, 2, "Active")?;

    worksheet.write_string(1, 0, "North")?;
    worksheet.write_number(1, 1, 120.0)?;
    worksheet.write_boolean(1, 2, true)?;

    worksheet.write_string(2, 0, "South")?;
    worksheet.write_number(2, 1, 87.5)?;
    worksheet.write_boolean(2, 2, false)?;

    workbook.save_to_buffer()
}

/// `report_workbook()`を`dir/name`に書き出す
pub fn write_report(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, report_workbook().unwrap()).unwrap();
    path
}

/// 各ページの（展開済み）コンテンツストリームをページ順に返す
pub fn page_contents(pdf: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| doc.get_page_content(page_id).unwrap())
        .collect()
}

/// すべてのページのコンテンツを連結して返す
pub fn all_content(pdf: &[u8]) -> Vec<u8> {
    page_contents(pdf).concat()
}

/// `haystack`に`needle`が含まれる回数
pub fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

/// `haystack`に`needle`が含まれるか
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    count(haystack, needle) > 0
}

/// ページに描画された文字列（PDFリテラル）
pub fn shown(text: &str) -> Vec<u8> {
    format!("({})", text).into_bytes()
}
