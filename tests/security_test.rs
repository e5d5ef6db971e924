//! Security Tests
//!
//! セキュリティ対策のテストケースを実装します。
//! ZIP bomb攻撃、パストラバーサル攻撃、ダウンロード名の検証などを確認します。

use std::io::{Cursor, Write};

use xlsxpdf::{validate_output_name, ConverterBuilder, XlsxToPdfError};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// 指定したエントリを持つZIPアーカイブを作成
fn zip_with_entries<'a>(entries: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut zip_data = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);

        for name in entries {
            zip.start_file(name, options).unwrap();
            zip.write_all(b"test").unwrap();
        }

        zip.finish().unwrap();
    }
    zip_data
}

fn convert(data: Vec<u8>) -> Result<usize, XlsxToPdfError> {
    let converter = ConverterBuilder::new().build().unwrap();
    converter.convert(Cursor::new(data), &mut Vec::new())
}

/// ZIP bomb攻撃のテスト: 大量のファイルを含むZIPアーカイブ
#[test]
fn test_zip_bomb_too_many_files() {
    // 10,001個のファイル（上限: 10,000）
    let names: Vec<String> = (0..10_001).map(|i| format!("xl/file{}.xml", i)).collect();
    let result = convert(zip_with_entries(names.iter().map(String::as_str)));

    match result {
        Err(XlsxToPdfError::SecurityViolation(msg)) => {
            assert!(msg.contains("too many files"));
        }
        e => panic!("Unexpected result: {:?}", e),
    }
}

/// ZIP bomb攻撃のテスト: 展開後のサイズが大きすぎるZIPアーカイブ
#[test]
#[ignore] // 大きなファイルを作成するため、通常のテストではスキップ
fn test_zip_bomb_large_entry() {
    let mut zip_data = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // 100MB + 1バイト（エントリごとの上限: 100MB）
        zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        zip.write_all(&vec![b' '; 100 * 1024 * 1024 + 1]).unwrap();

        zip.finish().unwrap();
    }

    match convert(zip_data) {
        Err(XlsxToPdfError::SecurityViolation(msg)) => {
            assert!(msg.contains("exceeds maximum size"));
        }
        e => panic!("Unexpected result: {:?}", e),
    }
}

/// パストラバーサル攻撃のテスト: `..`を含むパス
#[test]
fn test_path_traversal_dotdot() {
    let result = convert(zip_with_entries(["xl/workbook.xml", "../etc/passwd"]));

    assert!(result.is_err());
    // zipクレートがエントリ名を正規化した場合はZIP/解析エラーになる
    match result {
        Err(XlsxToPdfError::SecurityViolation(msg)) => {
            assert!(msg.contains("Invalid ZIP path"));
        }
        Err(XlsxToPdfError::Parse(_)) | Err(XlsxToPdfError::Zip(_)) => {}
        e => panic!("Unexpected result: {:?}", e),
    }
}

/// パストラバーサル攻撃のテスト: 絶対パス
#[test]
fn test_path_traversal_absolute_path() {
    let result = convert(zip_with_entries(["/etc/passwd"]));

    assert!(result.is_err());
    match result {
        Err(XlsxToPdfError::SecurityViolation(msg)) => {
            assert!(msg.contains("Invalid ZIP path"));
        }
        Err(XlsxToPdfError::Parse(_)) | Err(XlsxToPdfError::Zip(_)) => {}
        e => panic!("Unexpected result: {:?}", e),
    }
}

/// 正常な構造のアーカイブはセキュリティ違反にならない
#[test]
fn test_valid_structure_is_not_a_violation() {
    let result = convert(zip_with_entries([
        "[Content_Types].xml",
        "xl/workbook.xml",
        "xl/worksheets/sheet1.xml",
    ]));

    // 中身が不正なため変換は失敗するが、セキュリティ違反ではない
    assert!(!matches!(result, Err(XlsxToPdfError::SecurityViolation(_))));
}

/// ダウンロード名の検証
#[test]
fn test_output_name_validation() {
    for name in [
        "converted_0f3a9c2b.pdf",
        "converted_2024-01-01_120000.pdf",
        "converted_A.pdf",
    ] {
        assert!(validate_output_name(name).is_ok(), "{}", name);
    }

    for name in [
        "",
        "converted_.pdf",
        "converted_x.PDF",
        "report.pdf",
        "converted_../../etc/passwd.pdf",
        "converted_a/b.pdf",
        "converted_a\\b.pdf",
        "converted_a b.pdf",
        "converted_x.pdf.exe",
    ] {
        assert!(validate_output_name(name).is_err(), "{:?}", name);
    }
}
