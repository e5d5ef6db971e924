//! XML Metadata Parser Module
//!
//! XLSX内部のXMLファイルから、calamineで取得不可能な情報を抽出するモジュール。
//! 非表示行/列、1904年エポック判定と、ZIPアーカイブのセキュリティ検査を提供します。

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::XlsxToPdfError;
use crate::security::{validate_zip_path, SecurityConfig};

/// ZIPアーカイブのセキュリティ検査
///
/// エントリ数、エントリごとの展開サイズ、展開サイズの累計、
/// エントリパスを検証します。XLSX/ODSなどZIPベースの入力すべてに適用します。
pub(crate) fn check_archive_limits<R: Read + Seek>(reader: R) -> Result<(), XlsxToPdfError> {
    let security_config = SecurityConfig::default();

    let mut archive = ZipArchive::new(reader).map_err(|e| XlsxToPdfError::Zip(e.to_string()))?;

    if archive.len() > security_config.max_file_count {
        return Err(XlsxToPdfError::SecurityViolation(format!(
            "ZIP archive contains too many files: {} (max: {})",
            archive.len(),
            security_config.max_file_count
        )));
    }

    let mut total_decompressed_size = 0u64;
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| XlsxToPdfError::Zip(e.to_string()))?;

        let file_name = file.name();
        validate_zip_path(file_name)
            .map_err(|e| XlsxToPdfError::SecurityViolation(format!("Invalid ZIP path: {}", e)))?;

        let file_size = file.size();
        if file_size > security_config.max_file_size {
            return Err(XlsxToPdfError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                file_name, file_size, security_config.max_file_size
            )));
        }

        total_decompressed_size = total_decompressed_size
            .checked_add(file_size)
            .ok_or_else(|| {
                XlsxToPdfError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

        if total_decompressed_size > security_config.max_decompressed_size {
            return Err(XlsxToPdfError::SecurityViolation(format!(
                "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                total_decompressed_size, security_config.max_decompressed_size
            )));
        }
    }

    Ok(())
}

/// XLSXメタデータパーサー
///
/// `xl/workbook.xml` からシート名とワークシートXMLの対応、1904年エポックフラグを、
/// 各ワークシートXMLから非表示行・列を取得します。
#[derive(Debug, Clone, Default)]
pub(crate) struct XlsxMetadataParser {
    /// シート名 -> 非表示行インデックスのセット
    hidden_rows: HashMap<String, HashSet<u32>>,
    /// シート名 -> 非表示列インデックスのセット
    hidden_cols: HashMap<String, HashSet<u32>>,
    /// 1904年エポックを使用するかどうか
    is_1904: bool,
}

impl XlsxMetadataParser {
    /// XLSXファイル（ZIPアーカイブ）からメタデータを解析
    ///
    /// アーカイブのセキュリティ検査は呼び出し側（`check_archive_limits`）で済んでいる前提です。
    pub fn new<R: Read + Seek>(xlsx_reader: R) -> Result<Self, XlsxToPdfError> {
        let mut archive =
            ZipArchive::new(xlsx_reader).map_err(|e| XlsxToPdfError::Zip(e.to_string()))?;

        // 1. xl/workbook.xml
        let (is_1904, sheets) = match read_entry(&mut archive, "xl/workbook.xml")? {
            Some(xml) => parse_workbook(&xml)?,
            None => (false, Vec::new()),
        };

        // 2. xl/_rels/workbook.xml.rels（r:id -> ワークシートXMLのパス）
        let relationships = match read_entry(&mut archive, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };

        // 3. 各ワークシートXML
        let mut hidden_rows = HashMap::new();
        let mut hidden_cols = HashMap::new();
        for (sheet_name, rel_id) in sheets {
            let Some(target) = relationships.get(&rel_id) else {
                continue;
            };
            let path = resolve_target(target);
            validate_zip_path(&path).map_err(|e| {
                XlsxToPdfError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            let Some(xml) = read_entry(&mut archive, &path)? else {
                continue;
            };
            let (rows, cols) = parse_worksheet_visibility(&xml)?;
            if !rows.is_empty() {
                hidden_rows.insert(sheet_name.clone(), rows);
            }
            if !cols.is_empty() {
                hidden_cols.insert(sheet_name, cols);
            }
        }

        Ok(Self {
            hidden_rows,
            hidden_cols,
            is_1904,
        })
    }

    /// 指定シートの非表示行
    pub fn hidden_rows(&self, sheet_name: &str) -> HashSet<u32> {
        self.hidden_rows.get(sheet_name).cloned().unwrap_or_default()
    }

    /// 指定シートの非表示列
    pub fn hidden_cols(&self, sheet_name: &str) -> HashSet<u32> {
        self.hidden_cols.get(sheet_name).cloned().unwrap_or_default()
    }

    /// 1904年エポックを使用するかどうか
    pub fn is_1904(&self) -> bool {
        self.is_1904
    }
}

/// アーカイブ内のエントリを読み込む（存在しなければ`None`）
fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, XlsxToPdfError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(XlsxToPdfError::Zip(e.to_string())),
    };

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

/// リレーションシップのTargetをアーカイブ内のパスに変換
///
/// `worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`、
/// `/xl/worksheets/sheet1.xml` -> `xl/worksheets/sheet1.xml`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn xml_error(e: impl std::fmt::Display) -> XlsxToPdfError {
    XlsxToPdfError::Config(format!("XML parse error: {}", e))
}

/// 属性値を文字列として取得
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XlsxToPdfError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XlsxToPdfError::Config(format!("XML attribute error: {}", e)))?;
        if attr.key.as_ref() == key {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

/// リレーションシップIDの属性（`r:id`など名前空間接頭辞付き）を取得
fn relationship_id(e: &BytesStart<'_>) -> Result<Option<String>, XlsxToPdfError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XlsxToPdfError::Config(format!("XML attribute error: {}", e)))?;
        if attr.key.as_ref().ends_with(b":id") {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

fn is_true(value: &str) -> bool {
    value == "1" || value == "true"
}

/// xl/workbook.xml の解析
///
/// `<workbookPr date1904="1"/>` と `<sheet name="..." r:id="..."/>` を抽出します。
fn parse_workbook(xml: &[u8]) -> Result<(bool, Vec<(String, String)>), XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut is_1904 = false;
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    if let Some(value) = attribute(&e, b"date1904")? {
                        is_1904 = is_true(&value);
                    }
                }
                b"sheet" => {
                    if let (Some(name), Some(id)) = (attribute(&e, b"name")?, relationship_id(&e)?)
                    {
                        sheets.push((name, id));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((is_1904, sheets))
}

/// リレーションシップファイルの解析（Id -> Target）
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    if let (Some(id), Some(target)) =
                        (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                    {
                        relationships.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// ワークシートXMLから非表示行・列を解析
///
/// `<col min="3" max="3" hidden="1"/>` と `<row r="15" hidden="1">` を対象とします。
/// Excelの行番号・列番号は1始まりなので、0始まりに変換します。
fn parse_worksheet_visibility(xml: &[u8]) -> Result<(HashSet<u32>, HashSet<u32>), XlsxToPdfError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut hidden_rows = HashSet::new();
    let mut hidden_cols = HashSet::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"col" => {
                    let hidden = attribute(&e, b"hidden")?.is_some_and(|v| is_true(&v));
                    if hidden {
                        let min = attribute(&e, b"min")?;
                        let max = attribute(&e, b"max")?;
                        if let (Some(min), Some(max)) = (min, max) {
                            let min = min.parse::<u32>()?.saturating_sub(1);
                            let max = max.parse::<u32>()?.saturating_sub(1);
                            hidden_cols.extend(min..=max);
                        }
                    }
                }
                b"row" => {
                    let hidden = attribute(&e, b"hidden")?.is_some_and(|v| is_true(&v));
                    if hidden {
                        if let Some(r) = attribute(&e, b"r")? {
                            hidden_rows.insert(r.parse::<u32>()?.saturating_sub(1));
                        }
                    }
                }
                // 行・列の定義はsheetData内で完結するため、以降は読まない
                b"mergeCells" | b"pageMargins" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((hidden_rows, hidden_cols))
}
