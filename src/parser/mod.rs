//! Parser Module
//!
//! calamineを使用したスプレッドシート解析と、XLSX内部XMLのメタデータ解析。

mod metadata;
mod workbook;

pub(crate) use workbook::WorkbookParser;
