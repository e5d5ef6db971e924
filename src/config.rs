//! Server Configuration
//!
//! 起動時に環境変数から読み込むサーバー設定。

use std::path::PathBuf;

use crate::api::{Orientation, PageSize};
use crate::builder::{Converter, ConverterBuilder};
use crate::error::XlsxToPdfError;

/// アップロードサーバーの設定
///
/// すべての項目に既定値があるため、環境変数を設定しなくても起動できます。
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// 待ち受けアドレス（`XLSXPDF_BIND`、既定: `"0.0.0.0:8080"`）
    pub bind_address: String,

    /// `converted_*.pdf`の出力先（`XLSXPDF_OUTPUT_DIR`、既定: `"."`）
    pub output_dir: PathBuf,

    /// `tracing`のフィルター文字列（`XLSXPDF_LOG`、例: `"debug,tower_http=warn"`）
    ///
    /// `RUST_LOG`が設定されている場合はそちらが優先されます。
    pub log_level: String,

    /// ログをJSON Lines形式で出力する（`XLSXPDF_LOG_JSON`）
    pub log_json: bool,

    /// アップロードサイズの上限（MiB、`XLSXPDF_MAX_UPLOAD_MB`、既定: 20）
    pub max_upload_mb: usize,

    /// 出力の用紙サイズ（`XLSXPDF_PAGE_SIZE`、既定: A4）
    pub page_size: PageSize,

    /// 横向き（`XLSXPDF_LANDSCAPE`）
    pub landscape: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_owned(),
            output_dir: PathBuf::from("."),
            log_level: "info".to_owned(),
            log_json: false,
            max_upload_mb: 20,
            page_size: PageSize::A4,
            landscape: false,
        }
    }
}

impl ServerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の検索関数から設定を読み込む
    ///
    /// 解釈できない値は標準エラーに警告を出して既定値に置き換えます
    /// （この時点ではまだ`tracing`が初期化されていないため）。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let page_size = match lookup("XLSXPDF_PAGE_SIZE") {
            Some(name) => PageSize::from_name(&name).unwrap_or_else(|| {
                eprintln!("WARN: XLSXPDF_PAGE_SIZE='{}' is not a known page size; using a4", name);
                defaults.page_size
            }),
            None => defaults.page_size,
        };

        Self {
            bind_address: lookup("XLSXPDF_BIND").unwrap_or(defaults.bind_address),
            output_dir: lookup("XLSXPDF_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            log_level: lookup("XLSXPDF_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("XLSXPDF_LOG_JSON").is_some_and(|v| is_truthy(&v)),
            max_upload_mb: parse_or(&lookup, "XLSXPDF_MAX_UPLOAD_MB", defaults.max_upload_mb),
            page_size,
            landscape: lookup("XLSXPDF_LANDSCAPE").is_some_and(|v| is_truthy(&v)),
        }
    }

    /// アップロードサイズの上限（バイト）
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// アップロードの変換に使う`Converter`を生成
    pub fn converter(&self) -> Result<Converter, XlsxToPdfError> {
        let orientation = if self.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };

        ConverterBuilder::new()
            .with_page_size(self.page_size)
            .with_orientation(orientation)
            .build()
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("WARN: {}='{}' is not valid; using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
