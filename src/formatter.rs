//! Formatter Module
//!
//! セル値を表示用テキストに変換するモジュール。
//! 数値は「標準」書式相当、日付はシリアル値から暦日時に変換します。

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::api::{DateFormat, FormulaMode};
use crate::builder::ConversionConfig;
use crate::error::XlsxToPdfError;
use crate::types::{CellValue, RawCellData};

/// 1日の秒数
const SECONDS_PER_DAY: f64 = 86_400.0;

/// セルフォーマッター
///
/// セル値のフォーマット処理のファサードとして機能します。
#[derive(Debug)]
pub(crate) struct CellFormatter {
    /// 日付フォーマッター
    date_formatter: DateFormatter,

    /// 数値フォーマッター
    number_formatter: NumberFormatter,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new() -> Self {
        Self {
            date_formatter: DateFormatter,
            number_formatter: NumberFormatter,
        }
    }

    /// セル値をフォーマット
    ///
    /// 戻り値は1行のテキストです（改行は空白に置換、前後の空白は除去）。
    pub fn format_cell(
        &self,
        raw_cell: &RawCellData,
        config: &ConversionConfig,
        is_1904: bool,
    ) -> Result<String, XlsxToPdfError> {
        if config.formula_mode == FormulaMode::Formula {
            if let Some(ref formula) = raw_cell.formula {
                return Ok(if formula.starts_with('=') {
                    formula.clone()
                } else {
                    format!("={}", formula)
                });
            }
        }

        let formatted = match &raw_cell.value {
            CellValue::Number(n) => self.number_formatter.format(*n),
            CellValue::DateTime(serial) => {
                if DateFormatter::in_range(*serial, is_1904) {
                    self.date_formatter
                        .format(*serial, &config.date_format, is_1904)?
                } else {
                    // 暦日に変換できないシリアル値は数値として表示
                    self.number_formatter.format(*serial)
                }
            }
            CellValue::String(s) => single_line(s),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Empty => String::new(),
        };

        Ok(formatted)
    }
}

impl Default for CellFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// 改行・タブを空白に置換し、前後の空白を除去
fn single_line(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
        .collect()
}

/// 日付フォーマッター
///
/// Excelのシリアル日付値を文字列に変換します。
///
/// # エポックシステム
///
/// - 1900年システム（デフォルト）: 1899年12月30日起算
///   - シリアル値1 = 1900年1月1日、シリアル値61 = 1900年3月1日
///   - Excelは存在しない1900年2月29日（シリアル値60）を数えるため、
///     60未満のシリアル値は1日後ろにずらす
/// - 1904年システム: 1904年1月1日起算（シリアル値0 = 1904年1月1日）
///
/// 小数部は時刻（1.0 = 24時間）として扱い、秒単位に丸めます。
#[derive(Debug)]
pub(crate) struct DateFormatter;

impl DateFormatter {
    /// 9999-12-31（1900年システム）
    const MAX_SERIAL: f64 = 2_958_465.0;

    /// 暦日に変換可能なシリアル値かどうか
    pub fn in_range(serial_value: f64, is_1904: bool) -> bool {
        let max = if is_1904 {
            Self::MAX_SERIAL - 1462.0
        } else {
            Self::MAX_SERIAL
        };
        serial_value.is_finite() && (0.0..=max).contains(&serial_value)
    }

    /// シリアル値を日時に変換
    pub fn to_datetime(
        &self,
        serial_value: f64,
        is_1904: bool,
    ) -> Result<NaiveDateTime, XlsxToPdfError> {
        let overflow = || {
            XlsxToPdfError::Config(format!(
                "Date calculation overflow: serial_value={}, is_1904={}",
                serial_value, is_1904
            ))
        };

        let (epoch, days_offset) = if is_1904 {
            (NaiveDate::from_ymd_opt(1904, 1, 1), 0i64)
        } else if serial_value < 60.0 {
            (NaiveDate::from_ymd_opt(1899, 12, 30), 1i64)
        } else {
            (NaiveDate::from_ymd_opt(1899, 12, 30), 0i64)
        };
        let epoch = epoch
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| XlsxToPdfError::Config("Invalid epoch date".to_string()))?;

        let days = serial_value.floor();
        let seconds = ((serial_value - days) * SECONDS_PER_DAY).round() as i64;

        let days = Duration::try_days(days as i64 + days_offset).ok_or_else(overflow)?;
        let seconds = Duration::try_seconds(seconds).ok_or_else(overflow)?;

        epoch
            .checked_add_signed(days)
            .and_then(|dt| dt.checked_add_signed(seconds))
            .ok_or_else(overflow)
    }

    /// 日付値をフォーマット
    ///
    /// `Iso8601`は時刻成分がなければ `YYYY-MM-DD`、あれば `YYYY-MM-DD HH:MM:SS`。
    pub fn format(
        &self,
        serial_value: f64,
        date_format: &DateFormat,
        is_1904: bool,
    ) -> Result<String, XlsxToPdfError> {
        let datetime = self.to_datetime(serial_value, is_1904)?;

        let pattern = match date_format {
            DateFormat::Iso8601 => {
                if datetime.time() == chrono::NaiveTime::MIN {
                    "%Y-%m-%d"
                } else {
                    "%Y-%m-%d %H:%M:%S"
                }
            }
            DateFormat::Custom(format_str) => format_str.as_str(),
        };

        let mut formatted = String::new();
        write!(formatted, "{}", datetime.format(pattern)).map_err(|_| {
            XlsxToPdfError::Config(format!("Invalid date format string: '{}'", pattern))
        })?;
        Ok(formatted)
    }
}

/// 数値フォーマッター
///
/// Excelの「標準」書式に近い表示を行います。
/// 整数値は小数点なし、それ以外は最短の往復可能表現で出力します。
#[derive(Debug)]
pub(crate) struct NumberFormatter;

impl NumberFormatter {
    /// 小数点なしで表示する整数値の上限
    const INTEGER_LIMIT: f64 = 1e15;

    /// 数値をフォーマット
    pub fn format(&self, value: f64) -> String {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < Self::INTEGER_LIMIT {
            format!("{}", value as i64)
        } else {
            value.to_string()
        }
    }
}
