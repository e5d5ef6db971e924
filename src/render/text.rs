//! Text Module
//!
//! 組み込みCourierフォント用のテキスト変換。
//! ページ上の文字列は`WinAnsiEncoding`で出力し、表現できない文字は`?`に置換します。
//! 表示幅0の文字（結合文字）と制御文字は出力しません。

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// 切り詰めたテキストの末尾に付ける記号
const ELLIPSIS: &str = "...";

/// WinAnsiで表現できない文字の置換バイト
const REPLACEMENT: u8 = b'?';

/// 文字をWinAnsi（CP1252）のバイトに変換
fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let byte = match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8A,
                '‹' => 0x8B,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9A,
                '›' => 0x9B,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                _ => return None,
            };
            Some(byte)
        }
    }
}

/// テキストをWinAnsiバイト列に変換（1グリフ = 1バイト）
///
/// 出力されるグリフは表示幅1または2の文字に対応するため、
/// グリフ数が`text.width()`を超えることはありません。
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control() && c.width().is_some_and(|w| w > 0))
        .map(|c| win_ansi_byte(c).unwrap_or(REPLACEMENT))
        .collect()
}

/// テキストを表示幅`max_width`以内に切り詰める
///
/// 収まらない場合は文字境界で切り、末尾に`...`を付けます。
/// `max_width`が3未満の場合は記号を付けずに切ります。
pub(crate) fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let (budget, suffix) = if max_width >= ELLIPSIS.len() {
        (max_width - ELLIPSIS.len(), ELLIPSIS)
    } else {
        (max_width, "")
    };

    let mut used = 0;
    let mut result = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        result.push(c);
    }
    result.push_str(suffix);
    result
}

/// 文書情報（`Title`など）の文字列をエンコード
///
/// ASCIIのみならそのまま、それ以外はBOM付きUTF-16BEで出力します。
pub(crate) fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
