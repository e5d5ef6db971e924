//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃への対策と、
//! ダウンロード対象ファイル名の検証を提供します。

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 512MB (536_870_912 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,       // 100MB
            max_input_file_size: 536_870_912, // 512MB
        }
    }
}

/// ZIPエントリのパスを検証
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

/// 変換済みPDFのファイル名を検証
///
/// ダウンロードエンドポイントで受け取る名前は、
/// `converted_<token>.pdf` 形式（tokenは英数字・`-`・`_`のみ）でなければならない。
///
/// ```rust
/// use xlsxpdf::validate_output_name;
///
/// assert!(validate_output_name("converted_0f3a9c.pdf").is_ok());
/// assert!(validate_output_name("../secret.pdf").is_err());
/// ```
pub fn validate_output_name(name: &str) -> Result<(), String> {
    let token = name
        .strip_prefix("converted_")
        .and_then(|rest| rest.strip_suffix(".pdf"))
        .ok_or_else(|| format!("Not a converted file name: {}", name))?;

    if token.is_empty() {
        return Err(format!("Missing token in file name: {}", name));
    }

    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!("Invalid characters in file name: {}", name));
    }

    Ok(())
}
