//! Upload Request Handler
//!
//! アップロードされたスプレッドシートを検証し、変換サービスに委譲して、
//! JSON形式の結果を返すハンドラー。
//!
//! 処理の流れ:
//!
//! 1. メソッドの検証（POST以外は無視して`None`）
//! 2. ファイルの有無と転送エラーの検証
//! 3. 拡張子の検証（大文字小文字を区別）
//! 4. 出力ファイル名 `converted_<token>.pdf` の決定
//! 5. `ConversionService`による変換
//! 6. 結果の生成

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::{info, warn};

use crate::builder::Converter;
use crate::service::{ConversionService, DocumentConverter};

/// ファイルがない、または転送エラーがある場合のメッセージ
pub const MESSAGE_NO_FILE: &str = "no file uploaded or upload error";

/// 拡張子が受け付け対象でない場合のメッセージ
pub const MESSAGE_INVALID_TYPE: &str = "invalid file type";

/// 既定で受け付ける拡張子
pub const DEFAULT_EXTENSION: &str = "xlsx";

/// リクエストメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMethod {
    /// POST（変換を実行する）
    Post,
    /// それ以外（無視する）
    Other,
}

impl UploadMethod {
    /// メソッド名から生成（大文字小文字を区別しない）
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("POST") {
            UploadMethod::Post
        } else {
            UploadMethod::Other
        }
    }
}

/// アップロードされたファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// 受信内容を保存した一時ファイルのパス
    pub temp_path: PathBuf,
    /// クライアントが送った元のファイル名
    pub file_name: String,
    /// 転送エラー（ない場合は`None`）
    pub error: Option<String>,
}

impl UploadedFile {
    /// 転送エラーのないファイル
    pub fn new(temp_path: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            temp_path: temp_path.into(),
            file_name: file_name.into(),
            error: None,
        }
    }
}

/// アップロードリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// リクエストメソッド
    pub method: UploadMethod,
    /// `excelFile`フィールドのファイル
    pub file: Option<UploadedFile>,
}

impl UploadRequest {
    /// POSTリクエストを生成
    pub fn post(file: Option<UploadedFile>) -> Self {
        Self {
            method: UploadMethod::Post,
            file,
        }
    }
}

/// 失敗の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 入力の検証に失敗（変換は試みていない）
    Validation,
    /// 変換に失敗
    Conversion,
}

/// アップロードの処理結果
///
/// 境界でのみJSONに変換されます。
///
/// ```rust
/// use xlsxpdf::UploadResponse;
///
/// let response = UploadResponse::Success { file_url: "converted_1.pdf".to_string() };
/// assert_eq!(
///     serde_json::to_string(&response).unwrap(),
///     r#"{"success":true,"fileUrl":"converted_1.pdf"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResponse {
    /// 変換に成功した
    Success {
        /// 出力ファイル名
        file_url: String,
    },
    /// 検証または変換に失敗した
    Failure {
        /// 失敗の種類
        kind: FailureKind,
        /// 利用者向けのメッセージ
        message: String,
    },
}

impl UploadResponse {
    fn validation(message: &str) -> Self {
        UploadResponse::Failure {
            kind: FailureKind::Validation,
            message: message.to_string(),
        }
    }

    /// 成功したかどうか
    pub fn is_success(&self) -> bool {
        matches!(self, UploadResponse::Success { .. })
    }

    /// 失敗の種類（成功時は`None`）
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            UploadResponse::Success { .. } => None,
            UploadResponse::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl Serialize for UploadResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UploadResponse", 2)?;
        match self {
            UploadResponse::Success { file_url } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("fileUrl", file_url)?;
            }
            UploadResponse::Failure { message, .. } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("message", message)?;
            }
        }
        state.end()
    }
}

/// 出力ファイル名のトークン生成器
pub type TokenSource = Arc<dyn Fn() -> String + Send + Sync>;

/// アップロードリクエストハンドラー
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxpdf::{UploadRequest, UploadRequestHandler, UploadedFile};
///
/// let handler = UploadRequestHandler::new("/var/lib/xlsxpdf");
/// let request = UploadRequest::post(Some(UploadedFile::new("/tmp/upload-1", "report.xlsx")));
/// if let Some(response) = handler.handle(request) {
///     println!("{}", serde_json::to_string(&response).unwrap());
/// }
/// ```
pub struct UploadRequestHandler<C = Converter> {
    service: ConversionService<C>,
    output_dir: PathBuf,
    accepted_extension: String,
    token_source: TokenSource,
}

impl<C> fmt::Debug for UploadRequestHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequestHandler")
            .field("output_dir", &self.output_dir)
            .field("accepted_extension", &self.accepted_extension)
            .finish_non_exhaustive()
    }
}

impl UploadRequestHandler<Converter> {
    /// 既定の変換器で、`output_dir`に出力するハンドラーを生成
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self::with_service(ConversionService::default(), output_dir)
    }
}

impl<C: DocumentConverter> UploadRequestHandler<C> {
    /// 変換サービスを指定してハンドラーを生成
    pub fn with_service(service: ConversionService<C>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            output_dir: output_dir.into(),
            accepted_extension: DEFAULT_EXTENSION.to_string(),
            token_source: Arc::new(|| uuid::Uuid::new_v4().simple().to_string()),
        }
    }

    /// 受け付ける拡張子を指定する（大文字小文字を区別、`.`なし）
    pub fn with_accepted_extension(mut self, extension: impl Into<String>) -> Self {
        self.accepted_extension = extension.into();
        self
    }

    /// 出力ファイル名のトークン生成器を指定する
    ///
    /// 既定はUUID v4（ハイフンなし）です。
    pub fn with_token_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.token_source = Arc::new(source);
        self
    }

    /// 出力ディレクトリ
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// アップロードリクエストを処理する
    ///
    /// POST以外のリクエストは無視して`None`を返します。
    pub fn handle(&self, request: UploadRequest) -> Option<UploadResponse> {
        if request.method != UploadMethod::Post {
            return None;
        }

        // 1. ファイルの有無と転送エラー
        let file = match request.file {
            Some(file) if file.error.is_none() => file,
            Some(file) => {
                warn!(
                    file_name = %file.file_name,
                    error = file.error.as_deref().unwrap_or_default(),
                    "upload error"
                );
                return Some(UploadResponse::validation(MESSAGE_NO_FILE));
            }
            None => {
                warn!("no file uploaded");
                return Some(UploadResponse::validation(MESSAGE_NO_FILE));
            }
        };

        // 2. 拡張子
        if file_extension(&file.file_name) != Some(self.accepted_extension.as_str()) {
            warn!(file_name = %file.file_name, "invalid file type");
            return Some(UploadResponse::validation(MESSAGE_INVALID_TYPE));
        }

        // 3. 出力ファイル名
        let file_name = format!("converted_{}.pdf", (self.token_source)());
        let target = self.output_dir.join(&file_name);

        // 4. 変換
        let response = match self.service.convert(&file.temp_path, &target) {
            Ok(_) => {
                info!(upload = %file.file_name, output = %file_name, "upload converted");
                UploadResponse::Success {
                    file_url: file_name,
                }
            }
            Err(e) => UploadResponse::Failure {
                kind: FailureKind::Conversion,
                message: format!("conversion error: {}", e),
            },
        };

        Some(response)
    }
}

/// ファイル名の最後の`.`以降を拡張子として返す
///
/// `.xlsx`のようにドットで始まる名前も`xlsx`を拡張子とみなします。
fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    base.rsplit_once('.').map(|(_, extension)| extension)
}
