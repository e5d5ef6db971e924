//! HTTP Server
//!
//! `UploadRequestHandler`をHTTPで公開するaxumルーター。
//!
//! | ルート | 内容 |
//! |--------|------|
//! | `POST /convert` | multipartの`excelFile`フィールドを変換（他のメソッドは204） |
//! | `GET /converted/{name}` | 変換済みPDFのダウンロード |
//! | `GET /health` | `{"status":"ok","version":"..."}` |

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::error::XlsxToPdfError;
use crate::security::validate_output_name;
use crate::service::ConversionService;
use crate::upload::{
    FailureKind, UploadMethod, UploadRequest, UploadRequestHandler, UploadResponse, UploadedFile,
};

/// アップロードを受け取るmultipartフィールド名
pub const UPLOAD_FIELD: &str = "excelFile";

/// 全ハンドラーで共有する状態
#[derive(Debug, Clone)]
pub struct AppState {
    handler: Arc<UploadRequestHandler>,
    max_upload_bytes: usize,
}

impl AppState {
    /// ハンドラーとアップロード上限（バイト）から生成
    pub fn new(handler: UploadRequestHandler, max_upload_bytes: usize) -> Self {
        Self {
            handler: Arc::new(handler),
            max_upload_bytes,
        }
    }

    /// サーバー設定から生成
    pub fn from_config(config: &ServerConfig) -> Result<Self, XlsxToPdfError> {
        let service = ConversionService::new(config.converter()?);
        let handler = UploadRequestHandler::with_service(service, &config.output_dir);
        Ok(Self::new(handler, config.max_upload_bytes()))
    }
}

/// ルーターを構築する
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/convert", any(convert))
        .route("/converted/{name}", get(download))
        .route("/health", get(health))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── errors ───────────────────────────────────────────────────────────────────

/// ルーター内部のエラー
///
/// 本文は`{"error": "..."}`。内部エラーの詳細はログにのみ出力します。
#[derive(Debug, Error)]
pub enum ServerError {
    /// 要求されたファイルが存在しない
    #[error("not found: {0}")]
    NotFound(String),

    /// リクエストが不正
    #[error("bad request: {0}")]
    BadRequest(String),

    /// サーバー内部のエラー
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ── handlers ─────────────────────────────────────────────────────────────────

/// 受信済みのアップロード
///
/// 一時ファイルは変換が終わるまで保持し、ドロップ時に削除されます。
struct ReceivedUpload {
    temp: NamedTempFile,
    file: UploadedFile,
}

async fn convert(
    State(state): State<AppState>,
    method: Method,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let method = UploadMethod::from_name(method.as_str());

    let upload = match (method, multipart) {
        (UploadMethod::Post, Ok(multipart)) => receive_upload(multipart).await?,
        (UploadMethod::Post, Err(rejection)) => {
            warn!(error = %rejection, "request is not a multipart upload");
            None
        }
        _ => None,
    };

    let handler = Arc::clone(&state.handler);
    let response = tokio::task::spawn_blocking(move || {
        let (temp, file) = match upload {
            Some(upload) => (Some(upload.temp), Some(upload.file)),
            None => (None, None),
        };
        let response = handler.handle(UploadRequest { method, file });
        drop(temp);
        response
    })
    .await
    .map_err(|e| ServerError::Internal(format!("conversion task failed: {}", e)))?;

    Ok(upload_response(response))
}

/// `excelFile`フィールドを一時ファイルに書き出す
///
/// フィールドが見つからなければ`None`。読み込み中のエラー（上限超過を含む）は
/// `UploadedFile::error`に記録します。
async fn receive_upload(mut multipart: Multipart) -> Result<Option<ReceivedUpload>, ServerError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "failed to read multipart body");
                return Ok(None);
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_owned();
        let temp = NamedTempFile::new()
            .map_err(|e| ServerError::Internal(format!("failed to create temp file: {}", e)))?;

        let mut file = UploadedFile::new(temp.path(), file_name);
        if file.file_name.is_empty() {
            file.error = Some("no file selected".to_owned());
        } else {
            match stream_field(field, &temp).await {
                Ok(bytes) => debug!(file_name = %file.file_name, bytes, "received upload"),
                Err(e) => file.error = Some(e.to_string()),
            }
        }

        return Ok(Some(ReceivedUpload { temp, file }));
    }
}

async fn stream_field(mut field: Field<'_>, temp: &NamedTempFile) -> anyhow::Result<u64> {
    let mut out = tokio::fs::File::from_std(temp.reopen()?);
    let mut written = 0u64;

    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;

    Ok(written)
}

fn upload_response(response: Option<UploadResponse>) -> Response {
    let Some(response) = response else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let status = match response.failure_kind() {
        None => StatusCode::OK,
        Some(FailureKind::Validation) => StatusCode::BAD_REQUEST,
        Some(FailureKind::Conversion) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(response)).into_response()
}

async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ServerError> {
    validate_output_name(&name).map_err(ServerError::BadRequest)?;

    let path: PathBuf = state.handler.output_dir().join(&name);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(name));
        }
        Err(e) => return Err(ServerError::Internal(format!("{}: {}", path.display(), e))),
    };

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

/// ヘルスチェック
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
