//! HTTP Server Tests
//!
//! axumルーターを`tower::ServiceExt::oneshot`で直接駆動するテスト。

#![cfg(feature = "server")]

mod common;

use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use xlsxpdf::server::{router, AppState, UPLOAD_FIELD};
use xlsxpdf::{UploadRequestHandler, MESSAGE_INVALID_TYPE, MESSAGE_NO_FILE};

const BOUNDARY: &str = "xlsxpdf-test-boundary";

fn app(output_dir: &Path, max_upload_bytes: usize) -> Router {
    router(AppState::new(
        UploadRequestHandler::new(output_dir),
        max_upload_bytes,
    ))
}

/// `name`フィールドに`file_name`のファイルを載せたmultipart本文
fn multipart_body(name: &str, file_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nquarterly\r\n");
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_and_download() {
    let output = tempfile::tempdir().unwrap();
    let xlsx = common::report_workbook().unwrap();

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(upload_request(multipart_body(UPLOAD_FIELD, "report.xlsx", &xlsx)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let file_url = body["fileUrl"].as_str().unwrap().to_string();
    assert!(output.path().join(&file_url).exists());

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(
            Request::builder()
                .uri(format!("/converted/{}", file_url))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let pdf = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_wrong_extension() {
    let output = tempfile::tempdir().unwrap();
    let xlsx = common::report_workbook().unwrap();

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(upload_request(multipart_body(UPLOAD_FIELD, "report.csv", &xlsx)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": MESSAGE_INVALID_TYPE})
    );
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_field() {
    let output = tempfile::tempdir().unwrap();

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(upload_request(multipart_body("otherFile", "report.xlsx", b"data")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"success": false, "message": MESSAGE_NO_FILE})
    );
}

#[tokio::test]
async fn test_not_multipart() {
    let output = tempfile::tempdir().unwrap();

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/convert")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], MESSAGE_NO_FILE);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let output = tempfile::tempdir().unwrap();
    let xlsx = common::report_workbook().unwrap();
    let limit = xlsx.len() / 2;

    let response = app(output.path(), limit)
        .oneshot(upload_request(multipart_body(UPLOAD_FIELD, "report.xlsx", &xlsx)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_conversion_failure() {
    let output = tempfile::tempdir().unwrap();

    let response = app(output.path(), 20 * 1024 * 1024)
        .oneshot(upload_request(multipart_body(
            UPLOAD_FIELD,
            "report.xlsx",
            b"not a workbook",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("conversion error: "));
}

#[tokio::test]
async fn test_other_methods_are_ignored() {
    let output = tempfile::tempdir().unwrap();

    for method in ["GET", "PUT", "DELETE"] {
        let response = app(output.path(), 20 * 1024 * 1024)
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/convert")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT, "{}", method);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_download_rejects_bad_names() {
    let output = tempfile::tempdir().unwrap();
    std::fs::write(output.path().join("secret.pdf"), b"%PDF-secret").unwrap();

    let response = app(output.path(), 1024)
        .oneshot(
            Request::builder()
                .uri("/converted/secret.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(output.path(), 1024)
        .oneshot(
            Request::builder()
                .uri("/converted/converted_missing.pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let output = tempfile::tempdir().unwrap();

    let response = app(output.path(), 1024)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
