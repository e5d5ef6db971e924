//! Upload Request Handler Tests
//!
//! 実際の変換器を使った`UploadRequestHandler`の統合テスト。

mod common;

use std::fs;
use std::path::Path;

use lopdf::Document;
use serde_json::json;
use xlsxpdf::{
    FailureKind, UploadMethod, UploadRequest, UploadRequestHandler, UploadResponse, UploadedFile,
    MESSAGE_INVALID_TYPE, MESSAGE_NO_FILE,
};

fn pdf_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".pdf"))
        .collect()
}

#[test]
fn test_upload_xlsx_succeeds() {
    let uploads = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let temp_path = common::write_report(uploads.path(), "upload_tmp_1");

    let handler = UploadRequestHandler::new(output.path());
    let request = UploadRequest::post(Some(UploadedFile::new(temp_path, "report.xlsx")));
    let response = handler.handle(request).unwrap();

    let UploadResponse::Success { file_url } = &response else {
        panic!("unexpected response: {:?}", response);
    };
    assert!(file_url.starts_with("converted_"));
    assert!(file_url.ends_with(".pdf"));
    assert!(xlsxpdf::validate_output_name(file_url).is_ok());

    let pdf = fs::read(output.path().join(file_url)).unwrap();
    assert!(Document::load_mem(&pdf).is_ok());

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": true, "fileUrl": file_url})
    );
}

#[test]
fn test_upload_csv_is_rejected() {
    let uploads = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let temp_path = common::write_report(uploads.path(), "upload_tmp_2");

    let handler = UploadRequestHandler::new(output.path());
    let request = UploadRequest::post(Some(UploadedFile::new(temp_path, "report.csv")));
    let response = handler.handle(request).unwrap();

    assert_eq!(response.failure_kind(), Some(FailureKind::Validation));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"success": false, "message": MESSAGE_INVALID_TYPE})
    );
    assert!(pdf_files(output.path()).is_empty());
}

#[test]
fn test_no_file_field() {
    let output = tempfile::tempdir().unwrap();
    let handler = UploadRequestHandler::new(output.path());

    let response = handler.handle(UploadRequest::post(None)).unwrap();

    assert_eq!(
        serde_json::to_string(&response).unwrap(),
        format!(r#"{{"success":false,"message":"{}"}}"#, MESSAGE_NO_FILE)
    );
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test]
fn test_non_post_is_ignored() {
    let uploads = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let temp_path = common::write_report(uploads.path(), "upload_tmp_3");

    let handler = UploadRequestHandler::new(output.path());
    let request = UploadRequest {
        method: UploadMethod::from_name("GET"),
        file: Some(UploadedFile::new(temp_path, "report.xlsx")),
    };

    assert!(handler.handle(request).is_none());
    assert!(pdf_files(output.path()).is_empty());
}

#[test]
fn test_corrupt_xlsx_reports_conversion_error() {
    let uploads = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let temp_path = uploads.path().join("upload_tmp_4");
    fs::write(&temp_path, b"this is not a spreadsheet").unwrap();

    let handler = UploadRequestHandler::new(output.path()).with_token_source(|| "t1".to_string());
    let request = UploadRequest::post(Some(UploadedFile::new(temp_path, "report.xlsx")));
    let response = handler.handle(request).unwrap();

    match response {
        UploadResponse::Failure { kind, message } => {
            assert_eq!(kind, FailureKind::Conversion);
            assert!(message.starts_with("conversion error: "));
        }
        other => panic!("unexpected response: {:?}", other),
    }
    assert!(!output.path().join("converted_t1.pdf").exists());
}

#[test]
fn test_concurrent_uploads_get_distinct_outputs() {
    let uploads = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let handler = UploadRequestHandler::new(output.path());

    let responses: Vec<UploadResponse> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let temp_path = common::write_report(uploads.path(), &format!("upload_{}", i));
                let handler = &handler;
                scope.spawn(move || {
                    handler
                        .handle(UploadRequest::post(Some(UploadedFile::new(
                            temp_path,
                            "report.xlsx",
                        ))))
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(responses.iter().all(UploadResponse::is_success));
    assert_eq!(pdf_files(output.path()).len(), 4);
}
