//! xlsxpdf - Pure-Rust spreadsheet to PDF converter with an upload service
//!
//! This crate converts spreadsheets (XLSX, XLSM, XLSB, XLS, ODS) into paginated
//! PDF documents, and wraps the conversion in a small service layer that
//! validates uploads and reports a JSON result.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxpdf::ConverterBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a converter with default settings (A4 portrait)
//!     let converter = ConverterBuilder::new().build()?;
//!
//!     let input = File::open("example.xlsx")?;
//!     let output = File::create("converted.pdf")?;
//!
//!     // Convert Excel to PDF, returns the number of pages written
//!     let pages = converter.convert(input, output)?;
//!     println!("{} pages", pages);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Custom Page Setup
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxpdf::{ConverterBuilder, MergeStrategy, Orientation, PageSize, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = ConverterBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Summary".to_string()))
//!         .with_merge_strategy(MergeStrategy::DataDuplication)
//!         .with_page_size(PageSize::Letter)
//!         .with_orientation(Orientation::Landscape)
//!         .with_font_size(8)
//!         .build()?;
//!
//!     let input = File::open("example.xlsx")?;
//!     let output = File::create("summary.pdf")?;
//!     converter.convert(input, output)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # File to File
//!
//! `ConversionService` checks that the source exists and writes the target
//! atomically; a failed conversion never leaves a partial file behind.
//!
//! ```rust,no_run
//! use xlsxpdf::ConversionService;
//!
//! let service = ConversionService::default();
//! if let Err(e) = service.convert("example.xlsx", "converted.pdf") {
//!     eprintln!("{}", e);
//! }
//! ```
//!
//! # Uploads
//!
//! `UploadRequestHandler` validates an uploaded file, converts it into
//! `converted_<token>.pdf` and returns an `UploadResponse`. With the `server`
//! feature, [`server::router`] exposes it as `POST /convert`.

mod api;
mod builder;
mod config;
mod error;
mod formatter;
mod grid;
mod parser;
mod render;
mod security;
mod service;
mod types;
mod upload;

#[cfg(feature = "server")]
pub mod server;

// 公開API
pub use api::{DateFormat, FormulaMode, MergeStrategy, Orientation, PageSize, SheetSelector};
pub use builder::{Converter, ConverterBuilder};
pub use config::ServerConfig;
pub use error::{ConversionError, XlsxToPdfError};
pub use security::validate_output_name;
pub use service::{ConversionService, DocumentConverter};
pub use upload::{
    FailureKind, TokenSource, UploadMethod, UploadRequest, UploadRequestHandler, UploadResponse,
    UploadedFile, DEFAULT_EXTENSION, MESSAGE_INVALID_TYPE, MESSAGE_NO_FILE,
};
