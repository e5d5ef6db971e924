//! Batch CLI for xlsxpdf.
//!
//! Converts one spreadsheet file into one PDF file. A missing input exits with
//! code 2 without creating any output; a failed conversion or an invalid option
//! exits with code 1.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use xlsxpdf::{ConversionService, ConverterBuilder, Orientation, PageSize, SheetSelector};

/// Convert a spreadsheet to PDF.
#[derive(Parser, Debug)]
#[command(name = "xlsxpdf", version, about = "Convert a spreadsheet (xlsx, xls, ods) to PDF")]
struct Cli {
    /// Spreadsheet to convert
    #[arg(default_value = "example.xlsx")]
    input: PathBuf,

    /// PDF file to write (created or overwritten)
    #[arg(default_value = "converted.pdf")]
    output: PathBuf,

    /// Paper size: a4, a3, letter or legal
    #[arg(long, default_value = "a4", value_parser = parse_page_size)]
    page_size: PageSize,

    /// Landscape pages
    #[arg(long)]
    landscape: bool,

    /// Convert only the named sheet (repeatable)
    #[arg(long = "sheet-name", value_name = "NAME")]
    sheet_names: Vec<String>,

    /// Include hidden sheets, rows and columns
    #[arg(long)]
    include_hidden: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_page_size(name: &str) -> Result<PageSize, String> {
    PageSize::from_name(name).ok_or_else(|| format!("unknown page size '{}'", name))
}

fn main() -> ExitCode {
    // Usage errors exit with 1; 2 means the input is missing.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let service = match build_service(&cli) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(1);
        }
    };

    match service.convert(&cli.input, &cli.output) {
        Ok(path) => {
            info!(output = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_precondition() => {
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn build_service(cli: &Cli) -> Result<ConversionService> {
    let orientation = if cli.landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };

    let selector = match cli.sheet_names.as_slice() {
        [] => SheetSelector::All,
        [name] => SheetSelector::Name(name.clone()),
        names => SheetSelector::Names(names.to_vec()),
    };

    let converter = ConverterBuilder::new()
        .with_page_size(cli.page_size)
        .with_orientation(orientation)
        .with_sheet_selector(selector)
        .include_hidden(cli.include_hidden)
        .build()
        .context("invalid conversion options")?;

    Ok(ConversionService::new(converter))
}
