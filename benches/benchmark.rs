//! パフォーマンスベンチマーク
//!
//! xlsxpdfクレートの変換速度を測定します。フィクスチャは`rust_xlsxwriter`で
//! メモリ上に生成するため、事前準備は不要です。
//!
//! - 小さな表（100行）
//! - 長い表（5,000行、行方向のページ分割）
//! - 横に長い表（60列、列帯への分割）
//! - 複数シート（8シート、シート単位の並列処理）

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::io::Cursor;
use xlsxpdf::ConverterBuilder;

/// `sheets`枚のシートに`rows`行×`cols`列の表を持つワークブックを生成
fn generate_workbook(sheets: usize, rows: u32, cols: u16) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    for sheet in 0..sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(format!("Sheet{}", sheet + 1))?;

        for col in 0..cols {
            worksheet.write_string(0, col, format!("Column {}", col + 1))?;
        }
        for row in 1..rows {
            for col in 0..cols {
                if col % 2 == 0 {
                    worksheet.write_string(row, col, format!("R{}C{}", row, col))?;
                } else {
                    worksheet.write_number(row, col, row as f64 * 1.25 + col as f64)?;
                }
            }
        }
    }
    workbook.save_to_buffer()
}

fn bench_convert(c: &mut Criterion, group_name: &str, data: &[u8], sample_size: usize) {
    let converter = ConverterBuilder::new().build().unwrap();

    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.sample_size(sample_size);

    group.bench_function("convert", |b| {
        b.iter(|| {
            let input = Cursor::new(black_box(data));
            let mut output = Vec::new();
            converter
                .convert(black_box(input), black_box(&mut output))
                .unwrap();
            black_box(output)
        });
    });

    group.finish();
}

fn benchmark_small_table(c: &mut Criterion) {
    let data = generate_workbook(1, 100, 6).unwrap();
    bench_convert(c, "small_table", &data, 50);
}

fn benchmark_long_table(c: &mut Criterion) {
    let data = generate_workbook(1, 5_000, 6).unwrap();
    bench_convert(c, "long_table", &data, 10);
}

fn benchmark_wide_table(c: &mut Criterion) {
    let data = generate_workbook(1, 200, 60).unwrap();
    bench_convert(c, "wide_table", &data, 10);
}

fn benchmark_multi_sheet(c: &mut Criterion) {
    let data = generate_workbook(8, 500, 6).unwrap();
    bench_convert(c, "multi_sheet", &data, 10);
}

criterion_group!(
    benches,
    benchmark_small_table,
    benchmark_long_table,
    benchmark_wide_table,
    benchmark_multi_sheet
);
criterion_main!(benches);
