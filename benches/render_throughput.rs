//! Report assembly throughput benchmarks
//!
//! Measures the full assembly flow with varying:
//! - Repeated-section row counts (1, 10, 100)
//! - Batch executors (sync, rayon)
//!
//! Run benchmarks: `cargo bench --bench render_throughput`
//!
//! Compare specific groups:
//! ```
//! cargo bench --bench render_throughput -- "rows"
//! cargo bench --bench render_throughput -- "batch"
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::io::{Cursor, Write};
use valuer::{
    AssemblyRequest, DataSource, ExecutorImpl, InMemoryConfigStore, RayonExecutor, ReportAssembler, SyncExecutor,
    TemplateInput,
};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const SCHEMA_KEY: &str = "schema.json";
const TEMPLATE_KEY: &str = "template.docx";

fn schema() -> Value {
    json!({
        "ownerName": { "label": "Owner", "placeholder": "ownerName" },
        "address": { "label": "Address", "placeholder": "address" },
        "comparableSales": [
            {
                "address": { "placeholder": "comp_address" },
                "price": { "placeholder": "comp_price", "type": "number" }
            }
        ]
    })
}

/// A template with one paragraph per comparable row.
fn template(rows: usize) -> Vec<u8> {
    let mut body = String::from("<w:p><w:r><w:t>Owner: [ownerName], [address]</w:t></w:r></w:p>");
    for row in 1..=rows {
        body.push_str(&format!(
            "<w:p><w:r><w:t>{row}. [comp_address_{row}]</w:t></w:r><w:r><w:t> sold for [comp_price_{row}]</w:t></w:r></w:p>"
        ));
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .expect("start part");
    writer.write_all(document.as_bytes()).expect("write part");
    writer.finish().expect("finish package").into_inner()
}

fn draft(rows: usize) -> DataSource {
    let sales: Vec<Value> = (0..rows)
        .map(|i| json!({ "address": format!("{i} Elm St"), "price": 500_000 + i * 1_000 }))
        .collect();
    DataSource::draft(json!({ "ownerName": "Jane Doe", "address": "1 Main St", "comparableSales": sales }))
}

fn store(rows: usize) -> InMemoryConfigStore {
    let store = InMemoryConfigStore::new();
    store.add_json(SCHEMA_KEY, &schema()).expect("add schema");
    store.add(TEMPLATE_KEY, template(rows)).expect("add template");
    store
}

fn request(rows: usize) -> AssemblyRequest {
    AssemblyRequest::new(SCHEMA_KEY, TemplateInput::Key(TEMPLATE_KEY.to_string())).with_source(draft(rows))
}

/// Single-request latency as the repeated section grows
fn benchmark_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows");

    for rows in [1, 10, 100] {
        group.throughput(Throughput::Elements(rows as u64));
        let assembler = ReportAssembler::builder().with_store(store(rows)).build();

        group.bench_with_input(BenchmarkId::new("assemble", rows), &rows, |b, &rows| {
            b.iter(|| assembler.assemble(request(rows)).expect("assembly failed"));
        });
    }

    group.finish();
}

/// Batch throughput per executor
fn benchmark_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let batch = 32;
    group.throughput(Throughput::Elements(batch as u64));

    let executors = [
        ("sync", ExecutorImpl::Sync(SyncExecutor::new())),
        ("rayon", ExecutorImpl::Rayon(RayonExecutor::new())),
    ];
    for (name, executor) in executors {
        let assembler = ReportAssembler::builder()
            .with_store(store(10))
            .with_executor(executor)
            .build();

        group.bench_function(BenchmarkId::new(name, batch), |b| {
            b.iter(|| {
                let requests = (0..batch).map(|_| request(10)).collect();
                assembler.assemble_all(requests)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rows, benchmark_batch);
criterion_main!(benches);
