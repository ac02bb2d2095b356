use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use evs_pipeline::config::load_config;
use evs_pipeline::{CsvSink, EventRow, MemorySink, PipelineBuilder, TableService};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join(relative)
}

fn replicated_rows(copies: u32) -> Vec<EventRow> {
    let source = std::fs::read_to_string(fixture_path("fixtures/events/sim.jsonl"))
        .expect("fixture events");
    let template: Vec<EventRow> = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("event row"))
        .collect();
    let mut rows = Vec::with_capacity(template.len() * copies as usize);
    for copy in 0..copies {
        for row in &template {
            let mut row = row.clone();
            row.event += copy * 10_000;
            rows.push(row);
        }
    }
    rows
}

fn bench_pipeline(c: &mut Criterion) {
    let config = load_config(fixture_path("fixtures/runs/nominal.yaml")).expect("config");
    let rows = replicated_rows(200);

    c.bench_function("pipeline_memory_sink", |b| {
        b.iter_batched(
            || rows.clone(),
            |rows| {
                let mut pipeline = PipelineBuilder::new()
                    .analysis(config.analysis.build())
                    .config(config.clone())
                    .service(Box::new(TableService::from_rows(rows)))
                    .sink(Box::new(MemorySink::new()))
                    .build()
                    .expect("pipeline");
                pipeline.run().expect("run")
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("pipeline_csv_sink", |b| {
        b.iter_batched(
            || rows.clone(),
            |rows| {
                let mut pipeline = PipelineBuilder::new()
                    .analysis(config.analysis.build())
                    .config(config.clone())
                    .service(Box::new(TableService::from_rows(rows)))
                    .sink(Box::new(CsvSink::new(Vec::new())))
                    .build()
                    .expect("pipeline");
                pipeline.run().expect("run")
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
