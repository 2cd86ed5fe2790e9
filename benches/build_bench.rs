//! Graph construction and traversal benchmarks
//!
//! Run with: cargo bench --bench build_bench

use codekg::{BuildOptions, GraphBuilder, KgStorage};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::fs;
use tempfile::TempDir;

const FILES: usize = 200;

/// One interface plus `FILES` Go files, each with an implementing struct
/// that embeds the previous one.
fn synthetic_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let base = "package p\n\ntype Base interface {\n\tRun()\n}\n";
    fs::write(dir.path().join("base.go"), base).unwrap();
    for i in 0..FILES {
        let embed = if i == 0 { "Base".to_string() } else { format!("Svc{}", i - 1) };
        let source = format!(
            "package p\n\n// Svc{i} is generated.\ntype Svc{i} struct {{\n\t{embed}\n\tRepo Base\n}}\n\n\
             func NewSvc{i}(b Base) *Svc{i} {{ return nil }}\n\nfunc (s *Svc{i}) Run() {{}}\n",
            i = i,
            embed = embed
        );
        fs::write(dir.path().join(format!("svc_{:04}.go", i)), source).unwrap();
    }
    dir
}

fn benchmark_build(c: &mut Criterion) {
    let dir = synthetic_tree();
    let mut group = c.benchmark_group("build");
    group.throughput(Throughput::Elements(FILES as u64 + 1));
    group.sample_size(20);

    for threads in [1, 4] {
        group.bench_function(format!("threads_{}", threads), |b| {
            let options = BuildOptions {
                threads,
                ..BuildOptions::default()
            };
            let builder = GraphBuilder::new(options);
            b.iter(|| black_box(builder.build(dir.path()).unwrap()));
        });
    }
    group.finish();
}

fn benchmark_traversal(c: &mut Criterion) {
    let dir = synthetic_tree();
    let result = GraphBuilder::new(BuildOptions::default()).build(dir.path()).unwrap();
    let storage = KgStorage::from_graph(result.graph);
    let last = format!("Svc{}", FILES - 1);

    c.bench_function("successors_depth_10", |b| {
        b.iter(|| black_box(storage.get_successors(black_box(&last), 10)))
    });
    c.bench_function("predecessors_all", |b| {
        b.iter(|| black_box(storage.get_predecessors(black_box("Base"), FILES)))
    });
    c.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let json = storage.to_json().unwrap();
            black_box(KgStorage::from_json(&json).unwrap())
        })
    });
}

criterion_group!(benches, benchmark_build, benchmark_traversal);
criterion_main!(benches);
