//! Criterion benchmarks for the health orchestration engine.
//!
//! Measures cyclomatic-complexity analysis on synthetic Go projects of
//! varying sizes, and end-to-end [`Engine::execute`] over a single
//! synthetic repository with the built-in checker set.

use std::fs;
use std::path::Path;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use repohealth_engine::analyzers::{Analyzer, GoAnalyzer};
use repohealth_engine::config::Config;
use repohealth_engine::engine::{Engine, RunHandle};
use repohealth_engine::platform::RealFileSystem;
use repohealth_engine::types::{Language, Repository};
use tempfile::TempDir;

/// One function per unit of `function_count`, each with a handful of
/// branches so the scanner has real complexity to walk.
fn synthetic_go_function(index: usize) -> String {
    format!(
        "func handler{index}(x int) int {{\n\
         \tif x > 0 {{\n\
         \t\tfor i := 0; i < x; i++ {{\n\
         \t\t\tif i%2 == 0 {{\n\
         \t\t\t\tx += i\n\
         \t\t\t}} else if i%3 == 0 {{\n\
         \t\t\t\tx -= i\n\
         \t\t\t}}\n\
         \t\t}}\n\
         \t}} else {{\n\
         \t\tx = -x\n\
         \t}}\n\
         \treturn x\n\
         }}\n\n"
    )
}

fn write_synthetic_go_project(function_count: usize) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let mut source = String::from("package main\n\n");
    for i in 0..function_count {
        source.push_str(&synthetic_go_function(i));
    }
    fs::write(dir.path().join("main.go"), source).expect("write synthetic source");
    dir
}

fn bench_go_complexity_analysis(c: &mut Criterion) {
    let fs_impl = RealFileSystem;
    let mut group = c.benchmark_group("go_complexity_analysis");
    for &function_count in &[50usize, 200, 1000] {
        let dir = write_synthetic_go_project(function_count);
        let analyzer = GoAnalyzer;
        group.bench_with_input(
            BenchmarkId::from_parameter(function_count),
            &function_count,
            |b, _| {
                b.iter(|| {
                    std::hint::black_box(analyzer.analyze_complexity(&fs_impl, dir.path()).unwrap())
                });
            },
        );
    }
    group.finish();
}

fn synthetic_repository(path: &Path) -> Repository {
    Repository {
        name: "synthetic".to_owned(),
        url: "https://example.com/synthetic.git".to_owned(),
        branch: None,
        path: Some(path.display().to_string()),
        tags: vec![],
        language: Some(Language::Go),
    }
}

fn bench_engine_execute_single_repository(c: &mut Criterion) {
    let dir = write_synthetic_go_project(200);
    fs::write(dir.path().join("README.md"), "# synthetic\n\n## Installation\n\ngo get\n\n## Usage\n\nrun it\n")
        .expect("write readme");
    fs::write(dir.path().join("LICENSE"), "MIT License").expect("write license");

    let config = Config::defaults();
    let engine = Engine::new(&config);
    let repository = synthetic_repository(dir.path());

    c.bench_function("engine_execute_single_repository", |b| {
        b.iter(|| {
            let handle = RunHandle::new();
            std::hint::black_box(engine.execute(&config, std::slice::from_ref(&repository), &handle))
        });
    });
}

criterion_group!(benches, bench_go_complexity_analysis, bench_engine_execute_single_repository);
criterion_main!(benches);
