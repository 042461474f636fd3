//! Benchmark harness for the formula pipeline.
//!
//! Uses criterion for reliable benchmarking.
//! Run with: cargo bench -p fxl_engine

use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fxl_binder::{Binder, Variable};
use fxl_engine::Engine;
use fxl_parser::{parse_formula, ParseOptions};
use fxl_types::DType;

const SMALL_FORMULA: &str = "price * qty + 1";

const MEDIUM_FORMULA: &str = r#"If(
    CountIf(Items, Quantity > 5) > 0,
    $"Total {Sum(Items, Quantity * price)} for {CountRows(Items)} items",
    Concatenate("none", " ", Text(qty))
)"#;

fn engine() -> Engine {
    let mut engine = Engine::default();
    let items = "*[cr_qty:n, cr_name:s]".parse::<DType>().unwrap();
    let items = match items {
        DType::Table(row) => {
            let mut names = fxl_types::DisplayNameMap::new();
            names.insert("cr_qty".into(), "Quantity".into());
            DType::Table(row.with_display_names(names))
        }
        other => other,
    };
    engine.declare(Variable::new("price", DType::Number)).unwrap();
    engine.declare(Variable::new("qty", DType::Decimal)).unwrap();
    engine
        .declare(Variable::new("cr_items", items).with_display_name("Items"))
        .unwrap();
    engine
}

/// A document of `n` formulas, each reading the one declared after it.
fn generate_document(n: usize) -> String {
    let mut doc = String::new();
    for i in 0..n {
        if i + 1 < n {
            doc.push_str(&format!("f{} = f{} + price;\n", i, i + 1));
        } else {
            doc.push_str(&format!("f{} = qty * 2;\n", i));
        }
    }
    doc
}

// ============================================================================
// Stages
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_medium", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let parsed = parse_formula(&arena, black_box(MEDIUM_FORMULA), ParseOptions::default());
            black_box(parsed.node_count);
        });
    });
}

fn bench_bind(c: &mut Criterion) {
    let engine = engine();
    let arena = Bump::new();
    let parsed = parse_formula(&arena, MEDIUM_FORMULA, ParseOptions::default());
    c.bench_function("bind_medium", |b| {
        b.iter(|| {
            let binder = Binder::new(engine.graph(), Some(engine.global_scope()), engine.enums());
            let tree = binder.bind(parsed.root, parsed.node_count, None).unwrap();
            black_box(tree.result_type());
        });
    });
}

fn bench_check(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("check");
    group.bench_function("small", |b| b.iter(|| engine.check(black_box(SMALL_FORMULA))));
    group.bench_function("medium", |b| b.iter(|| engine.check(black_box(MEDIUM_FORMULA))));
    let batch = vec![MEDIUM_FORMULA; 64];
    group.bench_function("many_medium", |b| b.iter(|| engine.check_many(black_box(&batch))));
    group.finish();
}

// ============================================================================
// Scaling Benchmarks
// ============================================================================

fn bench_definitions(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("definitions");
    for size in [10, 50, 100, 200] {
        let source = generate_document(size);
        group.bench_with_input(BenchmarkId::new("chain", size), &source, |b, source| {
            b.iter(|| engine.definitions(black_box(source)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_bind, bench_check, bench_definitions);
criterion_main!(benches);
