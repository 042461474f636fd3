use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fxl_parser::{parse_document, parse_formula, ParseOptions};

const FORMULA: &str = r#"If(
    CountIf(Orders, Quantity > 10 And Status = "Open") > 0,
    $"{First(Filter(Orders, Region = "West")).Customer} has {Sum(Orders, Price * Quantity)} pending",
    Concatenate("none: ", Text(Now()))
)"#;

const DOCUMENT: &str = r#"
Rate = 0.07;
Subtotal = Sum(Orders, Price * Quantity);
Tax = Subtotal * Rate;
Total = Subtotal + Tax;
Label(x: Number): Text = $"Total: {x}";
Greeting = Label(Total);
"#;

fn bench_parse_formula(c: &mut Criterion) {
    c.bench_function("parse_formula", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let parsed = parse_formula(&arena, black_box(FORMULA), ParseOptions::default());
            black_box(parsed.node_count);
        });
    });
}

fn bench_parse_document(c: &mut Criterion) {
    c.bench_function("parse_document", |b| {
        b.iter(|| {
            let arena = Bump::new();
            let parsed = parse_document(&arena, black_box(DOCUMENT));
            black_box(parsed.document.items.len());
        });
    });
}

criterion_group!(benches, bench_parse_formula, bench_parse_document);
criterion_main!(benches);
