use chatviz_core::engine::{resolve_boundary, substitute};
use criterion::{criterion_group, criterion_main, Criterion};
use polars::prelude::*;

fn bench_frame() -> DataFrame {
    let types: Vec<String> = (0..1_000).map(|i| format!("T{}", i % 10)).collect();
    let amounts: Vec<i64> = (0..1_000).map(|i| (i * 7) % 250).collect();
    df!(
        "Type" => types,
        "Amount" => amounts,
    )
    .expect("Failed to create DataFrame")
}

fn spec_with_expressions(count: usize) -> String {
    let mut spec = String::from("{\"series\": [");
    for i in 0..count {
        if i > 0 {
            spec.push_str(", ");
        }
        spec.push_str(concat!(
            r#"{"type": "bar", "data": "#,
            r#"df.groupby("Type")["Amount"].sum().values.tolist()}"#
        ));
    }
    spec.push_str("]}");
    spec
}

fn benchmark_substitution_pass(c: &mut Criterion) {
    let frame = bench_frame();
    let spec = spec_with_expressions(8);

    c.bench_function("substitution_pass_8_expressions", |b| {
        b.iter(|| substitute(&spec, &frame).expect("pass must not abort"))
    });
}

fn benchmark_boundary_resolution(c: &mut Criterion) {
    // Resolution cost is linear in the span length, independent of data.
    let input = format!(
        "{}{}",
        r#"df[df["Type"] == "needle ]) escape"].groupby("Type")["Amount"]"#,
        ".sum().values.tolist()"
    );

    c.bench_function("boundary_resolution_nested_span", |b| {
        b.iter(|| resolve_boundary(&input, 0))
    });
}

criterion_group!(
    benches,
    benchmark_substitution_pass,
    benchmark_boundary_resolution
);
criterion_main!(benches);
