use criterion::{black_box, criterion_group, criterion_main, Criterion};
use formulon::Evaluator;

fn bench_compile_and_evaluate(c: &mut Criterion) {
    let eval = Evaluator::new();
    let expr = "IF(ABS(-5) > 2 and 1 < 2, ROUND(2.345, 2) * 100%, 2^3^2)";

    c.bench_function("compile", |b| {
        b.iter(|| {
            let _ = eval.compile(black_box(expr));
        })
    });

    c.bench_function("evaluate", |b| {
        b.iter(|| {
            let _ = eval.evaluate(black_box(expr));
        })
    });

    let program = eval.compile(expr).unwrap();
    c.bench_function("run_precompiled", |b| {
        b.iter(|| {
            let _ = eval.run(black_box(&program));
        })
    });
}

criterion_group!(benches, bench_compile_and_evaluate);
criterion_main!(benches);
