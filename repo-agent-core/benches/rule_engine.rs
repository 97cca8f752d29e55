use criterion::{Criterion, black_box, criterion_group, criterion_main};
use repo_agent_core::monitor::DiffEngine;
use repo_agent_core::rules::{RuleEngine, RuleSet};
use std::path::Path;

fn python_module(functions: usize) -> String {
    let mut source = String::from("import os\nimport json\nfrom collections import defaultdict\n\n");
    for i in 0..functions {
        source.push_str(&format!("def handler_{}(event):\n", i));
        for j in 0..12 {
            source.push_str(&format!("    value_{} = event.get('key_{}')\n", j, j));
        }
        source.push_str("    return None\n\n");
    }
    source
}

fn bench_rule_engine(c: &mut Criterion) {
    let engine = RuleEngine::new(RuleSet::default());
    let small = python_module(5);
    let large = python_module(60);

    c.bench_function("evaluate_python_small", |b| {
        b.iter(|| engine.evaluate(black_box(Path::new("/bench/small.py")), black_box(&small)));
    });

    c.bench_function("evaluate_python_large", |b| {
        b.iter(|| engine.evaluate(black_box(Path::new("/bench/large.py")), black_box(&large)));
    });

    c.bench_function("evaluate_unanalyzed_language", |b| {
        b.iter(|| engine.evaluate(black_box(Path::new("/bench/large.go")), black_box(&large)));
    });
}

fn bench_diff(c: &mut Criterion) {
    let engine = DiffEngine::new();
    let old = python_module(40);
    let new = old.replacen("return None", "return event", 5);

    c.bench_function("diff_scattered_edits", |b| {
        b.iter(|| engine.diff(black_box(&old), black_box(&new)));
    });

    c.bench_function("diff_identical", |b| {
        b.iter(|| engine.diff(black_box(&old), black_box(&old)));
    });
}

criterion_group!(benches, bench_rule_engine, bench_diff);
criterion_main!(benches);
