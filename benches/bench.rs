//! Criterion benchmarks for the Colloquy response engine.
//!
//! Covers the hot paths of a chat session:
//! - Tokenization and vectorization
//! - Random forest training over a growing exemplar store
//! - Tiered resolution

use colloquy::analysis::{NormalizingTokenizer, Tokenizer};
use colloquy::chat::ChatEngine;
use colloquy::config::EngineConfig;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Generate synthetic (input, response) pairs.
fn generate_exemplars(count: usize) -> Vec<(String, String)> {
    let words = [
        "laptop", "phone", "store", "price", "discount", "warranty", "return", "policy",
        "gaming", "business", "charger", "case", "screen", "battery", "delivery", "order",
        "refund", "exchange", "opening", "hours",
    ];

    (0..count)
        .map(|i| {
            let input = (0..3)
                .map(|j| words[(i * 7 + j * 13) % words.len()]) // Pseudo-random distribution
                .collect::<Vec<_>>()
                .join(" ");
            let input = format!("{input} {i}");
            let response = format!("Canned answer number {}", i % 10);
            (input, response)
        })
        .collect()
}

/// Benchmark text analysis.
fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");

    let tokenizer = NormalizingTokenizer::new().unwrap();
    let text = "Do you have a GAMING laptop with a 1-year warranty? What's the return policy?";

    group.bench_function("tokenize_utterance", |b| {
        b.iter(|| {
            let tokens: Vec<_> = tokenizer.tokenize(black_box(text)).unwrap().collect();
            black_box(tokens)
        })
    });

    group.bench_function("normalize_utterance", |b| {
        b.iter(|| black_box(tokenizer.normalize(black_box(text))))
    });

    group.finish();
}

/// Benchmark retraining as the exemplar store grows.
fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(20);

    for size in [15, 100, 500] {
        let exemplars = generate_exemplars(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("seed_engine", size), &exemplars, |b, seed| {
            b.iter(|| {
                let engine = ChatEngine::new(EngineConfig::default(), black_box(seed)).unwrap();
                black_box(engine)
            })
        });
    }

    let engine = ChatEngine::new(EngineConfig::default(), &generate_exemplars(100)).unwrap();
    let mut counter = 0usize;
    group.bench_function("add_exemplar_retrain", |b| {
        b.iter(|| {
            counter += 1;
            let outcome = engine
                .add_exemplar(&format!("new question {counter}"), "A brand new answer")
                .unwrap();
            black_box(outcome)
        })
    });

    group.finish();
}

/// Benchmark tiered resolution.
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let engine = ChatEngine::storefront().unwrap();
    let queries = [
        ("exact", "return policy"),
        ("classifier", "do you sell a gaming laptop?"),
        ("substring", "helpdesk"),
        ("fallback", "xyz123"),
    ];

    for (name, query) in queries {
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.resolve(black_box(query))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_training, bench_resolution);
criterion_main!(benches);
