use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use qbank_core::model::{AnswerKey, McqOptions, McqQuestion, Question, QuestionBody};
use qbank_core::sampler::assemble;
use qbank_core::validator::{validate, Deduplicator};

fn pool(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            Question::new(
                "VOCABULARY",
                None,
                QuestionBody::Mcq(McqQuestion {
                    question: format!("Pick the synonym of word {i}"),
                    options: McqOptions {
                        a: "one".into(),
                        b: "two".into(),
                        c: "three".into(),
                        d: "four".into(),
                    },
                    answer: AnswerKey::A,
                }),
            )
        })
        .collect()
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    let mut rng = StdRng::seed_from_u64(99);

    for size in [100usize, 1_000, 10_000] {
        let questions = pool(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &questions, |b, q| {
            b.iter(|| assemble(black_box(q.clone()), 25, &mut rng))
        });
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");
    let existing = pool(5_000);

    group.bench_function("seed_5000", |b| {
        b.iter(|| Deduplicator::with_existing(black_box(&existing)))
    });

    group.bench_function("validate_empty_batch_5000", |b| {
        b.iter(|| validate(Vec::new(), black_box(&existing)))
    });

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_dedup);
criterion_main!(benches);
