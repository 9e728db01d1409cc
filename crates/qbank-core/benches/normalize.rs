use criterion::{black_box, criterion_group, criterion_main, Criterion};

use qbank_core::decoder::{decode, TabularFormat};
use qbank_core::model::QuestionType;
use qbank_core::normalizer::normalize;

fn mcq_csv(rows: usize) -> Vec<u8> {
    let mut s = String::from("Question,A,B,C,D,Answer\n");
    for i in 0..rows {
        s.push_str(&format!(
            "What is {i} + {i}?,{},{},{},{},B\n",
            i,
            i * 2,
            i * 3,
            i * 4
        ));
    }
    s.into_bytes()
}

fn coding_csv(rows: usize, cases: usize) -> Vec<u8> {
    let mut s = String::from("QuestionTitle,ProblemStatement,Language");
    for n in 1..=cases {
        s.push_str(&format!(
            ",TestCase{n}Input,TestCase{n}Output,TestCase{n}Points,TestCase{n}IsSample"
        ));
    }
    s.push('\n');
    for i in 0..rows {
        s.push_str(&format!("Problem {i},Print the input,python"));
        for n in 1..=cases {
            s.push_str(&format!(",{n},{n},2,{}", n == 1));
        }
        s.push('\n');
    }
    s.into_bytes()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_csv");

    let small = mcq_csv(10);
    let large = mcq_csv(1_000);

    group.bench_function("10_rows", |b| {
        b.iter(|| decode(black_box(&small), TabularFormat::Csv))
    });

    group.bench_function("1000_rows", |b| {
        b.iter(|| decode(black_box(&large), TabularFormat::Csv))
    });

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let mcq_rows = decode(&mcq_csv(1_000), TabularFormat::Csv).unwrap_or_default();
    let coding_rows = decode(&coding_csv(200, 10), TabularFormat::Csv).unwrap_or_default();

    group.bench_function("mcq_1000_rows", |b| {
        b.iter(|| normalize(black_box(&mcq_rows), QuestionType::Mcq))
    });

    group.bench_function("coding_200_rows_10_cases", |b| {
        b.iter(|| normalize(black_box(&coding_rows), QuestionType::Compiler))
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_normalize);
criterion_main!(benches);
