//! Benchmarks for atom encoding and split encoding.
//!
//! Uses a synthetic vocabulary built from word prefixes of the sample text, so
//! no vocabulary file is needed.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use splitbpe::{encode_atom, Rank, Tokenizer, Vocabulary};

const SAMPLE: &str = "The quick brown fox jumps over the lazy dog. Rust is a systems \
programming language that runs blazingly fast, prevents segfaults, and guarantees \
thread safety. Tokenizers split text into atoms, then merge byte pairs by rank.";

/// Bytes 0-255, then every prefix (length >= 2) of every word, with and
/// without a leading space.
fn sample_vocab() -> Vocabulary {
    let mut tokens: Vec<Vec<u8>> = (0u8..=255).map(|b| vec![b]).collect();
    let mut seen = std::collections::HashSet::new();
    for word in SAMPLE.split_whitespace().chain(["nondifferentiable"]) {
        for spaced in [word.to_string(), format!(" {}", word)] {
            let bytes = spaced.as_bytes();
            for end in 2..=bytes.len() {
                if seen.insert(bytes[..end].to_vec()) {
                    tokens.push(bytes[..end].to_vec());
                }
            }
        }
    }
    Vocabulary::new(tokens).unwrap()
}

fn bench_encode_atom(c: &mut Criterion) {
    let vocab = sample_vocab();
    let mut group = c.benchmark_group("encode_atom");

    for atom in ["the", "nondifferentiable", "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"] {
        group.throughput(Throughput::Bytes(atom.len() as u64));
        let mut out: Vec<Rank> = vec![0; atom.len()];
        group.bench_with_input(BenchmarkId::from_parameter(atom.len()), atom, |b, atom| {
            b.iter(|| encode_atom(&vocab, black_box(atom.as_bytes()), &mut out).unwrap())
        });
    }

    group.finish();
}

fn bench_encode_splitting(c: &mut Criterion) {
    let tokenizer = Tokenizer::new(sample_vocab()).unwrap();
    let mut group = c.benchmark_group("encode_splitting");

    for repeat in [1, 16] {
        let text = SAMPLE.repeat(repeat);
        group.throughput(Throughput::Bytes(text.len() as u64));
        let mut out: Vec<Rank> = vec![0; text.len()];
        group.bench_with_input(BenchmarkId::new("cl100k", text.len()), &text, |b, text| {
            b.iter(|| tokenizer.encode(black_box(text.as_bytes()), &mut out).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_atom, bench_encode_splitting);
criterion_main!(benches);
