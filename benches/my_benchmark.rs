#![allow(missing_docs)]
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use univcodes::elias_gamma::{EliasGammaReader, EliasGammaWriter};
use univcodes::fibonacci::{FibonacciCodec, FibonacciReader, FibonacciWriter};
use univcodes::thompson_alpha::{ThompsonAlphaReader, ThompsonAlphaWriter};
use univcodes::vlq::{VlqReader, VlqWriter};
use univcodes::{UnsignedReader, UnsignedWriter};

fn random_data(n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(23);
    (0..n).map(|_| rng.gen_range(0u64..10_000)).collect()
}

fn encode_all<W: UnsignedWriter>(mut w: W, data: &[u64]) -> W {
    for &x in data {
        w.write(x).unwrap();
    }
    w
}

fn decode_all<R: UnsignedReader>(mut r: R) -> Vec<u64> {
    let mut out = Vec::new();
    while let Some(x) = r.try_read().unwrap() {
        out.push(x);
    }
    out
}

fn encoding(c: &mut Criterion) {
    let n = 100_000;
    let data = random_data(n);

    c.bench_function(&format!("Encoding: VLQ - {} elements", n), |b| {
        b.iter(|| encode_all(VlqWriter::new(Vec::new()), black_box(&data)).finish().unwrap())
    });
    c.bench_function(&format!("Encoding: Elias gamma - {} elements", n), |b| {
        b.iter(|| encode_all(EliasGammaWriter::new(Vec::new()), black_box(&data)).finish().unwrap())
    });
    c.bench_function(&format!("Encoding: Thompson alpha - {} elements", n), |b| {
        b.iter(|| encode_all(ThompsonAlphaWriter::new(Vec::new()), black_box(&data)).finish().unwrap())
    });
    c.bench_function(&format!("Encoding: Fibonacci stream - {} elements", n), |b| {
        b.iter(|| encode_all(FibonacciWriter::new(Vec::new()), black_box(&data)).finish().unwrap())
    });
    let codec = FibonacciCodec::new(true);
    c.bench_function(&format!("Encoding: Fibonacci set - {} elements", n), |b| {
        b.iter(|| codec.compress(black_box(&data)).unwrap())
    });
}

fn decoding(c: &mut Criterion) {
    let n = 100_000;
    let data = random_data(n);

    let vlq = encode_all(VlqWriter::new(Vec::new()), &data).finish().unwrap();
    let gamma = encode_all(EliasGammaWriter::new(Vec::new()), &data).finish().unwrap();
    let alpha = encode_all(ThompsonAlphaWriter::new(Vec::new()), &data).finish().unwrap();
    let fib = encode_all(FibonacciWriter::new(Vec::new()), &data).finish().unwrap();
    let codec = FibonacciCodec::new(false);

    c.bench_function(&format!("Decoding: VLQ - {} elements", n), |b| {
        b.iter(|| decode_all(VlqReader::new(black_box(vlq.as_slice()))))
    });
    c.bench_function(&format!("Decoding: Elias gamma - {} elements", n), |b| {
        b.iter(|| decode_all(EliasGammaReader::new(black_box(gamma.as_slice()))))
    });
    c.bench_function(&format!("Decoding: Thompson alpha - {} elements", n), |b| {
        b.iter(|| decode_all(ThompsonAlphaReader::new(black_box(alpha.as_slice()))))
    });
    c.bench_function(&format!("Decoding: Fibonacci stream - {} elements", n), |b| {
        b.iter(|| decode_all(FibonacciReader::new(black_box(fib.as_slice()))))
    });
    c.bench_function(&format!("Decoding: Fibonacci set - {} elements", n), |b| {
        b.iter(|| codec.decompress(black_box(&fib)).unwrap())
    });
}

criterion_group!(benches, encoding, decoding);
criterion_main!(benches);
