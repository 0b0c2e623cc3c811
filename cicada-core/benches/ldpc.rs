//! Throughput of LDPC construction, encoding, and belief-propagation decoding.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cicada_core::config::LdpcConfig;
use cicada_core::ldpc::LdpcCode;

fn bench_construction(c: &mut Criterion) {
    c.bench_function("ldpc_construction", |b| {
        b.iter(|| LdpcCode::new(black_box(LdpcConfig::default())).unwrap())
    });
}

fn bench_encode(c: &mut Criterion) {
    let code = LdpcCode::new(LdpcConfig::default()).unwrap();
    let message = vec![0u8; code.k()];
    c.bench_function("ldpc_encode", |b| b.iter(|| code.encode(black_box(&message))));
}

fn bench_decode_clean_codeword(c: &mut Criterion) {
    let code = LdpcCode::new(LdpcConfig::default()).unwrap();
    let message = vec![0u8; code.k()];
    let codeword = code.encode(&message);
    let llrs: Vec<f32> = codeword.iter().map(|&b| if b == 0 { 10.0 } else { -10.0 }).collect();

    c.bench_function("ldpc_decode_clean", |b| b.iter(|| code.decode(black_box(&llrs)).unwrap()));
}

criterion_group!(benches, bench_construction, bench_encode, bench_decode_clean_codeword);
criterion_main!(benches);
