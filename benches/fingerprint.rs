use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use clipmon::monitor::fingerprint;

/// A cycle as the default format list sees it: four image targets, a uri
/// list and a text target
fn cycle(image_len: usize, text_len: usize) -> Vec<Vec<u8>> {
    let mut image = vec![0u8; image_len];
    for (i, b) in image.iter_mut().enumerate() {
        *b = (i % 251) as u8;
    }
    vec![
        image,
        Vec::new(),
        Vec::new(),
        Vec::new(),
        Vec::new(),
        "x".repeat(text_len).into_bytes(),
    ]
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for (name, image_len, text_len) in [
        ("text_1k", 0, 1024),
        ("screenshot_2m", 2 * 1024 * 1024, 0),
        ("image_with_caption_256k", 256 * 1024, 4096),
    ] {
        let buffers = cycle(image_len, text_len);
        let total: usize = buffers.iter().map(Vec::len).sum();
        group.throughput(Throughput::Bytes(total as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &buffers, |b, buffers| {
            b.iter(|| fingerprint(black_box(buffers.iter().map(Vec::as_slice))))
        });
    }

    group.finish();
}

fn bench_empty_cycle(c: &mut Criterion) {
    let buffers = cycle(0, 0);
    c.bench_function("fingerprint_empty_cycle", |b| {
        b.iter(|| fingerprint(black_box(buffers.iter().map(Vec::as_slice))))
    });
}

criterion_group!(benches, bench_fingerprint, bench_empty_cycle);
criterion_main!(benches);
