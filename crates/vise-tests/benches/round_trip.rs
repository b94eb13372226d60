//! Round-trip throughput comparison across the built-in codecs

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vise_tests::LOREM_IPSUM;

fn bench_round_trip(c: &mut Criterion) {
    let payload = LOREM_IPSUM.repeat(64);

    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for codec in vise_codecs::registry().codecs() {
        let compressed = codec.compress_to_vec(&payload, None).unwrap();

        group.bench_with_input(
            BenchmarkId::new("compress", codec.name()),
            &payload,
            |b, data| {
                b.iter(|| codec.compress_to_vec(data, None).unwrap());
            },
        );
        group.bench_with_input(
            BenchmarkId::new("decompress", codec.name()),
            &compressed,
            |b, data| {
                b.iter(|| codec.decompress_to_vec(data, None).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_round_trip);
criterion_main!(benches);
