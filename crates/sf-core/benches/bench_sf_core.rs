use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use sf_core::{Entry, SubtitleStats, Timestamp};

fn generate_entries(n: usize) -> Vec<Entry> {
    let mut rng = rand::thread_rng();
    let mut t = 0u64;
    (0..n)
        .map(|i| {
            let start = t + rng.gen_range(0..400);
            let end = start + rng.gen_range(500..4_000);
            t = end;
            let len = rng.gen_range(5..80);
            Entry::new(i + 1, Timestamp::from_millis(start), Timestamp::from_millis(end), vec!["x".repeat(len)])
        })
        .collect()
}

fn bench_metrics(c: &mut Criterion) {
    let entries = generate_entries(2_000);
    c.bench_function("stats_2000_entries", |b| {
        b.iter(|| black_box(SubtitleStats::from_entries(black_box(&entries), 21.0)))
    });
    c.bench_function("timestamp_parse", |b| {
        b.iter(|| black_box(Timestamp::parse(black_box("01:23:45,678"))))
    });
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
