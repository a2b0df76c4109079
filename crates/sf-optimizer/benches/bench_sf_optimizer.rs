use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use sf_core::{Entry, OptimizerConfig, Timestamp};
use sf_optimizer::layer1_fillers::{remove_from_text, FillerList, FillerOptions};
use sf_optimizer::{CpsOptimizer, SubtitlePipeline};

const WORDS: &[&str] = &["um", "we", "should", "go", "uh", "before", "the", "bridge", "closes", "tonight", "right"];

fn generate_entries(n: usize) -> Vec<Entry> {
    let mut rng = rand::thread_rng();
    let mut t = 0u64;
    (0..n)
        .map(|i| {
            let start = t + rng.gen_range(0..600);
            let end = start + rng.gen_range(400..3_000);
            t = end;
            let words: Vec<&str> = (0..rng.gen_range(2..14)).map(|_| WORDS[rng.gen_range(0..WORDS.len())]).collect();
            Entry::from_text(i + 1, Timestamp::from_millis(start), Timestamp::from_millis(end), &words.join(" "))
        })
        .collect()
}

fn bench_fillers(c: &mut Criterion) {
    let list = FillerList::english();
    let text = "Uh, so anyway, um, we should go before the bridge closes, hmm.";
    c.bench_function("filler_strip_line", |b| {
        b.iter(|| black_box(remove_from_text(black_box(text), &list, FillerOptions::default())))
    });
}

fn bench_cps(c: &mut Criterion) {
    let config = OptimizerConfig::default();
    let entries = generate_entries(2_000);
    c.bench_function("cps_optimize_2000", |b| {
        b.iter(|| black_box(CpsOptimizer::new(&config).optimize(black_box(entries.clone()))))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let Ok(pipeline) = SubtitlePipeline::new(OptimizerConfig::default()) else { return };
    let entries = generate_entries(2_000);
    c.bench_function("pipeline_local_2000", |b| {
        b.iter(|| black_box(pipeline.run_local(black_box(entries.clone()))))
    });
}

criterion_group!(benches, bench_fillers, bench_cps, bench_pipeline);
criterion_main!(benches);
