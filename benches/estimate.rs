use criterion::{black_box, criterion_group, criterion_main, Criterion};
use roi_estimator::rate_limit::{InMemoryTimestampStore, ShardedTimestampStore};
use roi_estimator::{
    calculate, validate_all, EstimateInputs, EstimateSession, FieldName, RateLimitConfig,
    RateLimiter, SlidingWindow,
};

fn validate_and_calculate(c: &mut Criterion) {
    let inputs = EstimateInputs::default();
    c.bench_function("validate_all + calculate", |b| {
        b.iter(|| {
            let inputs = black_box(&inputs);
            let errors = validate_all(inputs);
            calculate(inputs, !errors.is_empty())
        })
    });
}

fn session_edit_cycle(c: &mut Criterion) {
    let mut session = EstimateSession::default();
    let mut tasks = 1.0;
    c.bench_function("session edit + result", |b| {
        b.iter(|| {
            tasks = if tasks >= 10_000.0 { 1.0 } else { tasks + 1.0 };
            session.edit(FieldName::TasksPerWeek, black_box(tasks));
            session.result()
        })
    });
}

fn sliding_window_checks(c: &mut Criterion) {
    let cfg = RateLimitConfig::new(1_000, 100).expect("valid config");
    let keys: Vec<String> = (0..1_024).map(|i| format!("visitor-{i}")).collect();

    let single = SlidingWindow::new(InMemoryTimestampStore::new());
    let mut i = 0usize;
    c.bench_function("sliding window check (single lock)", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            single.check(black_box(&keys[i]), &cfg)
        })
    });

    let sharded = SlidingWindow::new(ShardedTimestampStore::default());
    let mut j = 0usize;
    c.bench_function("sliding window check (sharded)", |b| {
        b.iter(|| {
            j = (j + 1) % keys.len();
            sharded.check(black_box(&keys[j]), &cfg)
        })
    });
}

criterion_group!(benches, validate_and_calculate, session_edit_cycle, sliding_window_checks);
criterion_main!(benches);
