use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cooldown::{BucketScope, Cooldown, CooldownPolicy, Identity};
use std::time::Duration;

fn hot_key(c: &mut Criterion) {
    let cooldown = Cooldown::new(
        CooldownPolicy::new(u32::MAX, Duration::from_secs(3600), BucketScope::USER).unwrap(),
    );
    let id = Identity::new(1, 2, 3);
    c.bench_function("try_consume_hot_key", |b| {
        b.iter(|| black_box(cooldown.try_consume(black_box(&id))))
    });
}

fn spread_keys(c: &mut Criterion) {
    let cooldown = Cooldown::new(
        CooldownPolicy::new(5, Duration::from_secs(10), BucketScope::USER | BucketScope::GUILD)
            .unwrap(),
    );
    let mut user = 0u64;
    c.bench_function("check_spread_keys", |b| {
        b.iter(|| {
            user = (user + 1) % 10_000;
            black_box(cooldown.check(&Identity::in_guild(user, 1, 7)))
        })
    });
}

fn remaining_cooldown_miss(c: &mut Criterion) {
    let cooldown =
        Cooldown::new(CooldownPolicy::new(1, Duration::from_secs(10), BucketScope::USER).unwrap());
    c.bench_function("remaining_cooldown_without_bucket", |b| {
        b.iter(|| black_box(cooldown.remaining_cooldown(black_box(&Identity::new(9, 0, 0)))))
    });
}

criterion_group!(benches, hot_key, spread_keys, remaining_cooldown_miss);
criterion_main!(benches);
