use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use matching_core::prelude::*;
use std::hint::black_box;

fn make_order(id: u64) -> Order {
    Order {
        id,
        symbol: Symbol::new("BTC-USDT"),
        side: Side::Buy,
        order_type: OrderType::Limit {
            price: Price::from(100u64),
            post_only: false,
        },
        original_quantity: Quantity::from(1u64),
        remaining_quantity: Quantity::from(1u64),
        status: OrderStatus::Pending,
        submission_timestamp: id,
    }
}

fn bench_enqueue_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("price level enqueue/pop");
    group.throughput(Throughput::Elements(1));
    group.bench_function("enqueue then pop_head", |b| {
        let mut level = PriceLevel::new(Price::from(100u64));
        let mut next_id = 0u64;
        b.iter(|| {
            next_id += 1;
            level.enqueue(black_box(make_order(next_id)));
            black_box(level.pop_head());
        });
    });
    group.finish();
}

fn bench_slab_reuse_under_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("price level slab churn");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("enqueue 1000, remove every other by handle", |b| {
        b.iter(|| {
            let mut level = PriceLevel::new(Price::from(100u64));
            let handles: Vec<_> = (0..1000u64).map(|id| level.enqueue(make_order(id))).collect();
            for (i, handle) in handles.into_iter().enumerate() {
                if i % 2 == 0 {
                    black_box(level.remove(handle));
                }
            }
        });
    });
    group.finish();
}

fn bench_level_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("price level expansion");
    group.throughput(Throughput::Elements(100_000));
    group.bench_function("enqueue 100k resting orders at one price", |b| {
        b.iter(|| {
            let mut level = PriceLevel::new(Price::from(100u64));
            for id in 0..100_000u64 {
                black_box(level.enqueue(make_order(id)));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_pop,
    bench_slab_reuse_under_churn,
    bench_level_expansion
);
criterion_main!(benches);
