use criterion::{criterion_group, criterion_main};
use criterion::{BenchmarkId, Bencher, Criterion, Throughput};
use ot_beaver_triplets::channel_utils::sync_channel::create_unix_channel_pair;
use ot_beaver_triplets::channel_utils::sync_channel_by_cb::create_crossbeam_channel_pair;
use ot_beaver_triplets::fixed_point::DEFAULT_SCALE;
use ot_beaver_triplets::party::{PartyContext, PartyId};
use ot_beaver_triplets::triplet::{TripletConfig, TripletGenerator};
use scuttlebutt::{AbstractChannel, AesRng};
use std::time::{Duration, Instant};

// Time `n` triplets on p0 once both generators are initialized. Base OTs are excluded.
fn triplet_routine<C>(ch0: C, ch1: C, n: usize, step: usize) -> Duration
where
    C: AbstractChannel + Send + 'static,
{
    let config = TripletConfig {
        triplet_step: step,
        ..Default::default()
    };

    let handle = std::thread::spawn(move || {
        let ctx = PartyContext::new(PartyId::P1, ch1, AesRng::new());
        let mut g = TripletGenerator::<i64, _, _, DEFAULT_SCALE>::new(ctx, config).unwrap();
        g.init().unwrap();
        let mut out = vec![0i64; 3 * n];
        g.get_triplets(&mut out).unwrap();
    });

    let ctx = PartyContext::new(PartyId::P0, ch0, AesRng::new());
    let mut g = TripletGenerator::<i64, _, _, DEFAULT_SCALE>::new(ctx, config).unwrap();
    g.init().unwrap();

    let start = Instant::now();
    let mut out = vec![0i64; 3 * n];
    g.get_triplets(&mut out).unwrap();
    let elapsed = start.elapsed();

    handle.join().unwrap();
    elapsed
}

fn unix_fn(step: usize) -> impl FnMut(&mut Bencher<'_>, &usize) {
    move |b, &n| {
        b.iter_custom(|iter| {
            (0..iter)
                .map(|_| {
                    let (ch0, ch1) = create_unix_channel_pair().unwrap();
                    triplet_routine(ch0, ch1, n, step)
                })
                .sum()
        })
    }
}

fn crossbeam_fn(step: usize) -> impl FnMut(&mut Bencher<'_>, &usize) {
    move |b, &n| {
        b.iter_custom(|iter| {
            (0..iter)
                .map(|_| {
                    let (ch0, ch1) = create_crossbeam_channel_pair();
                    triplet_routine(ch0, ch1, n, step)
                })
                .sum()
        })
    }
}

fn bench_triplets(c: &mut Criterion) {
    let min_e = 8;
    let max_e = 12;
    let step = 256;

    let mut group = c.benchmark_group("triplet_time");
    group.sample_size(10);
    for e in min_e..=max_e {
        let size: usize = 1 << e;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("UnixStream", size), &size, unix_fn(step));
        group.bench_with_input(
            BenchmarkId::new("Crossbeam", size),
            &size,
            crossbeam_fn(step),
        );
    }
    group.finish();
}

fn bench_refill_step(c: &mut Criterion) {
    let size = 1 << 10;

    let mut group = c.benchmark_group("triplet_step_time");
    group.sample_size(10);
    group.throughput(Throughput::Elements(size as u64));
    for step in [64, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("UnixStream", step), &size, unix_fn(step));
    }
    group.finish();
}

criterion_group!(benches, bench_triplets, bench_refill_step);
criterion_main!(benches);
