use core::{convert::Infallible, hint::black_box, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use dryrun_dispatch::{DispatchConfig, TokioDispatchQueue, TokioResourcePool, invoke_fn};
use futures::future::join_all;
use std::time::Instant;
use tokio::runtime::Builder;

// Number of requests submitted per benchmark iteration.
const TOTAL_REQUESTS: usize = 4096;

const POOL_SIZES: [usize; 4] = [1, 4, 16, 64];

/// An endpoint that answers instantly, so only queue and pool overhead is
/// measured.
fn echo_endpoints(
    size: usize,
) -> Vec<impl dryrun_dispatch::Invoke<u64, Output = u64, Error = Infallible>> {
    (0..size)
        .map(|_| invoke_fn(|call: u64| async move { Ok::<_, Infallible>(black_box(call)) }))
        .collect()
}

/// Submits every request up front and awaits them together on a multi-thread
/// Tokio runtime.
fn bench_burst_tokio(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst/async/tokio");
    group.throughput(Throughput::Elements(TOTAL_REQUESTS as u64));

    for size in POOL_SIZES {
        group.bench_function(format!("elems/{TOTAL_REQUESTS}/pool/{size}"), |b| {
            let rt = Builder::new_multi_thread().enable_all().build().unwrap();

            b.to_async(&rt).iter_custom(move |iters| async move {
                let queue = TokioDispatchQueue::new(
                    TokioResourcePool::new(echo_endpoints(size)),
                    DispatchConfig::new(Duration::ZERO),
                );
                let start = Instant::now();

                for _ in 0..iters {
                    let outcomes =
                        join_all((0..TOTAL_REQUESTS as u64).map(|r| queue.submit(r))).await;
                    for outcome in outcomes {
                        black_box(outcome.unwrap());
                    }
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

/// Submits one request at a time, awaiting each before the next, on a single
/// Tokio thread.
fn bench_sequential_tokio(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential/async/tokio");
    group.throughput(Throughput::Elements(TOTAL_REQUESTS as u64));

    group.bench_function(format!("elems/{TOTAL_REQUESTS}/pool/1"), |b| {
        let rt = Builder::new_current_thread().enable_all().build().unwrap();

        b.to_async(&rt).iter_custom(move |iters| async move {
            let queue = TokioDispatchQueue::new(
                TokioResourcePool::new(echo_endpoints(1)),
                DispatchConfig::new(Duration::ZERO),
            );
            let start = Instant::now();

            for _ in 0..iters {
                for r in 0..TOTAL_REQUESTS as u64 {
                    black_box(queue.submit(r).await.unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

#[cfg(feature = "async-smol")]
fn bench_burst_smol(c: &mut Criterion) {
    use criterion::async_executor::SmolExecutor;
    use dryrun_dispatch::{SmolDispatchQueue, SmolResourcePool};

    let mut group = c.benchmark_group("burst/async/smol");
    group.throughput(Throughput::Elements(TOTAL_REQUESTS as u64));

    for size in POOL_SIZES {
        group.bench_function(format!("elems/{TOTAL_REQUESTS}/pool/{size}"), |b| {
            b.to_async(SmolExecutor).iter_custom(move |iters| async move {
                let queue = SmolDispatchQueue::new(
                    SmolResourcePool::new(echo_endpoints(size)),
                    DispatchConfig::new(Duration::ZERO),
                );
                let start = Instant::now();

                for _ in 0..iters {
                    let outcomes =
                        join_all((0..TOTAL_REQUESTS as u64).map(|r| queue.submit(r))).await;
                    for outcome in outcomes {
                        black_box(outcome.unwrap());
                    }
                }

                start.elapsed()
            });
        });
    }

    group.finish();
}

#[cfg(not(feature = "async-smol"))]
fn bench_burst_smol(_: &mut Criterion) {}

criterion_group!(
    benches,
    bench_burst_tokio,
    bench_sequential_tokio,
    bench_burst_smol,
);
criterion_main!(benches);
