#![allow(clippy::cast_possible_wrap)]

//! Criterion benchmark of contended checkout/checkin on a small SQLite pool.
//! Workers are plain threads since the pool itself is blocking; each one
//! checks out a transaction, runs a single-row lookup, and commits.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_connector::{Connector, SqlConnectorError, TransactionMode, Variant};
use std::hint::black_box;
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const SQLITE_SELECT: &str = "SELECT id, name FROM test WHERE id = ?1";
const ROWS: usize = 256;

struct Dataset {
    _dir: TempDir,
    connector: Arc<Connector>,
}

// Dataset and pool prepared once and reused across benchmark runs.
static DATASET: LazyLock<Dataset> = LazyLock::new(|| {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("bench_pool_checkout.db");
    let connector = Connector::new_sqlite(path.to_string_lossy(), pool_size_to_run())
        .expect("create connector");
    connector.connect().expect("connect pool");
    seed(&connector).expect("seed dataset");
    Dataset {
        _dir: dir,
        connector,
    }
});

fn pool_size_to_run() -> usize {
    std::env::var("BENCH_POOL_SIZE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(4)
}

fn concurrency_to_run() -> usize {
    std::env::var("BENCH_CONCURRENCY")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8)
}

fn seed(connector: &Arc<Connector>) -> Result<(), SqlConnectorError> {
    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
    tx.exec(
        "CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        &[],
    )?;
    for id in 1..=ROWS as i64 {
        tx.exec(
            "INSERT INTO test (id, name) VALUES (?1, ?2)",
            &[Variant::from(id), Variant::from(format!("name-{id}"))],
        )?;
    }
    tx.commit()
}

fn parallel_lookups(
    connector: &Arc<Connector>,
    concurrency: usize,
    per_worker: usize,
) -> Result<(), SqlConnectorError> {
    let workers: Vec<_> = (0..concurrency)
        .map(|worker| {
            let connector = Arc::clone(connector);
            thread::spawn(move || -> Result<(), SqlConnectorError> {
                for n in 0..per_worker {
                    let id = ((worker * per_worker + n) % ROWS + 1) as i64;
                    let mut tx = connector.create_transaction(TransactionMode::AutoBegin)?;
                    let rs = tx.query(SQLITE_SELECT, &[Variant::from(id)])?;
                    black_box(rs.results.first());
                    tx.commit()?;
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("bench worker panicked")?;
    }
    Ok(())
}

fn benchmark_pool_checkout(c: &mut Criterion) {
    let connector = Arc::clone(&DATASET.connector);
    let concurrency = concurrency_to_run().max(1);
    let per_worker = 32;

    let mut group = c.benchmark_group("pool_checkout");
    group.throughput(Throughput::Elements((concurrency * per_worker) as u64));
    group.bench_function(BenchmarkId::new("sqlite_lookup", concurrency), |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::default();
            for _ in 0..iters {
                let start = Instant::now();
                parallel_lookups(&connector, concurrency, per_worker)
                    .expect("parallel lookups");
                total += start.elapsed();
            }
            total
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_pool_checkout);
criterion_main!(benches);
