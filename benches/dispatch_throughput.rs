//! Throughput benchmark for the dispatch pool.

use std::collections::VecDeque;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use dispatch_pool::{CommandSource, DispatchPool, PoolConfig, ShutdownToken};
use parking_lot::Mutex;

struct QueueSource {
    commands: Mutex<VecDeque<u64>>,
}

impl QueueSource {
    fn with_commands(count: u64) -> Self {
        Self {
            commands: Mutex::new((0..count).collect()),
        }
    }
}

impl CommandSource for QueueSource {
    type Command = u64;

    fn next_command(&self, _shutdown: &ShutdownToken) -> Option<u64> {
        self.commands.lock().pop_front()
    }

    fn has_exited(&self) -> bool {
        self.commands.lock().is_empty()
    }

    fn has_backlog(&self) -> bool {
        self.commands.lock().len() > 1
    }
}

fn bench_dispatch(c: &mut Criterion) {
    for workers in [1, 4] {
        c.bench_function(&format!("dispatch_4k_commands_{workers}_workers"), |b| {
            let pool = DispatchPool::new(PoolConfig::with_max_workers(workers)).unwrap();
            b.iter(|| {
                let source = Arc::new(QueueSource::with_commands(4096));
                let stats = pool
                    .run(source, Arc::new(|cmd: u64| {
                        black_box(cmd);
                    }))
                    .unwrap();
                black_box(stats)
            });
        });
    }
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
