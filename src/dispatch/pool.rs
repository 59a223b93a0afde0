//! Pool controller: configuration, the blocking run entry point, and
//! teardown of spawned workers.

use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use super::state::{DispatchState, DispatchStats};
use super::worker;
use crate::source::{CommandProcessor, CommandSource};

/// Default ceiling on concurrently running workers, primary included.
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Configuration for a dispatch pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on concurrently running workers, primary included.
    pub max_workers: usize,
    /// Thread name prefix for spawned workers.
    pub thread_name_prefix: String,
    /// Stack size per spawned worker in bytes (0 = platform default).
    pub stack_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            thread_name_prefix: "dispatch-worker".to_string(),
            stack_size: 0,
        }
    }
}

impl PoolConfig {
    /// Config with a specific worker ceiling.
    pub fn with_max_workers(count: usize) -> Self {
        Self {
            max_workers: count,
            ..Default::default()
        }
    }

    /// Config sized for CPU-bound processors: one worker slot per core.
    pub fn cpu_bound() -> Self {
        Self {
            max_workers: num_cpus::get().max(1),
            ..Default::default()
        }
    }
}

/// Errors for pool construction.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The configured ceiling leaves no slot for the primary worker.
    #[error("pool has no worker slots (max_workers must be at least 1)")]
    NoWorkerSlots,
}

/// Adaptive worker pool over a shared command source.
///
/// [`run`](Self::run) services the source on the calling thread and grows
/// the pool on demand up to the configured ceiling. A pool holds no state
/// between runs; each run gets fresh dispatch state, so independent pools
/// (or repeated runs of one pool) never interfere.
pub struct DispatchPool {
    config: PoolConfig,
}

impl DispatchPool {
    /// Validate `config` and create a pool.
    ///
    /// Fails before any worker executes; this is the only error surfaced to
    /// the caller.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.max_workers == 0 {
            return Err(PoolError::NoWorkerSlots);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Run the pool to completion on the calling thread.
    ///
    /// Blocks until `source` reports exit, then cancels the run's shutdown
    /// token and joins every spawned worker. After this returns, no worker
    /// started by this run can execute further work.
    ///
    /// The processor receives every command exactly once, on whichever
    /// worker fetched it; per-run user data rides in the processor itself
    /// (struct fields or closure captures).
    pub fn run<S, P>(&self, source: Arc<S>, processor: Arc<P>) -> Result<DispatchStats, PoolError>
    where
        S: CommandSource + 'static,
        P: CommandProcessor<S::Command> + 'static,
    {
        let state = Arc::new(DispatchState::new(self.config.max_workers));
        debug!(max_workers = self.config.max_workers, "dispatch pool starting");

        {
            // Joins spawned workers even if the processor panics on the
            // primary worker.
            let _teardown = Teardown { state: &state };
            worker::worker_loop(&state, &self.config, &source, &processor, false);
        }

        let stats = state.stats();
        debug!(
            workers = state.worker_count(),
            commands = stats.commands_dispatched,
            "dispatch pool stopped"
        );
        Ok(stats)
    }
}

/// Run a pool with the default configuration.
pub fn run<S, P>(source: Arc<S>, processor: Arc<P>) -> Result<DispatchStats, PoolError>
where
    S: CommandSource + 'static,
    P: CommandProcessor<S::Command> + 'static,
{
    DispatchPool::new(PoolConfig::default())?.run(source, processor)
}

/// Cancels the run and joins every spawned worker on drop.
///
/// Joining loops until no spawn is in flight: a worker may be mid-spawn of
/// another worker at the moment the primary returns, and that late handle
/// must be collected too.
struct Teardown<'a> {
    state: &'a DispatchState,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
        loop {
            let handles = self.state.take_handles();
            if handles.is_empty() {
                if self.state.spawns_in_flight() == 0 {
                    break;
                }
                thread::yield_now();
                continue;
            }
            for handle in handles {
                if handle.join().is_err() {
                    warn!("worker thread panicked during run");
                }
            }
        }
    }
}
