//! Adaptive dispatch pool: shared state, the worker loop, and the
//! controller that runs a pool to completion.

mod pool;
mod state;
mod worker;

pub use pool::{run, DispatchPool, PoolConfig, PoolError, DEFAULT_MAX_WORKERS};
pub use state::DispatchStats;
