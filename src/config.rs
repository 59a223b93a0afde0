//! Pool configuration from environment variables.
//!
//! All values are loaded from `DISPATCH_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `DISPATCH_MAX_WORKERS` | 10 | Worker ceiling, primary included (min 1) |
//! | `DISPATCH_THREAD_NAME_PREFIX` | `dispatch-worker` | Spawned thread name prefix |
//! | `DISPATCH_STACK_SIZE` | 0 | Worker stack in bytes (0 = platform default) |

use tracing::warn;

use crate::dispatch::PoolConfig;

/// Build a [`PoolConfig`] from `DISPATCH_*` environment variables.
pub fn pool_config_from_env() -> PoolConfig {
    let defaults = PoolConfig::default();
    PoolConfig {
        max_workers: env_worker_ceiling("DISPATCH_MAX_WORKERS", defaults.max_workers),
        thread_name_prefix: std::env::var("DISPATCH_THREAD_NAME_PREFIX")
            .ok()
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(defaults.thread_name_prefix),
        stack_size: env_usize("DISPATCH_STACK_SIZE", defaults.stack_size),
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    let Ok(raw) = std::env::var(name) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(%name, %raw, %default, "invalid value, using default");
            default
        }
    }
}

/// Like [`env_usize`], but a ceiling of zero would leave no slot for the
/// primary worker and also falls back.
fn env_worker_ceiling(name: &str, default: usize) -> usize {
    let value = env_usize(name, default);
    if value == 0 {
        warn!(%name, %default, "worker ceiling must be at least 1, using default");
        return default;
    }
    value
}
