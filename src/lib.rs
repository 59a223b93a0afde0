//! Adaptive command-dispatch worker pool.
//!
//! One primary worker runs on the caller's thread and services commands from
//! a shared [`CommandSource`]. When a worker takes a command while no other
//! worker is available and the source still has commands waiting, the pool
//! grows by one spare worker, up to [`PoolConfig::max_workers`]. Once the
//! source reports exit, the primary returns and every spawned worker is
//! cancelled cooperatively and joined before [`DispatchPool::run`] returns.
//!
//! The pool is a pure dispatch-and-scale mechanism: it does not interpret
//! commands, retry them, or order them across workers. Fetching and
//! processing are supplied by the caller through the [`CommandSource`] and
//! [`CommandProcessor`] traits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use dispatch_pool::{CommandSource, DispatchPool, PoolConfig, ShutdownToken};
//! use parking_lot::Mutex;
//!
//! struct Queue {
//!     commands: Mutex<Vec<u32>>,
//! }
//!
//! impl CommandSource for Queue {
//!     type Command = u32;
//!
//!     fn next_command(&self, _shutdown: &ShutdownToken) -> Option<u32> {
//!         self.commands.lock().pop()
//!     }
//!
//!     fn has_exited(&self) -> bool {
//!         self.commands.lock().is_empty()
//!     }
//!
//!     fn has_backlog(&self) -> bool {
//!         self.commands.lock().len() > 1
//!     }
//! }
//!
//! let source = Arc::new(Queue { commands: Mutex::new((0..16).collect()) });
//! let processed = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&processed);
//!
//! let pool = DispatchPool::new(PoolConfig::default()).unwrap();
//! let stats = pool
//!     .run(source, Arc::new(move |_cmd: u32| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     }))
//!     .unwrap();
//!
//! assert_eq!(processed.load(Ordering::SeqCst), 16);
//! assert!(stats.workers_started >= 1);
//! ```

pub mod config;
pub mod dispatch;
pub mod shutdown;
pub mod source;
pub mod telemetry;

pub use dispatch::{run, DispatchPool, DispatchStats, PoolConfig, PoolError, DEFAULT_MAX_WORKERS};
pub use shutdown::ShutdownToken;
pub use source::{CommandProcessor, CommandSource};
