//! Cooperative shutdown signalling between the pool controller and workers.
//!
//! Workers check the token before every fetch, and the token is handed to
//! [`CommandSource::next_command`](crate::CommandSource::next_command) so a
//! source can unblock a parked worker promptly instead of relying on the
//! pool to interrupt it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// One-way cancellation flag shared by the controller and every worker.
///
/// Cloning is cheap; every clone observes the same flag. Once cancelled the
/// token never resets.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token, waking every [`wait_for`](Self::wait_for) caller.
    /// Idempotent.
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        if !*cancelled {
            *cancelled = true;
            self.inner.condvar.notify_all();
        }
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Park until the token is cancelled or `timeout` elapses. Returns
    /// `true` if the token is cancelled.
    ///
    /// Blocking sources without their own wakeup mechanism can use this as
    /// their idle wait.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            if self
                .inner
                .condvar
                .wait_until(&mut cancelled, deadline)
                .timed_out()
            {
                return *cancelled;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn starts_uncancelled() {
        let token = ShutdownToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent_and_monotone() {
        let token = ShutdownToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.clone().is_cancelled());
    }

    #[test]
    fn wait_for_times_out_when_not_cancelled() {
        let token = ShutdownToken::new();
        assert!(!token.wait_for(Duration::from_millis(20)));
    }

    #[test]
    fn wait_for_returns_immediately_when_already_cancelled() {
        let token = ShutdownToken::new();
        token.cancel();
        let start = Instant::now();
        assert!(token.wait_for(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn cancel_wakes_parked_waiter() {
        let token = ShutdownToken::new();
        let waiter = token.clone();

        let handle = thread::spawn(move || waiter.wait_for(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        assert!(handle.join().unwrap());
    }
}
