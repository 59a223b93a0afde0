//! Shared dispatch state: the counters, the growth lock, and the spawned
//! worker handles for one pool run.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::shutdown::ShutdownToken;

/// Snapshot of a completed pool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Worker threads started over the run, primary included.
    pub workers_started: usize,
    /// Growth attempts that failed to produce a thread.
    pub spawn_failures: usize,
    /// Commands handed to the processor.
    pub commands_dispatched: u64,
}

/// Counters and handles shared by the controller and every worker of one
/// run.
///
/// The counters are atomics so the hot-path growth pre-check reads them
/// without locking; such reads are hints and may be stale. Any mutation
/// that grows the pool goes through [`begin_growth`](Self::begin_growth) /
/// [`finish_growth`](Self::finish_growth), serialized by `growth_lock`, so
/// a slot can never be double-spent.
///
/// Invariants, for the life of one run:
/// - `workers` counts threads that actually started. It never decreases
///   and is only incremented once a spawn has verifiably produced a thread.
/// - `workers + spawning <= max_workers`. In-flight spawns hold a
///   reservation in `spawning` so concurrent growers cannot overshoot the
///   ceiling while a thread is still being created.
pub(crate) struct DispatchState {
    max_workers: usize,
    /// Threads actually started, primary included.
    workers: AtomicUsize,
    /// Spawn reservations taken but not yet resolved.
    spawning: AtomicUsize,
    /// Workers parked in fetch, plus spares reserved on their behalf.
    available: AtomicUsize,
    spawn_failures: AtomicUsize,
    commands: AtomicU64,
    /// Serializes the growth decision's check-then-reserve step.
    growth_lock: Mutex<()>,
    /// Handles for spawned workers. The primary runs on the caller's thread
    /// and is never stored or joined.
    handles: Mutex<Vec<JoinHandle<()>>>,
    /// Cooperative stop signal for every worker of this run.
    pub(crate) shutdown: ShutdownToken,
}

impl DispatchState {
    pub(crate) fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            workers: AtomicUsize::new(1),
            spawning: AtomicUsize::new(0),
            available: AtomicUsize::new(0),
            spawn_failures: AtomicUsize::new(0),
            commands: AtomicU64::new(0),
            growth_lock: Mutex::new(()),
            handles: Mutex::new(Vec::with_capacity(max_workers.saturating_sub(1))),
            shutdown: ShutdownToken::new(),
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    pub(crate) fn spawns_in_flight(&self) -> usize {
        self.spawning.load(Ordering::SeqCst)
    }

    /// Unlocked growth pre-check: no worker appears available and the
    /// ceiling has room. A stale answer here is harmless; the decision is
    /// re-verified under the growth lock before anything is mutated.
    pub(crate) fn growth_warranted(&self) -> bool {
        self.available.load(Ordering::SeqCst) == 0
            && self.workers.load(Ordering::SeqCst) + self.spawning.load(Ordering::SeqCst)
                < self.max_workers
    }

    /// Re-check the growth condition under the lock and, if it still holds,
    /// take a spawn reservation plus the optimistic availability bump that
    /// stands in for the spare worker about to exist.
    ///
    /// Returns the slot index for the new worker, or `None` if a competing
    /// worker got there first.
    pub(crate) fn begin_growth(&self) -> Option<usize> {
        let _guard = self.growth_lock.lock();
        if !self.growth_warranted() {
            return None;
        }
        let slot = self.workers.load(Ordering::SeqCst) + self.spawning.load(Ordering::SeqCst);
        self.spawning.fetch_add(1, Ordering::SeqCst);
        self.available.fetch_add(1, Ordering::SeqCst);
        Some(slot)
    }

    /// Resolve a reservation after the spawn attempt.
    ///
    /// On success the started thread joins `workers` and its handle is kept
    /// for teardown. On failure the reservation and the optimistic
    /// availability bump are rolled back; `workers` never reflected the
    /// attempt.
    pub(crate) fn finish_growth(&self, spawned: Option<JoinHandle<()>>) {
        match spawned {
            Some(handle) => {
                // Ordering matters: the slot must move from `spawning` to
                // `workers` without ever appearing free to the cap check.
                self.workers.fetch_add(1, Ordering::SeqCst);
                self.spawning.fetch_sub(1, Ordering::SeqCst);
                self.handles.lock().push(handle);
            }
            None => {
                self.spawn_failures.fetch_add(1, Ordering::SeqCst);
                self.spawning.fetch_sub(1, Ordering::SeqCst);
                self.available.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    /// The calling worker is parked in fetch and can take the next command.
    pub(crate) fn mark_available(&self) {
        self.available.fetch_add(1, Ordering::SeqCst);
    }

    /// The calling worker's fetch yielded a command; it is busy until
    /// processing completes.
    pub(crate) fn mark_busy(&self) {
        self.available.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn record_dispatch(&self) {
        self.commands.fetch_add(1, Ordering::SeqCst);
    }

    /// Drain the spawned worker handles accumulated so far.
    pub(crate) fn take_handles(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.handles.lock())
    }

    pub(crate) fn stats(&self) -> DispatchStats {
        DispatchStats {
            workers_started: self.workers.load(Ordering::SeqCst),
            spawn_failures: self.spawn_failures.load(Ordering::SeqCst),
            commands_dispatched: self.commands.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn racing_growers_win_exactly_one_reservation() {
        let state = Arc::new(DispatchState::new(10));
        let racers = 8;
        let barrier = Arc::new(Barrier::new(racers));

        let threads: Vec<_> = (0..racers)
            .map(|_| {
                let state = Arc::clone(&state);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    state.begin_growth().is_some()
                })
            })
            .collect();

        let wins = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1, "only one racer may take the reservation");
        assert_eq!(state.spawns_in_flight(), 1);
        assert_eq!(state.worker_count(), 1, "reservation is not a started thread");
    }

    #[test]
    fn failed_spawn_rolls_back_reservation_and_availability() {
        let state = DispatchState::new(4);

        assert!(state.begin_growth().is_some());
        state.finish_growth(None);

        assert_eq!(state.worker_count(), 1);
        assert_eq!(state.spawns_in_flight(), 0);
        assert_eq!(state.stats().spawn_failures, 1);
        // The slot is free again, so the next observation may grow.
        assert!(state.begin_growth().is_some());
    }

    #[test]
    fn successful_spawn_moves_reservation_into_worker_count() {
        let state = DispatchState::new(4);

        assert!(state.begin_growth().is_some());
        let handle = thread::spawn(|| {});
        state.finish_growth(Some(handle));

        assert_eq!(state.worker_count(), 2);
        assert_eq!(state.spawns_in_flight(), 0);

        for handle in state.take_handles() {
            handle.join().unwrap();
        }
    }

    #[test]
    fn growth_stops_at_ceiling() {
        let state = DispatchState::new(2);

        assert!(state.begin_growth().is_some());
        let handle = thread::spawn(|| {});
        state.finish_growth(Some(handle));

        // Spare exists but is optimistically available; mark it busy to make
        // the counters look exhausted again.
        state.mark_busy();
        assert!(!state.growth_warranted(), "ceiling reached");
        assert!(state.begin_growth().is_none());
        assert_eq!(state.worker_count(), 2);

        for handle in state.take_handles() {
            handle.join().unwrap();
        }
    }

    #[test]
    fn availability_bracketing_gates_growth() {
        let state = DispatchState::new(8);

        state.mark_available();
        assert!(!state.growth_warranted(), "an idle worker exists");

        state.mark_busy();
        assert!(state.growth_warranted(), "no idle worker and room to grow");
    }

    #[test]
    fn worker_count_never_decreases() {
        let state = DispatchState::new(4);

        let before = state.worker_count();
        assert!(state.begin_growth().is_some());
        state.finish_growth(None);
        assert_eq!(state.worker_count(), before);

        assert!(state.begin_growth().is_some());
        state.finish_growth(Some(thread::spawn(|| {})));
        assert_eq!(state.worker_count(), before + 1);

        for handle in state.take_handles() {
            handle.join().unwrap();
        }
    }
}
