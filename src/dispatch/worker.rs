//! The worker loop, run identically by the primary worker and every spare
//! spawned by the growth mechanism.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use super::pool::PoolConfig;
use super::state::DispatchState;
use crate::source::{CommandProcessor, CommandSource};
use crate::telemetry;

/// Pull one command at a time from the source until it exits or the run is
/// cancelled.
///
/// `spare` marks a worker created by the growth mechanism: its availability
/// was already counted, optimistically, by the worker that spawned it.
pub(crate) fn worker_loop<S, P>(
    state: &Arc<DispatchState>,
    config: &PoolConfig,
    source: &Arc<S>,
    processor: &Arc<P>,
    spare: bool,
) where
    S: CommandSource + 'static,
    P: CommandProcessor<S::Command> + 'static,
{
    let mut counted = spare;

    loop {
        if source.has_exited() || state.shutdown.is_cancelled() {
            break;
        }

        if !counted {
            state.mark_available();
            counted = true;
        }

        // May block indefinitely; a None is a transient no-op and the loop
        // retries after re-checking the exit conditions.
        let Some(command) = source.next_command(&state.shutdown) else {
            continue;
        };

        state.mark_busy();
        counted = false;

        // Grow while every worker is spoken for and the source still has
        // commands queued behind the one just taken.
        if state.growth_warranted() && source.has_backlog() {
            try_grow(state, config, source, processor);
        }

        state.record_dispatch();
        telemetry::record_command_dispatched();
        processor.process(command);
    }

    trace!(spare, "worker loop finished");
}

/// Re-verify the growth condition under the lock, then attempt to start one
/// spare worker. A failed spawn forgoes this growth opportunity and rolls
/// the reservation back; the run continues on the existing workers.
fn try_grow<S, P>(
    state: &Arc<DispatchState>,
    config: &PoolConfig,
    source: &Arc<S>,
    processor: &Arc<P>,
) where
    S: CommandSource + 'static,
    P: CommandProcessor<S::Command> + 'static,
{
    let Some(slot) = state.begin_growth() else {
        return;
    };

    match spawn_worker(state, config, source, processor, slot) {
        Ok(handle) => {
            debug!(slot, "started spare worker");
            state.finish_growth(Some(handle));
            telemetry::record_worker_spawned();
        }
        Err(err) => {
            warn!(slot, error = %err, "failed to start spare worker");
            state.finish_growth(None);
            telemetry::record_spawn_failure();
        }
    }
}

fn spawn_worker<S, P>(
    state: &Arc<DispatchState>,
    config: &PoolConfig,
    source: &Arc<S>,
    processor: &Arc<P>,
    slot: usize,
) -> io::Result<JoinHandle<()>>
where
    S: CommandSource + 'static,
    P: CommandProcessor<S::Command> + 'static,
{
    let state = Arc::clone(state);
    let config = config.clone();
    let source = Arc::clone(source);
    let processor = Arc::clone(processor);

    let mut builder =
        thread::Builder::new().name(format!("{}-{slot}", config.thread_name_prefix));
    if config.stack_size > 0 {
        builder = builder.stack_size(config.stack_size);
    }

    builder.spawn(move || worker_loop(&state, &config, &source, &processor, true))
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
