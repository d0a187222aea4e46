//! # Background sweeper.
//!
//! A tokio task that periodically replays deferred work through
//! [`Mediator::sweep`].
//!
//! ## Architecture
//! ```text
//! spawn(handle, Weak<Shared>, every, token)
//!   loop {
//!     select! {
//!       token.cancelled()  ─► exit               (dispose / last handle dropped)
//!       ticker.tick()      ─► upgrade Weak
//!                               ├─ gone  ─► exit
//!                               └─ alive ─► catch_unwind(mediator.sweep())
//!                                             └─ panic ─► log SweepPanicked, keep ticking
//!     }
//!   }
//! ```
//!
//! ## Rules
//! - The sweeper holds only a weak reference: it never keeps a mediator alive
//! - First tick fires one full interval after spawn
//! - Missed ticks are delayed, not bunched
//! - A panicking subscriber loses only the entry it was replaying

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::mediator::{Mediator, Shared};
use crate::error::MediatorError;

/// Spawns the sweep loop on `handle`.
pub(crate) fn spawn(
    handle: &Handle,
    shared: Weak<Shared>,
    every: Duration,
    token: CancellationToken,
) {
    handle.spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(mediator) = Mediator::from_weak(&shared) else {
                        break;
                    };
                    tick(&mediator);
                }
            }
        }
    });
}

/// Runs one sweep, isolating subscriber panics from the loop.
fn tick(mediator: &Mediator) {
    match catch_unwind(AssertUnwindSafe(|| mediator.sweep())) {
        Ok(report) if !report.is_empty() => {
            tracing::debug!(
                mediator = mediator.name(),
                published = report.published,
                compacted = report.compacted,
                "sweep replayed deferred work"
            );
        }
        Ok(_) => {}
        Err(panic) => {
            let info = if let Some(msg) = panic.downcast_ref::<&'static str>() {
                (*msg).to_string()
            } else if let Some(msg) = panic.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            };
            MediatorError::SweepPanicked { info }.report(mediator.name());
        }
    }
}
