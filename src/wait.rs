//! Two-phase output wait: presence polling followed by a settle debounce.
//!
//! The target offers no completion event. It asynchronously (1) decides
//! whether to render an output node at all and (2) settles that node's text,
//! so completion is observed, not signaled:
//!
//! 1. **Presence phase** — poll the resolver's output classification at a
//!    fixed interval until exactly one non-empty candidate exists, bounded by
//!    `presence_timeout`.
//! 2. **Settle phase** — wait a fixed `settle_delay` for content to stop
//!    changing. This is a heuristic debounce and a known race window on slow
//!    networks, not a completion guarantee.
//!
//! The wait suspends the calling task between polls — nothing blocks a
//! worker thread — and the whole operation is bounded by an overall deadline
//! and a [`CancellationToken`]. Cancellation stops issuing polls and drops
//! the pending sleep before returning, leaving no dangling timers.

#![allow(missing_docs)]

use std::time::Duration;

use rand::Rng;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::core::config::TimingConfig;
use crate::core::errors::{Result, SthError, WaitPhase};
use crate::locator::{LocatorResolver, OutputResolution};
use crate::surface::{SurfaceHandle, TargetSession};

/// Successful wait: the presence handle plus phase timings.
#[derive(Debug, Clone, Copy)]
pub struct WaitOutcome {
    /// Handle observed when presence was established. Callers re-resolve
    /// from a fresh snapshot after settle — content may have kept moving.
    pub handle: SurfaceHandle,
    pub presence_elapsed: Duration,
    pub total_elapsed: Duration,
}

/// Polls a session until the output condition holds or a deadline passes.
pub struct ConditionWaiter {
    timing: TimingConfig,
    cancel: CancellationToken,
}

impl ConditionWaiter {
    #[must_use]
    pub fn new(timing: TimingConfig, cancel: CancellationToken) -> Self {
        Self { timing, cancel }
    }

    /// Run both phases against `session`.
    ///
    /// Errors: `[STH-2002]` when a poll observes an ambiguous page (terminal,
    /// never retried), `[STH-2101]` tagged presence or settle on deadline
    /// expiry, `[STH-4002]` on cancellation. A presence timeout is raised no
    /// earlier than `presence_timeout` and no later than one poll interval
    /// past it.
    pub async fn await_output(
        &self,
        session: &dyn TargetSession,
        resolver: &LocatorResolver,
    ) -> Result<WaitOutcome> {
        let started = Instant::now();
        let presence_deadline = started + self.timing.presence_timeout();
        let overall_deadline = started + self.timing.overall_deadline();

        // Presence phase.
        let handle = loop {
            if self.cancel.is_cancelled() {
                return Err(SthError::Interrupted);
            }
            let snapshot = session.snapshot().await?;
            match resolver.classify_output(&snapshot) {
                OutputResolution::Unique(handle) => break handle,
                OutputResolution::Ambiguous(count) => {
                    return Err(SthError::OutputResolution { candidates: count });
                }
                OutputResolution::Absent => {}
            }
            let now = Instant::now();
            if now >= presence_deadline {
                return Err(SthError::WaitTimeout {
                    phase: WaitPhase::Presence,
                    elapsed_ms: duration_ms(now - started),
                });
            }
            self.pause_until(now + self.poll_step()).await?;
        };
        let presence_elapsed = started.elapsed();

        // Settle phase.
        let settle_end = Instant::now() + self.timing.settle_delay();
        if settle_end > overall_deadline {
            self.pause_until(overall_deadline).await?;
            return Err(SthError::WaitTimeout {
                phase: WaitPhase::Settle,
                elapsed_ms: duration_ms(started.elapsed()),
            });
        }
        self.pause_until(settle_end).await?;

        Ok(WaitOutcome {
            handle,
            presence_elapsed,
            total_elapsed: started.elapsed(),
        })
    }

    /// Cancellable sleep. The sleep future is owned by the select, so a
    /// cancellation drops the timer immediately.
    pub async fn pause_until(&self, deadline: Instant) -> Result<()> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(SthError::Interrupted),
            () = sleep_until(deadline) => Ok(()),
        }
    }

    /// Cancellable fixed-duration pause.
    pub async fn pause(&self, duration: Duration) -> Result<()> {
        self.pause_until(Instant::now() + duration).await
    }

    fn poll_step(&self) -> Duration {
        let mut step = self.timing.poll_interval();
        if self.timing.poll_jitter_ms > 0 {
            let jitter = rand::rng().random_range(0..=self.timing.poll_jitter_ms);
            step += Duration::from_millis(jitter);
        }
        step
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
