//! The atomic "translate and observe" operation.
//!
//! One invocation per session at a time: the output region is a single
//! shared mutable resource, so a second in-flight translate would race on
//! which scenario's output gets observed. The runner enforces this by
//! owning the session and calling sequentially.

#![allow(missing_docs)]

use tokio_util::sync::CancellationToken;

use crate::core::config::TimingConfig;
use crate::core::errors::Result;
use crate::locator::LocatorResolver;
use crate::surface::TargetSession;
use crate::wait::ConditionWaiter;

/// Drives one session through the clear → type → wait → read protocol.
pub struct InteractionDriver<'s> {
    session: &'s dyn TargetSession,
    resolver: LocatorResolver,
    waiter: ConditionWaiter,
    timing: TimingConfig,
}

impl<'s> InteractionDriver<'s> {
    #[must_use]
    pub fn new(
        session: &'s dyn TargetSession,
        resolver: LocatorResolver,
        timing: TimingConfig,
        cancel: CancellationToken,
    ) -> Self {
        let waiter = ConditionWaiter::new(timing.clone(), cancel);
        Self {
            session,
            resolver,
            waiter,
            timing,
        }
    }

    /// Submit `input_text` and return the rendered translation, trimmed.
    ///
    /// Steps:
    /// 1. Resolve the input handle, clear it, and pause `after_clear` so any
    ///    stale output from a previous submission tears down — otherwise the
    ///    wait could latch onto leftover text.
    /// 2. Fill the input verbatim. No normalization: line breaks, repeated
    ///    whitespace, punctuation, and mixed scripts pass through unchanged.
    /// 3. Run the two-phase wait, then re-resolve the output from a fresh
    ///    snapshot and read its trimmed text.
    ///
    /// Errors from resolution and waiting propagate unchanged; this layer
    /// adds no error kinds of its own.
    pub async fn translate(&self, input_text: &str) -> Result<String> {
        let snapshot = self.session.snapshot().await?;
        let input = self.resolver.resolve_input(&snapshot)?;
        self.session.clear(&input).await?;
        self.waiter.pause(self.timing.after_clear()).await?;

        self.session.fill(&input, input_text).await?;

        self.waiter.await_output(self.session, &self.resolver).await?;

        // Content may have advanced during settle; trust a fresh snapshot,
        // not the presence-phase handle.
        let snapshot = self.session.snapshot().await?;
        let output = self.resolver.resolve_output(&snapshot)?;
        let text = self.session.read_text(&output).await?;
        Ok(text.trim().to_string())
    }

    /// Read the current input value (post-clear assertions).
    pub async fn input_value(&self) -> Result<String> {
        let snapshot = self.session.snapshot().await?;
        let input = self.resolver.resolve_input(&snapshot)?;
        self.session.input_value(&input).await
    }
}
