//! Timing-contract tests for the two-phase wait, on a paused clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use singlish_translit_harness::core::config::TimingConfig;
use singlish_translit_harness::core::errors::{SthError, WaitPhase};
use singlish_translit_harness::locator::LocatorResolver;
use singlish_translit_harness::surface::TargetSession;
use singlish_translit_harness::surface::sim::{SimConfig, SimTranslator};
use singlish_translit_harness::wait::ConditionWaiter;
use tokio_util::sync::CancellationToken;

const LABEL: &str = "Input Your Singlish Text Here.";

fn timing(presence_ms: u64, settle_ms: u64, poll_ms: u64, grace_ms: u64) -> TimingConfig {
    TimingConfig {
        page_load_ms: 0,
        after_clear_ms: 0,
        presence_timeout_ms: presence_ms,
        settle_delay_ms: settle_ms,
        between_scenarios_ms: 0,
        poll_interval_ms: poll_ms,
        poll_jitter_ms: 0,
        settle_grace_ms: grace_ms,
    }
}

fn never_rendering() -> SimTranslator {
    let cfg = SimConfig {
        never_render: true,
        ..SimConfig::default()
    };
    SimTranslator::new(cfg, Arc::new(HashMap::new()))
}

fn rendering_after(delay_ms: u64) -> SimTranslator {
    let cfg = SimConfig {
        render_delay: Duration::from_millis(delay_ms),
        ..SimConfig::default()
    };
    SimTranslator::new(cfg, Arc::new(HashMap::new()))
}

async fn fill(sim: &SimTranslator, text: &str) {
    let snapshot = sim.snapshot().await.unwrap();
    let handle = LocatorResolver::new(LABEL)
        .resolve_input(&snapshot)
        .unwrap();
    sim.fill(&handle, text).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn presence_timeout_lands_within_one_poll_of_the_deadline() {
    // Contract: no earlier than the timeout, no later than one poll past it —
    // for any poll interval.
    for poll_ms in [50u64, 137, 333] {
        let sim = never_rendering();
        fill(&sim, "mama").await;
        let timing = timing(1_000, 200, poll_ms, 0);
        let waiter = ConditionWaiter::new(timing, CancellationToken::new());
        let err = waiter
            .await_output(&sim, &LocatorResolver::new(LABEL))
            .await
            .unwrap_err();
        match err {
            SthError::WaitTimeout { phase, elapsed_ms } => {
                assert_eq!(phase, WaitPhase::Presence);
                assert!(elapsed_ms >= 1_000, "poll {poll_ms}: fired early at {elapsed_ms}");
                assert!(
                    elapsed_ms <= 1_000 + poll_ms,
                    "poll {poll_ms}: fired late at {elapsed_ms}"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn just_in_time_render_still_succeeds() {
    // A candidate observed on the poll after the nominal deadline is taken —
    // the predicate is evaluated before the deadline check.
    let sim = rendering_after(1_100);
    fill(&sim, "mama").await;
    let waiter = ConditionWaiter::new(timing(1_000, 400, 300, 600), CancellationToken::new());
    let outcome = waiter
        .await_output(&sim, &LocatorResolver::new(LABEL))
        .await
        .unwrap();
    assert_eq!(outcome.presence_elapsed.as_millis(), 1_200);
    assert_eq!(outcome.total_elapsed.as_millis(), 1_600);
}

#[tokio::test(start_paused = true)]
async fn settle_phase_is_bounded_by_the_overall_deadline() {
    // Presence succeeds so late that the settle window cannot fit before the
    // overall deadline; the wait must fail tagged as a settle timeout.
    let sim = rendering_after(1_100);
    fill(&sim, "mama").await;
    let waiter = ConditionWaiter::new(timing(1_000, 400, 300, 0), CancellationToken::new());
    let err = waiter
        .await_output(&sim, &LocatorResolver::new(LABEL))
        .await
        .unwrap_err();
    match err {
        SthError::WaitTimeout { phase, elapsed_ms } => {
            assert_eq!(phase, WaitPhase::Settle);
            assert_eq!(elapsed_ms, 1_400);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn settle_strictly_follows_presence() {
    let sim = rendering_after(500);
    fill(&sim, "mama").await;
    let waiter = ConditionWaiter::new(timing(2_000, 300, 100, 0), CancellationToken::new());
    let outcome = waiter
        .await_output(&sim, &LocatorResolver::new(LABEL))
        .await
        .unwrap();
    assert_eq!(outcome.presence_elapsed.as_millis(), 500);
    assert_eq!(
        outcome.total_elapsed.as_millis() - outcome.presence_elapsed.as_millis(),
        300
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_the_wait_before_the_first_poll() {
    let sim = never_rendering();
    fill(&sim, "mama").await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let waiter = ConditionWaiter::new(timing(1_000, 200, 50, 0), cancel);
    let err = waiter
        .await_output(&sim, &LocatorResolver::new(LABEL))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "STH-4002");
}
