//! Scenario runner: strictly sequential replay per session, scenario-local
//! failure containment, aggregate reporting.
//!
//! Concurrency model: scenarios never interleave within a session — the
//! output region is one shared mutable resource. Throughput comes from
//! independent sessions (round-robin partition), each replaying its share
//! sequentially. Results are re-emitted in fixture order regardless of
//! session count, so reports are stable.
//!
//! Failure policy: assertion mismatches, resolution failures, and timeouts
//! are recorded per scenario and the run continues — one flaky interaction
//! must not mask the rest. Only infrastructure failures (session cannot be
//! opened or reset, operator abort) are fatal to the whole run.

#![allow(missing_docs)]

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::errors::{Result, SthError};
use crate::driver::InteractionDriver;
use crate::fixtures::{Catalog, Scenario};
use crate::locator::LocatorResolver;
use crate::surface::{SessionFactory, TargetSession};
use crate::wait::ConditionWaiter;

/// Verdict for one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Rendered output matched `expected` exactly.
    Pass,
    /// Output resolved but differed from `expected`.
    Mismatch,
    /// The protocol failed before an output could be compared.
    Error,
}

/// Immutable record of one scenario execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunResult {
    /// ISO 8601 UTC timestamp of record creation.
    pub ts: String,
    pub id: String,
    pub name: String,
    pub outcome: Outcome,
    pub expected: String,
    /// Rendered output; absent when the protocol errored before reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    pub elapsed_ms: u64,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RunResult {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Pass)
    }
}

/// Aggregate of one full run, in fixture order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<RunResult>,
    pub total_elapsed_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(RunResult::passed)
    }

    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome == outcome)
            .count()
    }
}

/// Replays a catalog against sessions produced by a [`SessionFactory`].
pub struct ScenarioRunner {
    config: Config,
    factory: Arc<dyn SessionFactory>,
    cancel: CancellationToken,
}

impl ScenarioRunner {
    #[must_use]
    pub fn new(config: Config, factory: Arc<dyn SessionFactory>, cancel: CancellationToken) -> Self {
        Self {
            config,
            factory,
            cancel,
        }
    }

    /// Run every scenario; returns the aggregate report, or the first fatal
    /// error. Scenario-local failures never abort the run.
    pub async fn run(&self, catalog: &Catalog) -> Result<RunReport> {
        let started = Instant::now();
        let session_count = self.config.run.sessions.min(catalog.len().max(1));

        // Round-robin partition, original index carried for re-ordering.
        let mut streams: Vec<Vec<(usize, Scenario)>> = vec![Vec::new(); session_count];
        for (index, scenario) in catalog.scenarios().iter().enumerate() {
            streams[index % session_count].push((index, scenario.clone()));
        }

        let mut handles = Vec::with_capacity(session_count);
        for stream in streams {
            let config = self.config.clone();
            let factory = Arc::clone(&self.factory);
            let cancel = self.cancel.clone();
            handles.push(tokio::spawn(async move {
                run_stream(&config, factory.as_ref(), &cancel, stream).await
            }));
        }

        let mut indexed: Vec<(usize, RunResult)> = Vec::with_capacity(catalog.len());
        let mut fatal: Option<SthError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(mut results)) => indexed.append(&mut results),
                Ok(Err(err)) => {
                    // Stop the sibling streams, keep draining their handles.
                    self.cancel.cancel();
                    fatal.get_or_insert(err);
                }
                Err(join_err) => {
                    self.cancel.cancel();
                    fatal.get_or_insert(SthError::session(format!(
                        "scenario stream panicked: {join_err}"
                    )));
                }
            }
        }
        if let Some(err) = fatal {
            return Err(err);
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(RunReport {
            results: indexed.into_iter().map(|(_, result)| result).collect(),
            total_elapsed_ms: elapsed_ms(started),
        })
    }
}

async fn run_stream(
    config: &Config,
    factory: &dyn SessionFactory,
    cancel: &CancellationToken,
    stream: Vec<(usize, Scenario)>,
) -> Result<Vec<(usize, RunResult)>> {
    if stream.is_empty() {
        return Ok(Vec::new());
    }
    let session = factory.open().await?;
    let pacer = ConditionWaiter::new(config.timing.clone(), cancel.clone());
    let mut results = Vec::with_capacity(stream.len());
    for (index, scenario) in stream {
        if cancel.is_cancelled() {
            return Err(SthError::Interrupted);
        }
        let result = run_scenario(config, session.as_ref(), cancel, &scenario).await?;
        results.push((index, result));
        pacer.pause(config.timing.between_scenarios()).await?;
    }
    Ok(results)
}

/// One scenario with explicit retry. Every attempt starts from a clean page
/// state; only resolution/timeout failures are retried, mismatches never.
async fn run_scenario(
    config: &Config,
    session: &dyn TargetSession,
    cancel: &CancellationToken,
    scenario: &Scenario,
) -> Result<RunResult> {
    let resolver = LocatorResolver::new(config.target.input_label.clone());
    let driver = InteractionDriver::new(
        session,
        resolver,
        config.timing.clone(),
        cancel.clone(),
    );
    let pacer = ConditionWaiter::new(config.timing.clone(), cancel.clone());
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        session.reset().await?;
        pacer.pause(config.timing.page_load()).await?;

        match driver.translate(&scenario.input).await {
            Ok(actual) => {
                let outcome = if actual == scenario.expected {
                    Outcome::Pass
                } else {
                    Outcome::Mismatch
                };
                return Ok(record(
                    scenario,
                    outcome,
                    Some(actual),
                    elapsed_ms(started),
                    attempts,
                    None,
                ));
            }
            Err(err) if err.is_retryable() => {
                if attempts < config.run.max_attempts {
                    continue;
                }
                return Ok(record(
                    scenario,
                    Outcome::Error,
                    None,
                    elapsed_ms(started),
                    attempts,
                    Some(err),
                ));
            }
            Err(fatal) => return Err(fatal),
        }
    }
}

fn record(
    scenario: &Scenario,
    outcome: Outcome,
    actual: Option<String>,
    elapsed_ms: u64,
    attempts: u32,
    error: Option<SthError>,
) -> RunResult {
    RunResult {
        ts: utc_now(),
        id: scenario.id.clone(),
        name: scenario.name.clone(),
        outcome,
        expected: scenario.expected.clone(),
        actual,
        elapsed_ms,
        attempts,
        error_code: error.as_ref().map(|err| err.code().to_string()),
        error_message: error.as_ref().map(ToString::to_string),
        category: scenario.metadata.category.clone(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::fixtures::Catalog;
    use crate::surface::sim::{SimConfig, SimFactory};
    use std::collections::HashMap;

    fn quick_config(sessions: usize) -> Config {
        let mut config = Config::default();
        config.timing.page_load_ms = 10;
        config.timing.after_clear_ms = 200;
        config.timing.presence_timeout_ms = 1_000;
        config.timing.settle_delay_ms = 100;
        config.timing.between_scenarios_ms = 20;
        config.timing.poll_interval_ms = 50;
        config.timing.settle_grace_ms = 50;
        config.run.sessions = sessions;
        config
    }

    fn catalog(pairs: &[(&str, &str, &str)]) -> Catalog {
        let raw = serde_json::to_string(
            &pairs
                .iter()
                .map(|(id, input, expected)| {
                    serde_json::json!({
                        "id": id,
                        "name": format!("scenario {id}"),
                        "input": input,
                        "expected": expected,
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        Catalog::from_json_str("inline", &raw).unwrap()
    }

    fn scripted_factory(pairs: &[(&str, &str, &str)]) -> Arc<SimFactory> {
        Arc::new(SimFactory::scripted(
            pairs
                .iter()
                .map(|(_, input, expected)| ((*input).to_string(), (*expected).to_string()))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn all_green_run_reports_every_pass_in_order() {
        let pairs = [
            ("T1", "mama", "මම"),
            ("T2", "api", "අපි"),
            ("T3", "kthw", "කතාව"),
        ];
        let runner = ScenarioRunner::new(
            quick_config(1),
            scripted_factory(&pairs),
            CancellationToken::new(),
        );
        let report = runner.run(&catalog(&pairs)).await.unwrap();
        assert!(report.all_passed());
        assert_eq!(
            report.results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["T1", "T2", "T3"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn mismatch_is_recorded_and_run_continues() {
        let pairs = [("T1", "mama", "මම"), ("T2", "api", "අපි")];
        // Catalog expects something the sim will not produce for T1.
        let table = catalog(&[("T1", "mama", "WRONG"), ("T2", "api", "අපි")]);
        let runner = ScenarioRunner::new(
            quick_config(1),
            scripted_factory(&pairs),
            CancellationToken::new(),
        );
        let report = runner.run(&table).await.unwrap();
        assert!(!report.all_passed());
        assert_eq!(report.count(Outcome::Mismatch), 1);
        assert_eq!(report.count(Outcome::Pass), 1);
        let failed = &report.results[0];
        assert_eq!(failed.actual.as_deref(), Some("මම"));
        assert_eq!(failed.expected, "WRONG");
    }

    #[tokio::test(start_paused = true)]
    async fn session_open_failure_is_fatal() {
        let mut factory = SimFactory::scripted(Vec::<(String, String)>::new());
        factory.fail_open = true;
        let runner = ScenarioRunner::new(
            quick_config(1),
            Arc::new(factory),
            CancellationToken::new(),
        );
        let err = runner
            .run(&catalog(&[("T1", "a", "a")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "STH-4001");
    }

    #[tokio::test(start_paused = true)]
    async fn parallel_sessions_preserve_fixture_order() {
        let pairs = [
            ("T1", "a", "a"),
            ("T2", "b", "b"),
            ("T3", "c", "c"),
            ("T4", "d", "d"),
            ("T5", "e", "e"),
        ];
        let runner = ScenarioRunner::new(
            quick_config(3),
            scripted_factory(&pairs),
            CancellationToken::new(),
        );
        let report = runner.run(&catalog(&pairs)).await.unwrap();
        assert!(report.all_passed());
        assert_eq!(
            report.results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["T1", "T2", "T3", "T4", "T5"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retry_is_explicit_and_never_applies_to_mismatches() {
        let pairs = [("T1", "mama", "මම")];
        let table = catalog(&[("T1", "mama", "WRONG")]);
        let mut config = quick_config(1);
        config.run.max_attempts = 3;
        let runner = ScenarioRunner::new(
            config,
            scripted_factory(&pairs),
            CancellationToken::new(),
        );
        let report = runner.run(&table).await.unwrap();
        // A mismatch is a final verdict — one attempt, no retry.
        assert_eq!(report.results[0].attempts, 1);
        assert_eq!(report.results[0].outcome, Outcome::Mismatch);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_scenario_is_contained_and_retried_to_the_cap() {
        let cfg = SimConfig {
            never_render: true,
            ..SimConfig::default()
        };
        let factory = SimFactory::new(cfg, std::sync::Arc::new(HashMap::new()));
        let mut config = quick_config(1);
        config.run.max_attempts = 2;
        let runner = ScenarioRunner::new(config, Arc::new(factory), CancellationToken::new());
        let report = runner.run(&catalog(&[("T1", "a", "a")])).await.unwrap();
        let result = &report.results[0];
        assert_eq!(result.outcome, Outcome::Error);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.error_code.as_deref(), Some("STH-2101"));
        assert!(result.error_message.as_deref().unwrap().contains("presence"));
    }
}
