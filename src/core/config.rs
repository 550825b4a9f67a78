//! Configuration system: TOML file + env var overrides + defaults mirroring
//! the live translator's observed timing behavior.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SthError};

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub report: ReportConfig,
}

/// Identity of the page under test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    /// URL the session navigates to on reset.
    pub url: String,
    /// Accessible label of the editable input surface. Content-independent,
    /// so resolution survives arbitrary page text.
    pub input_label: String,
    /// Structural style signature shared by the input and output panels.
    /// Opaque to the harness; handed to the session for snapshotting.
    pub structural_signature: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: "https://www.swifttranslator.com/".to_string(),
            input_label: "Input Your Singlish Text Here.".to_string(),
            structural_signature:
                "div.w-full.h-80.p-3.rounded-lg.ring-1.ring-slate-300.whitespace-pre-wrap"
                    .to_string(),
        }
    }
}

/// Every timing knob of the interaction protocol, in milliseconds.
///
/// Defaults are the values the live site was calibrated against; tighten them
/// for the simulated target, loosen them for slow networks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after navigation before the first interaction.
    pub page_load_ms: u64,
    /// Pause after clearing the input so stale output tears down.
    pub after_clear_ms: u64,
    /// Hard deadline for an output candidate to structurally appear.
    pub presence_timeout_ms: u64,
    /// Fixed pause after presence for content to stop changing. A heuristic
    /// debounce — the target emits no completion event.
    pub settle_delay_ms: u64,
    /// Pause between scenarios to avoid cross-scenario timing contamination.
    pub between_scenarios_ms: u64,
    /// Interval between presence-phase polls.
    pub poll_interval_ms: u64,
    /// Optional random jitter added to each poll interval (0 disables).
    pub poll_jitter_ms: u64,
    /// Grace added to presence + settle when computing the overall deadline.
    pub settle_grace_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_ms: 2_000,
            after_clear_ms: 1_000,
            presence_timeout_ms: 10_000,
            settle_delay_ms: 3_000,
            between_scenarios_ms: 2_000,
            poll_interval_ms: 250,
            poll_jitter_ms: 0,
            settle_grace_ms: 500,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    #[must_use]
    pub const fn after_clear(&self) -> Duration {
        Duration::from_millis(self.after_clear_ms)
    }

    #[must_use]
    pub const fn presence_timeout(&self) -> Duration {
        Duration::from_millis(self.presence_timeout_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn between_scenarios(&self) -> Duration {
        Duration::from_millis(self.between_scenarios_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Upper bound for one full wait: presence + settle + grace.
    #[must_use]
    pub const fn overall_deadline(&self) -> Duration {
        Duration::from_millis(
            self.presence_timeout_ms + self.settle_delay_ms + self.settle_grace_ms,
        )
    }
}

/// Runner behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Independent sessions to run in parallel. Scenarios are partitioned
    /// round-robin; each session replays its share strictly sequentially.
    pub sessions: usize,
    /// Attempts per scenario. 1 = no retry. Only resolution/timeout failures
    /// are retried; assertion mismatches never are.
    pub max_attempts: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sessions: 1,
            max_attempts: 1,
        }
    }
}

/// Result log destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Whether to append per-scenario JSONL records.
    pub jsonl_enabled: bool,
    /// JSONL file path.
    pub jsonl_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            jsonl_enabled: true,
            jsonl_path: PathBuf::from("sth-results.jsonl"),
        }
    }
}

impl Config {
    /// Default config file location: `~/.config/sth/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        home_dir.join(".config").join("sth").join("config.toml")
    }

    /// Load configuration: explicit path must exist; the default path is
    /// optional and falls back to defaults. Env overrides apply either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SthError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SthError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // target
        set_env_string("STH_TARGET_URL", &mut self.target.url);
        set_env_string("STH_TARGET_INPUT_LABEL", &mut self.target.input_label);
        set_env_string(
            "STH_TARGET_STRUCTURAL_SIGNATURE",
            &mut self.target.structural_signature,
        );

        // timing
        set_env_u64("STH_TIMING_PAGE_LOAD_MS", &mut self.timing.page_load_ms)?;
        set_env_u64("STH_TIMING_AFTER_CLEAR_MS", &mut self.timing.after_clear_ms)?;
        set_env_u64(
            "STH_TIMING_PRESENCE_TIMEOUT_MS",
            &mut self.timing.presence_timeout_ms,
        )?;
        set_env_u64(
            "STH_TIMING_SETTLE_DELAY_MS",
            &mut self.timing.settle_delay_ms,
        )?;
        set_env_u64(
            "STH_TIMING_BETWEEN_SCENARIOS_MS",
            &mut self.timing.between_scenarios_ms,
        )?;
        set_env_u64(
            "STH_TIMING_POLL_INTERVAL_MS",
            &mut self.timing.poll_interval_ms,
        )?;
        set_env_u64(
            "STH_TIMING_POLL_JITTER_MS",
            &mut self.timing.poll_jitter_ms,
        )?;
        set_env_u64(
            "STH_TIMING_SETTLE_GRACE_MS",
            &mut self.timing.settle_grace_ms,
        )?;

        // run
        set_env_usize("STH_RUN_SESSIONS", &mut self.run.sessions)?;
        set_env_u32("STH_RUN_MAX_ATTEMPTS", &mut self.run.max_attempts)?;

        // report
        set_env_bool("STH_REPORT_JSONL_ENABLED", &mut self.report.jsonl_enabled)?;
        if let Some(raw) = non_empty_env("STH_REPORT_JSONL_PATH") {
            self.report.jsonl_path = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Reject configurations the protocol cannot run under.
    pub fn validate(&self) -> Result<()> {
        if self.target.url.trim().is_empty() {
            return Err(SthError::InvalidConfig {
                details: "target.url must not be empty".to_string(),
            });
        }
        if self.target.input_label.trim().is_empty() {
            return Err(SthError::InvalidConfig {
                details: "target.input_label must not be empty".to_string(),
            });
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(SthError::InvalidConfig {
                details: "timing.poll_interval_ms must be > 0".to_string(),
            });
        }
        if self.timing.presence_timeout_ms < self.timing.poll_interval_ms {
            return Err(SthError::InvalidConfig {
                details: format!(
                    "timing.presence_timeout_ms ({}) must be >= poll_interval_ms ({})",
                    self.timing.presence_timeout_ms, self.timing.poll_interval_ms
                ),
            });
        }
        if self.timing.poll_jitter_ms >= self.timing.poll_interval_ms
            && self.timing.poll_jitter_ms != 0
        {
            return Err(SthError::InvalidConfig {
                details: format!(
                    "timing.poll_jitter_ms ({}) must be < poll_interval_ms ({})",
                    self.timing.poll_jitter_ms, self.timing.poll_interval_ms
                ),
            });
        }
        if self.run.sessions == 0 {
            return Err(SthError::InvalidConfig {
                details: "run.sessions must be >= 1".to_string(),
            });
        }
        if self.run.max_attempts == 0 {
            return Err(SthError::InvalidConfig {
                details: "run.max_attempts must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

// ──────────────────── env override helpers ────────────────────

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_string(name: &str, slot: &mut String) {
    if let Some(raw) = non_empty_env(name) {
        *slot = raw;
    }
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = non_empty_env(name) {
        *slot = raw.trim().parse().map_err(|_| SthError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_u32(name: &str, slot: &mut u32) -> Result<()> {
    if let Some(raw) = non_empty_env(name) {
        *slot = raw.trim().parse().map_err(|_| SthError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = non_empty_env(name) {
        *slot = raw.trim().parse().map_err(|_| SthError::InvalidConfig {
            details: format!("{name} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = non_empty_env(name) {
        *slot = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(SthError::InvalidConfig {
                    details: format!("{name} must be a boolean, got {other:?}"),
                });
            }
        };
    }
    Ok(())
}
