//! STH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SthError>;

/// Which sub-wait of the output detection protocol a timeout occurred in.
///
/// `Presence` — waiting for an output-role candidate to structurally exist.
/// `Settle` — waiting after presence for the rendered text to stop changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitPhase {
    Presence,
    Settle,
}

impl std::fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Settle => write!(f, "settle"),
        }
    }
}

/// Top-level error type for the transliteration harness.
#[derive(Debug, Error)]
pub enum SthError {
    #[error("[STH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[STH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[STH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error(
        "[STH-2001] input surface not resolvable: {candidates} labeled editable candidate(s), expected exactly 1"
    )]
    InputResolution { candidates: usize },

    #[error(
        "[STH-2002] output region not resolvable: {candidates} non-empty non-editable candidate(s), expected exactly 1"
    )]
    OutputResolution { candidates: usize },

    #[error("[STH-2003] stale surface handle: page generation {held} superseded by {current}")]
    StaleHandle { held: u64, current: u64 },

    #[error("[STH-2101] wait timed out in {phase} phase after {elapsed_ms} ms")]
    WaitTimeout { phase: WaitPhase, elapsed_ms: u64 },

    #[error("[STH-2102] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[STH-3001] fixture load failure for {name}: {details}")]
    FixtureLoad { name: String, details: String },

    #[error("[STH-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[STH-4001] session failure: {details}")]
    Session { details: String },

    #[error("[STH-4002] run interrupted by operator")]
    Interrupted,
}

impl SthError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "STH-1001",
            Self::MissingConfig { .. } => "STH-1002",
            Self::ConfigParse { .. } => "STH-1003",
            Self::InputResolution { .. } => "STH-2001",
            Self::OutputResolution { .. } => "STH-2002",
            Self::StaleHandle { .. } => "STH-2003",
            Self::WaitTimeout { .. } => "STH-2101",
            Self::Serialization { .. } => "STH-2102",
            Self::FixtureLoad { .. } => "STH-3001",
            Self::Io { .. } => "STH-3002",
            Self::Session { .. } => "STH-4001",
            Self::Interrupted => "STH-4002",
        }
    }

    /// Whether the failure is local to one scenario.
    ///
    /// Scenario-local failures are recorded and the run continues; anything
    /// else aborts the whole run before or at the failing scenario.
    #[must_use]
    pub const fn is_scenario_local(&self) -> bool {
        matches!(
            self,
            Self::InputResolution { .. }
                | Self::OutputResolution { .. }
                | Self::StaleHandle { .. }
                | Self::WaitTimeout { .. }
        )
    }

    /// Whether an explicit runner retry may resolve the failure.
    ///
    /// Resolution and timeout failures are flake-shaped; everything else is
    /// deterministic and retrying would only repeat it.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.is_scenario_local()
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for session-level failures.
    #[must_use]
    pub fn session(details: impl Into<String>) -> Self {
        Self::Session {
            details: details.into(),
        }
    }
}

impl From<toml::de::Error> for SthError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for SthError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}
