//! Aggregation over run results: verdict counts, pass rate, per-category
//! breakdown, slowest scenarios.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::runner::{Outcome, RunResult};

/// Per-category verdict counts (category is a descriptive fixture tag).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CategoryStats {
    pub total: usize,
    pub pass: usize,
}

/// Aggregate view over one or more runs' results.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pass: usize,
    pub mismatch: usize,
    pub error: usize,
    pub pass_rate_pct: f64,
    pub elapsed_total_ms: u64,
    pub by_category: BTreeMap<String, CategoryStats>,
    /// (scenario id, elapsed ms) — the three slowest executions.
    pub slowest: Vec<(String, u64)>,
}

const SLOWEST_SHOWN: usize = 3;
const UNCATEGORIZED: &str = "(uncategorized)";

impl Summary {
    #[must_use]
    pub fn from_results(results: &[RunResult]) -> Self {
        let mut by_category: BTreeMap<String, CategoryStats> = BTreeMap::new();
        let mut pass = 0;
        let mut mismatch = 0;
        let mut error = 0;
        let mut elapsed_total_ms = 0;
        for result in results {
            match result.outcome {
                Outcome::Pass => pass += 1,
                Outcome::Mismatch => mismatch += 1,
                Outcome::Error => error += 1,
            }
            elapsed_total_ms += result.elapsed_ms;
            let key = result
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let stats = by_category.entry(key).or_default();
            stats.total += 1;
            if result.passed() {
                stats.pass += 1;
            }
        }

        let mut ranked: Vec<(String, u64)> = results
            .iter()
            .map(|result| (result.id.clone(), result.elapsed_ms))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(SLOWEST_SHOWN);

        let total = results.len();
        Self {
            total,
            pass,
            mismatch,
            error,
            pass_rate_pct: if total == 0 {
                0.0
            } else {
                pass as f64 / total as f64 * 100.0
            },
            elapsed_total_ms,
            by_category,
            slowest: ranked,
        }
    }

    /// Non-zero process exit is warranted when anything did not pass.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.mismatch > 0 || self.error > 0
    }

    /// Plain-text rendering for terminal output.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Scenarios: {}", self.total);
        let _ = writeln!(
            out,
            "  pass: {}  mismatch: {}  error: {}  ({:.1}% pass)",
            self.pass, self.mismatch, self.error, self.pass_rate_pct
        );
        let _ = writeln!(out, "  elapsed: {} ms total", self.elapsed_total_ms);
        if !self.by_category.is_empty() {
            let _ = writeln!(out, "By category:");
            for (category, stats) in &self.by_category {
                let _ = writeln!(out, "  {category}: {}/{}", stats.pass, stats.total);
            }
        }
        if !self.slowest.is_empty() {
            let _ = writeln!(out, "Slowest:");
            for (id, elapsed) in &self.slowest {
                let _ = writeln!(out, "  {id}: {elapsed} ms");
            }
        }
        out
    }
}
