//! Scenario catalog: serde model, loaders, and the embedded default tables.
//!
//! Fixture files are ordered JSON arrays of scenario records. The linguistic
//! content is opaque data — the harness never interprets inputs or expected
//! outputs, it only replays them. Metadata is descriptive (reporting
//! dimensions) and never affects execution. Additive unknown fields are
//! ignored; there is no schema versioning.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SthError};

/// The positive-functional table shipped with the harness.
pub const BUILTIN_POSITIVE: &str = include_str!("../fixtures/positive.json");
/// The negative-functional (robustness) table shipped with the harness.
pub const BUILTIN_NEGATIVE: &str = include_str!("../fixtures/negative.json");
/// The usability-flow table shipped with the harness.
pub const BUILTIN_UI: &str = include_str!("../fixtures/ui.json");

/// Descriptive tags carried by a scenario. Never read by the runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grammar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// Additive fields from newer fixture files ride along untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One (input, expected-output) record driving one end-to-end check.
/// Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    /// Unique, stable identifier (e.g. `Pos_Fun_0005`).
    pub id: String,
    /// Human-readable description.
    pub name: String,
    /// Raw text submitted verbatim — may contain line breaks, repeated
    /// whitespace, punctuation, and mixed scripts.
    pub input: String,
    /// Exact output string; literal equality is the pass criterion.
    pub expected: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// An ordered, validated set of scenarios.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scenarios: Vec<Scenario>,
}

impl Catalog {
    /// Parse one fixture document. `name` labels diagnostics.
    pub fn from_json_str(name: &str, raw: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> =
            serde_json::from_str(raw).map_err(|err| SthError::FixtureLoad {
                name: name.to_string(),
                details: err.to_string(),
            })?;
        let catalog = Self { scenarios };
        catalog.validate(name)?;
        Ok(catalog)
    }

    /// Load a fixture file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| SthError::io(path, source))?;
        Self::from_json_str(&path.display().to_string(), &raw)
    }

    /// The full shipped catalog: positive + negative + usability tables.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::from_json_str("builtin:positive", BUILTIN_POSITIVE)?;
        catalog.extend(Self::from_json_str("builtin:negative", BUILTIN_NEGATIVE)?)?;
        catalog.extend(Self::from_json_str("builtin:ui", BUILTIN_UI)?)?;
        Ok(catalog)
    }

    /// Append another catalog, re-checking id uniqueness across the union.
    pub fn extend(&mut self, other: Self) -> Result<()> {
        self.scenarios.extend(other.scenarios);
        self.validate("merged catalog")
    }

    fn validate(&self, name: &str) -> Result<()> {
        let mut seen = BTreeMap::new();
        for scenario in &self.scenarios {
            if scenario.id.trim().is_empty() {
                return Err(SthError::FixtureLoad {
                    name: name.to_string(),
                    details: format!("scenario {:?} has an empty id", scenario.name),
                });
            }
            if let Some(previous) = seen.insert(scenario.id.clone(), &scenario.name) {
                return Err(SthError::FixtureLoad {
                    name: name.to_string(),
                    details: format!(
                        "duplicate scenario id {:?} ({:?} and {:?})",
                        scenario.id, previous, scenario.name
                    ),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// (input, expected) pairs — the scripted lexicon for the simulated
    /// target, so the shipped tables replay green against it.
    #[must_use]
    pub fn lexicon(&self) -> Vec<(String, String)> {
        self.scenarios
            .iter()
            .map(|scenario| (scenario.input.clone(), scenario.expected.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{BUILTIN_NEGATIVE, BUILTIN_POSITIVE, Catalog};

    #[test]
    fn builtin_catalog_loads_and_ids_are_unique() {
        let catalog = Catalog::builtin().expect("builtin fixtures parse");
        assert_eq!(catalog.len(), 43);
        assert!(
            catalog
                .scenarios()
                .iter()
                .any(|scenario| scenario.id == "Pos_Fun_0005")
        );
    }

    #[test]
    fn imperative_vector_is_preserved_verbatim() {
        let catalog = Catalog::from_json_str("positive", BUILTIN_POSITIVE).unwrap();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|scenario| scenario.id == "Pos_Fun_0005")
            .expect("imperative vector present");
        assert_eq!(scenario.input, "kiyavana eka navaththaganna");
        assert_eq!(scenario.expected, "කියවන එක නවත්තගන්න");
    }

    #[test]
    fn multiline_vector_keeps_line_breaks() {
        let catalog = Catalog::from_json_str("positive", BUILTIN_POSITIVE).unwrap();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|scenario| scenario.id == "Pos_Fun_0029")
            .expect("multiline vector present");
        assert_eq!(scenario.input.lines().count(), 10);
        assert!(scenario.expected.contains('\n'));
    }

    #[test]
    fn garbled_short_input_is_a_valid_mapping() {
        let catalog = Catalog::from_json_str("negative", BUILTIN_NEGATIVE).unwrap();
        let scenario = catalog
            .scenarios()
            .iter()
            .find(|scenario| scenario.id == "Neg_Fun_0006")
            .expect("garbled vector present");
        assert_eq!(scenario.input, "kthw");
        assert!(!scenario.expected.is_empty());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let raw = r#"[
            {"id": "A1", "name": "first", "input": "a", "expected": "b"},
            {"id": "A1", "name": "second", "input": "c", "expected": "d"}
        ]"#;
        let err = Catalog::from_json_str("dup", raw).unwrap_err();
        assert_eq!(err.code(), "STH-3001");
        assert!(err.to_string().contains("A1"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = r#"[{
            "id": "X1", "name": "n", "input": "i", "expected": "e",
            "metadata": {"category": "c", "priority": 3},
            "added_in_v2": true
        }]"#;
        let catalog = Catalog::from_json_str("additive", raw).unwrap();
        let scenario = &catalog.scenarios()[0];
        assert_eq!(scenario.metadata.category.as_deref(), Some("c"));
        assert!(scenario.metadata.extra.contains_key("priority"));
    }
}
