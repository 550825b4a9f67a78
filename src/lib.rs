#![forbid(unsafe_code)]

//! Singlish Transliteration Harness (sth) — validates a Singlish→Sinhala
//! web transliterator by driving its UI and comparing rendered output
//! against expected strings.
//!
//! The target application is an opaque black box reachable only through its
//! rendered page: one editable input findable by accessible label, and
//! zero-or-one output panel that shares the input's style signature and
//! fills in asynchronously with no completion event. The harness therefore
//! revolves around four pieces:
//!
//! 1. **Locator resolution** — role-based disambiguation of structurally
//!    identical elements ([`locator`])
//! 2. **Two-phase waiting** — presence polling + settle debounce ([`wait`])
//! 3. **The interaction protocol** — clear → type → wait → read ([`driver`])
//! 4. **Scenario replay** — data-driven tables with per-scenario isolation
//!    ([`runner`])
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use singlish_translit_harness::prelude::*;
//! ```
//!
//! Real browser adapters live outside this crate: implement
//! [`surface::TargetSession`] (and [`surface::SessionFactory`]) over your
//! automation stack and hand it to [`runner::ScenarioRunner`]. The in-tree
//! [`surface::sim`] target is a deterministic stand-in used by the test
//! suite and the `sim` CLI target.

pub mod prelude;

pub mod core;
pub mod driver;
pub mod fixtures;
pub mod locator;
pub mod report;
pub mod runner;
pub mod surface;
pub mod wait;
