//! Surface model: structural snapshots of the page under test and the session
//! trait the harness drives it through.
//!
//! The page exposes exactly one editable input (reachable by accessible
//! label) and zero-or-one non-editable output, distinguishable from the input
//! only by role and content — both share one structural style signature.
//! Everything the harness learns about the page arrives as a [`PageSnapshot`];
//! everything it does to the page goes through a [`SurfaceHandle`] scoped to
//! one snapshot generation. Sessions are explicit objects, never globals, so
//! independent sessions can run in parallel without shared mutable state.

#![allow(missing_docs)]

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Function an element serves in the interaction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Input,
    Output,
}

/// One element matching the shared structural signature, as observed at
/// snapshot time. A pure value — holding it has no effect on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Position within the structural match list (document order).
    pub index: usize,
    /// Whether the element accepts keyboard focus / carries an editable role.
    pub editable: bool,
    /// Accessible label, when the element exposes one.
    pub label: Option<String>,
    /// Current rendered text content, untrimmed.
    pub text: String,
}

impl ElementSnapshot {
    /// Output-role content test: trimmed text is non-empty.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// All structural matches at one instant, stamped with the page generation.
///
/// The generation increments on every re-render/navigation; handles resolved
/// against an older generation are rejected by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub generation: u64,
    pub elements: Vec<ElementSnapshot>,
}

/// A resolved, unambiguous reference to one live element serving one role.
///
/// Lifetime: one scenario execution. The page may re-render at any time, so
/// handles are re-resolved from a fresh snapshot every scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub role: Role,
    pub index: usize,
    pub generation: u64,
}

/// One live browsing context against the target application.
///
/// All methods take `&self`; a session serializes its own interactions
/// internally. The harness guarantees at most one driver invocation is in
/// flight per session (the output region is a single shared mutable
/// resource), but read-only snapshots may be issued at any time.
#[async_trait]
pub trait TargetSession: Send + Sync {
    /// Re-establish a clean page state — fresh navigation or equivalent.
    /// Invalidates all previously issued handles.
    async fn reset(&self) -> Result<()>;

    /// Pure read: every element currently matching the structural signature.
    async fn snapshot(&self) -> Result<PageSnapshot>;

    /// Clear the editable surface behind `handle`.
    async fn clear(&self, handle: &SurfaceHandle) -> Result<()>;

    /// Set the editable surface to `text` verbatim — no normalization of
    /// line breaks, repeated whitespace, or script boundaries.
    async fn fill(&self, handle: &SurfaceHandle, text: &str) -> Result<()>;

    /// Read the rendered text content behind `handle`, untrimmed.
    async fn read_text(&self, handle: &SurfaceHandle) -> Result<String>;

    /// Current raw value of the editable surface (empty when only the
    /// placeholder is showing).
    async fn input_value(&self, handle: &SurfaceHandle) -> Result<String>;
}

/// Opens independent sessions. Each parallel scenario stream gets its own.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn TargetSession>>;
}
