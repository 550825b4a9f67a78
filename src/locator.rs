//! Role disambiguation: from an ambiguous structural snapshot to exactly one
//! input handle and one output handle.
//!
//! The target renders the input and the output with the same style signature,
//! so structure alone cannot tell them apart. Roles are derived instead:
//! the input is the editable element carrying the stable accessible label;
//! the output is the single non-editable element whose trimmed text is
//! non-empty. Resolution is a pure read over one snapshot — retrying through
//! transient states is the waiter's job, not the resolver's.

#![allow(missing_docs)]

use crate::core::errors::{Result, SthError};
use crate::surface::{PageSnapshot, Role, SurfaceHandle};

/// Outcome of output-role classification over one snapshot.
///
/// `Absent` is not an error by itself: the output legitimately does not exist
/// until the target decides to render it, and the presence phase polls
/// through this state. `Ambiguous` is terminal — the page is in a shape the
/// protocol cannot interpret, and waiting will not repair it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputResolution {
    Unique(SurfaceHandle),
    Absent,
    Ambiguous(usize),
}

/// Resolves role handles from structural snapshots.
#[derive(Debug, Clone)]
pub struct LocatorResolver {
    input_label: String,
}

impl LocatorResolver {
    #[must_use]
    pub fn new(input_label: impl Into<String>) -> Self {
        Self {
            input_label: input_label.into(),
        }
    }

    /// The single editable element carrying the accessible label.
    ///
    /// Label-based resolution is content-independent, so it survives any page
    /// text the scenarios produce.
    pub fn resolve_input(&self, snapshot: &PageSnapshot) -> Result<SurfaceHandle> {
        let candidates: Vec<usize> = snapshot
            .elements
            .iter()
            .filter(|element| {
                element.editable && element.label.as_deref() == Some(self.input_label.as_str())
            })
            .map(|element| element.index)
            .collect();
        match candidates.as_slice() {
            [index] => Ok(SurfaceHandle {
                role: Role::Input,
                index: *index,
                generation: snapshot.generation,
            }),
            other => Err(SthError::InputResolution {
                candidates: other.len(),
            }),
        }
    }

    /// Output-role classification: exclude input-role elements, keep those
    /// with non-empty trimmed text.
    #[must_use]
    pub fn classify_output(&self, snapshot: &PageSnapshot) -> OutputResolution {
        let candidates: Vec<usize> = snapshot
            .elements
            .iter()
            .filter(|element| !element.editable && element.has_content())
            .map(|element| element.index)
            .collect();
        match candidates.as_slice() {
            [] => OutputResolution::Absent,
            [index] => OutputResolution::Unique(SurfaceHandle {
                role: Role::Output,
                index: *index,
                generation: snapshot.generation,
            }),
            other => OutputResolution::Ambiguous(other.len()),
        }
    }

    /// Strict form: exactly one output candidate or a resolution error
    /// carrying the candidate count.
    pub fn resolve_output(&self, snapshot: &PageSnapshot) -> Result<SurfaceHandle> {
        match self.classify_output(snapshot) {
            OutputResolution::Unique(handle) => Ok(handle),
            OutputResolution::Absent => Err(SthError::OutputResolution { candidates: 0 }),
            OutputResolution::Ambiguous(count) => {
                Err(SthError::OutputResolution { candidates: count })
            }
        }
    }
}
