//! Deterministic in-memory stand-in for the remote translator page.
//!
//! Models exactly the behaviors the harness has to cope with: the output
//! panel shares the input's structural signature, appears (gains text)
//! asynchronously after a fill, may stream partial content before settling,
//! and retains stale text briefly after a clear. Fault knobs cover the
//! failure paths: a target that never renders, duplicate non-empty panels,
//! and sessions that cannot be opened.
//!
//! Time is read from the tokio clock, so tests running under a paused
//! runtime get exact, flake-free timing.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::errors::{Result, SthError};
use crate::surface::{
    ElementSnapshot, PageSnapshot, SessionFactory, SurfaceHandle, TargetSession,
};

/// Behavior knobs for the simulated page.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Accessible label carried by the editable input.
    pub input_label: String,
    /// Delay between a fill and the output panel first gaining text.
    pub render_delay: Duration,
    /// After first render, window during which only partial text shows.
    /// Zero = final text appears in one step.
    pub stream_duration: Duration,
    /// After a clear, window during which the previous output lingers.
    pub clear_teardown: Duration,
    /// Always-empty panels sharing the structural signature.
    pub decoy_panels: usize,
    /// Render a second non-empty panel alongside the output (ambiguity).
    pub duplicate_output: bool,
    /// Never render any output text.
    pub never_render: bool,
    /// Inputs for which the output never renders (per-scenario fault).
    pub blackhole_inputs: Vec<String>,
    /// Fail every `reset` (environment-fatal path).
    pub fail_reset: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            input_label: "Input Your Singlish Text Here.".to_string(),
            render_delay: Duration::from_millis(300),
            stream_duration: Duration::ZERO,
            clear_teardown: Duration::from_millis(150),
            decoy_panels: 1,
            duplicate_output: false,
            never_render: false,
            blackhole_inputs: Vec::new(),
            fail_reset: false,
        }
    }
}

#[derive(Debug)]
struct SimState {
    generation: u64,
    input_text: String,
    /// When the current input was committed via `fill`.
    committed_at: Option<Instant>,
    /// Output text visible at the moment of the last clear, and when the
    /// clear happened — it lingers for `clear_teardown`.
    residue: Option<(String, Instant)>,
    resets: u64,
}

impl SimState {
    fn fresh(generation: u64) -> Self {
        Self {
            generation,
            input_text: String::new(),
            committed_at: None,
            residue: None,
            resets: 0,
        }
    }
}

/// One simulated browsing context. Implements [`TargetSession`].
pub struct SimTranslator {
    cfg: SimConfig,
    lexicon: Arc<HashMap<String, String>>,
    state: Mutex<SimState>,
}

impl SimTranslator {
    #[must_use]
    pub fn new(cfg: SimConfig, lexicon: Arc<HashMap<String, String>>) -> Self {
        Self {
            cfg,
            lexicon,
            state: Mutex::new(SimState::fresh(1)),
        }
    }

    /// Scripted session from (input, expected) pairs with default knobs.
    #[must_use]
    pub fn scripted<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::new(SimConfig::default(), Arc::new(pairs.into_iter().collect()))
    }

    /// Number of `reset` calls served (isolation assertions in tests).
    #[must_use]
    pub fn reset_count(&self) -> u64 {
        self.state.lock().resets
    }

    /// Unknown inputs echo back unchanged — mirrors the live target's
    /// pass-through behavior for untransliterable text.
    fn translate(&self, input: &str) -> String {
        self.lexicon
            .get(input)
            .cloned()
            .unwrap_or_else(|| input.to_string())
    }

    /// Output text visible at `now`, given the committed input.
    fn output_text(&self, state: &SimState, now: Instant) -> String {
        if self.cfg.never_render || self.cfg.blackhole_inputs.contains(&state.input_text) {
            return String::new();
        }
        if state.input_text.is_empty() {
            // Teardown window: stale output from before the clear.
            if let Some((residue, cleared_at)) = &state.residue {
                if now < *cleared_at + self.cfg.clear_teardown {
                    return residue.clone();
                }
            }
            return String::new();
        }
        let Some(committed_at) = state.committed_at else {
            return String::new();
        };
        let full = self.translate(&state.input_text);
        if now < committed_at + self.cfg.render_delay {
            return String::new();
        }
        if now < committed_at + self.cfg.render_delay + self.cfg.stream_duration {
            return partial_of(&full);
        }
        full
    }

    fn elements(&self, state: &SimState, now: Instant) -> Vec<ElementSnapshot> {
        let output = self.output_text(state, now);
        let mut elements = vec![
            ElementSnapshot {
                index: 0,
                editable: true,
                label: Some(self.cfg.input_label.clone()),
                text: state.input_text.clone(),
            },
            ElementSnapshot {
                index: 1,
                editable: false,
                label: None,
                text: output.clone(),
            },
        ];
        for _ in 0..self.cfg.decoy_panels {
            elements.push(ElementSnapshot {
                index: elements.len(),
                editable: false,
                label: None,
                text: String::new(),
            });
        }
        if self.cfg.duplicate_output && !output.is_empty() {
            elements.push(ElementSnapshot {
                index: elements.len(),
                editable: false,
                label: None,
                text: output,
            });
        }
        elements
    }

    fn check_generation(&self, state: &SimState, handle: &SurfaceHandle) -> Result<()> {
        if handle.generation != state.generation {
            return Err(SthError::StaleHandle {
                held: handle.generation,
                current: state.generation,
            });
        }
        Ok(())
    }

    fn editable_at(
        &self,
        state: &SimState,
        handle: &SurfaceHandle,
        now: Instant,
    ) -> Result<ElementSnapshot> {
        self.check_generation(state, handle)?;
        let elements = self.elements(state, now);
        let Some(element) = elements.into_iter().nth(handle.index) else {
            return Err(SthError::session(format!(
                "no element at index {}",
                handle.index
            )));
        };
        if !element.editable {
            return Err(SthError::session(format!(
                "element at index {} is not editable",
                handle.index
            )));
        }
        Ok(element)
    }
}

#[async_trait]
impl TargetSession for SimTranslator {
    async fn reset(&self) -> Result<()> {
        if self.cfg.fail_reset {
            return Err(SthError::session("simulated navigation failure"));
        }
        let mut state = self.state.lock();
        let resets = state.resets + 1;
        let generation = state.generation + 1;
        *state = SimState::fresh(generation);
        state.resets = resets;
        Ok(())
    }

    async fn snapshot(&self) -> Result<PageSnapshot> {
        let state = self.state.lock();
        Ok(PageSnapshot {
            generation: state.generation,
            elements: self.elements(&state, Instant::now()),
        })
    }

    async fn clear(&self, handle: &SurfaceHandle) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.editable_at(&state, handle, now)?;
        let visible = self.output_text(&state, now);
        state.residue = if visible.is_empty() {
            None
        } else {
            Some((visible, now))
        };
        state.input_text.clear();
        state.committed_at = None;
        Ok(())
    }

    async fn fill(&self, handle: &SurfaceHandle, text: &str) -> Result<()> {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.editable_at(&state, handle, now)?;
        state.input_text = text.to_string();
        state.committed_at = Some(now);
        state.residue = None;
        Ok(())
    }

    async fn read_text(&self, handle: &SurfaceHandle) -> Result<String> {
        let state = self.state.lock();
        self.check_generation(&state, handle)?;
        let elements = self.elements(&state, Instant::now());
        elements
            .into_iter()
            .nth(handle.index)
            .map(|element| element.text)
            .ok_or_else(|| SthError::session(format!("no element at index {}", handle.index)))
    }

    async fn input_value(&self, handle: &SurfaceHandle) -> Result<String> {
        let now = Instant::now();
        let state = self.state.lock();
        let element = self.editable_at(&state, handle, now)?;
        Ok(element.text)
    }
}

/// Opens [`SimTranslator`] sessions sharing one scripted lexicon.
pub struct SimFactory {
    cfg: SimConfig,
    lexicon: Arc<HashMap<String, String>>,
    /// Fail every `open` (environment-fatal path).
    pub fail_open: bool,
}

impl SimFactory {
    #[must_use]
    pub fn new(cfg: SimConfig, lexicon: Arc<HashMap<String, String>>) -> Self {
        Self {
            cfg,
            lexicon,
            fail_open: false,
        }
    }

    #[must_use]
    pub fn scripted<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::new(SimConfig::default(), Arc::new(pairs.into_iter().collect()))
    }
}

#[async_trait]
impl SessionFactory for SimFactory {
    async fn open(&self) -> Result<Box<dyn TargetSession>> {
        if self.fail_open {
            return Err(SthError::session("simulated session-open failure"));
        }
        Ok(Box::new(SimTranslator::new(
            self.cfg.clone(),
            Arc::clone(&self.lexicon),
        )))
    }
}

/// First half of `full` on a char boundary, at least one char.
fn partial_of(full: &str) -> String {
    let chars: Vec<char> = full.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let keep = (chars.len() / 2).max(1);
    chars[..keep].iter().collect()
}
