//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use singlish_translit_harness::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SthError, WaitPhase};

// Surface
pub use crate::surface::{
    ElementSnapshot, PageSnapshot, Role, SessionFactory, SurfaceHandle, TargetSession,
};

// Protocol
pub use crate::driver::InteractionDriver;
pub use crate::locator::{LocatorResolver, OutputResolution};
pub use crate::wait::{ConditionWaiter, WaitOutcome};

// Scenarios
pub use crate::fixtures::{Catalog, Scenario};
pub use crate::runner::{Outcome, RunReport, RunResult, ScenarioRunner};
