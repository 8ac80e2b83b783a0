//! Validation harness for synthesized interaction artifacts.
//!
//! [`ValidationHarness`] runs a static phase (lint, shape, syntax) and an
//! isolated execution phase on QuickJS. [`AuthoringSession`] keeps the last
//! accepted artifact and publishes only that.

pub mod engine;
pub mod error;
pub mod harness;
pub mod lint;
pub mod outcome;
pub mod scoring;
pub mod session;
pub mod shape;

pub use engine::{IsolatedEvaluator, QuickJsEvaluator, RenderReport, RenderRequest, ScriptError};
pub use error::{HarnessError, Result};
pub use harness::ValidationHarness;
pub use lint::{LintRulesConfig, StructureLinter};
pub use outcome::{ErrorKind, ValidationOutcome};
pub use scoring::{score_true_false, true_false_flags};
pub use session::AuthoringSession;
