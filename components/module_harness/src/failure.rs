//! Structured failure records
//!
//! Failures are converted into these records at the boundary where they
//! happen: the loader produces [`LoadFailure`], the executor produces
//! [`RuntimeFailure`]. Neither is ever propagated as a Rust error.

use crate::module::ModuleId;
use core_types::{ErrorKind, JsError, SourcePosition, StackFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name recorded for failures in module top-level code
pub const MODULE_SCOPE_NAME: &str = "<module>";
/// Name of the setup hook
pub const SETUP_HOOK: &str = "setupModule";
/// Name of the teardown hook
pub const TEARDOWN_HOOK: &str = "teardownModule";

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCategory {
    /// Module source could not be parsed
    SyntaxError,
    /// Module file could not be read
    IoError,
    /// A lifecycle step threw
    RuntimeError,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCategory::SyntaxError => "SyntaxError",
            FailureCategory::IoError => "IoError",
            FailureCategory::RuntimeError => "RuntimeError",
        };
        f.write_str(name)
    }
}

/// One step of a module's lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStep {
    /// Module top-level code
    Initialize,
    /// `setupModule`
    Setup,
    /// A test function
    Test(String),
    /// `teardownModule`
    Teardown,
}

impl LifecycleStep {
    /// Function name a failure in this step is attributed to
    pub fn function_name(&self) -> &str {
        match self {
            LifecycleStep::Initialize => MODULE_SCOPE_NAME,
            LifecycleStep::Setup => SETUP_HOOK,
            LifecycleStep::Test(name) => name,
            LifecycleStep::Teardown => TEARDOWN_HOOK,
        }
    }

    /// Whether this is `Initialize` or `Setup`, whose failure skips the tests
    pub fn is_setup_phase(&self) -> bool {
        matches!(self, LifecycleStep::Initialize | LifecycleStep::Setup)
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// A module that never became runnable
///
/// # Examples
///
/// ```
/// use module_harness::{FailureCategory, ModuleLoader};
///
/// let loader = ModuleLoader::new();
/// let failure = loader.load("var x = ;", "broken.js".into()).unwrap_err();
/// assert_eq!(failure.category, FailureCategory::SyntaxError);
/// assert_eq!(failure.to_string(), "broken.js:1:9: SyntaxError: Unexpected token ;");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFailure {
    /// Module that failed to load
    pub module_id: ModuleId,
    /// `SyntaxError` or `IoError`
    pub category: FailureCategory,
    /// Human-readable message
    pub message: String,
    /// Location of the offending token, when known
    pub location: Option<SourcePosition>,
}

impl LoadFailure {
    /// Record a parse failure
    pub fn syntax(module_id: ModuleId, error: &JsError) -> Self {
        Self {
            module_id,
            category: FailureCategory::SyntaxError,
            message: error.message.clone(),
            location: error.source_position,
        }
    }

    /// Record an unreadable module file
    pub fn io(module_id: ModuleId, error: &std::io::Error) -> Self {
        Self {
            module_id,
            category: FailureCategory::IoError,
            message: error.to_string(),
            location: None,
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(pos) => write!(
                f,
                "{}:{}: {}: {}",
                self.module_id, pos, self.category, self.message
            ),
            None => write!(f, "{}: {}: {}", self.module_id, self.category, self.message),
        }
    }
}

/// A lifecycle step that threw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeFailure {
    /// Module the step belongs to
    pub module_id: ModuleId,
    /// Which step failed
    pub step: LifecycleStep,
    /// Always `RuntimeError`
    pub category: FailureCategory,
    /// Script error kind behind the failure (`ReferenceError`, `TypeError`, ...)
    pub error_kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Where the error was raised, when known
    pub location: Option<SourcePosition>,
    /// Call stack at the point of the error, innermost first
    pub stack: Vec<StackFrame>,
}

impl RuntimeFailure {
    /// Record a script error thrown by `step`
    pub fn from_error(module_id: ModuleId, step: LifecycleStep, error: &JsError) -> Self {
        Self {
            module_id,
            step,
            category: FailureCategory::RuntimeError,
            error_kind: error.kind,
            message: error.message.clone(),
            location: error.source_position,
            stack: error.stack.clone(),
        }
    }

    /// Record a Rust panic raised inside a registered hook
    pub fn from_panic(module_id: ModuleId, step: LifecycleStep, message: String) -> Self {
        Self {
            module_id,
            step,
            category: FailureCategory::RuntimeError,
            error_kind: ErrorKind::InternalError,
            message,
            location: None,
            stack: Vec::new(),
        }
    }

    /// Name of the function the failure is attributed to
    pub fn function_name(&self) -> &str {
        self.step.function_name()
    }
}

impl fmt::Display for RuntimeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}: {}: {}",
            self.module_id,
            self.function_name(),
            self.error_kind,
            self.message
        )?;
        if let Some(pos) = &self.location {
            write!(f, " (at {})", pos)?;
        }
        Ok(())
    }
}
