//! Per-module run results

use crate::failure::{LoadFailure, RuntimeFailure};
use crate::module::ModuleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one test function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Returned without throwing
    Passed,
    /// Threw
    Failed(RuntimeFailure),
    /// Never invoked, with the reason
    Skipped(String),
}

/// Outcome of one test function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test function name
    pub name: String,
    /// What happened
    pub status: TestStatus,
}

impl TestOutcome {
    /// Whether the test passed
    pub fn is_passed(&self) -> bool {
        matches!(self.status, TestStatus::Passed)
    }
}

/// Terminal status of a module: it either never ran or it ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleOutcome {
    /// The module never became runnable
    LoadFailed(LoadFailure),
    /// The module went through its lifecycle
    Ran {
        /// Test outcomes in execution order
        tests: Vec<TestOutcome>,
        /// Failures of module code, `setupModule` or `teardownModule`
        hook_failures: Vec<RuntimeFailure>,
    },
}

/// Result of processing one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Module identifier
    pub module_id: ModuleId,
    /// Terminal status
    pub outcome: ModuleOutcome,
}

impl RunResult {
    /// Result for a module that failed to load
    pub fn load_failed(failure: LoadFailure) -> Self {
        Self {
            module_id: failure.module_id.clone(),
            outcome: ModuleOutcome::LoadFailed(failure),
        }
    }

    /// The load failure, if the module never ran
    pub fn load_failure(&self) -> Option<&LoadFailure> {
        match &self.outcome {
            ModuleOutcome::LoadFailed(failure) => Some(failure),
            ModuleOutcome::Ran { .. } => None,
        }
    }

    /// Test outcomes; empty when the module never ran
    pub fn tests(&self) -> &[TestOutcome] {
        match &self.outcome {
            ModuleOutcome::Ran { tests, .. } => tests,
            ModuleOutcome::LoadFailed(_) => &[],
        }
    }

    /// Hook failures; empty when the module never ran
    pub fn hook_failures(&self) -> &[RuntimeFailure] {
        match &self.outcome {
            ModuleOutcome::Ran { hook_failures, .. } => hook_failures,
            ModuleOutcome::LoadFailed(_) => &[],
        }
    }

    /// Number of passed tests
    pub fn passed_count(&self) -> usize {
        self.tests().iter().filter(|t| t.is_passed()).count()
    }

    /// Number of failed tests
    pub fn failed_count(&self) -> usize {
        self.tests()
            .iter()
            .filter(|t| matches!(t.status, TestStatus::Failed(_)))
            .count()
    }

    /// Number of skipped tests
    pub fn skipped_count(&self) -> usize {
        self.tests()
            .iter()
            .filter(|t| matches!(t.status, TestStatus::Skipped(_)))
            .count()
    }

    /// Every runtime failure in lifecycle order: setup phase, tests, teardown
    pub fn runtime_failures(&self) -> Vec<&RuntimeFailure> {
        let hooks = self.hook_failures();
        let tests = self.tests().iter().filter_map(|t| match &t.status {
            TestStatus::Failed(failure) => Some(failure),
            _ => None,
        });

        hooks
            .iter()
            .filter(|f| f.step.is_setup_phase())
            .chain(tests)
            .chain(hooks.iter().filter(|f| !f.step.is_setup_phase()))
            .collect()
    }

    /// Whether the module loaded and nothing failed
    pub fn is_success(&self) -> bool {
        self.load_failure().is_none() && self.runtime_failures().is_empty()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ModuleOutcome::LoadFailed(failure) => write!(f, "{}", failure),
            ModuleOutcome::Ran { hook_failures, .. } => {
                write!(
                    f,
                    "{}: {} passed, {} failed, {} skipped",
                    self.module_id,
                    self.passed_count(),
                    self.failed_count(),
                    self.skipped_count()
                )?;
                if !hook_failures.is_empty() {
                    write!(f, ", {} hook failure(s)", hook_failures.len())?;
                }
                Ok(())
            }
        }
    }
}
