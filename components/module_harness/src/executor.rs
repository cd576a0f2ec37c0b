//! Test executor
//!
//! Drives one [`TestModule`] through its lifecycle:
//!
//! ```text
//! NotStarted -> SetupRunning -> {SetupFailed | TestsRunning} -> TeardownRunning -> Completed
//! ```
//!
//! Every lifecycle step is isolated. A thrown script error or a panic in a
//! registered hook becomes a [`RuntimeFailure`] and the executor moves on.

use crate::failure::{LifecycleStep, LoadFailure, RuntimeFailure};
use crate::module::{ModuleId, StepResult, TestModule};
use crate::result::{ModuleOutcome, RunResult, TestOutcome, TestStatus};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Executor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorState {
    /// No module started
    NotStarted,
    /// Module code and `setupModule` running
    SetupRunning,
    /// Module code or `setupModule` threw; tests will not run
    SetupFailed,
    /// Test functions running
    TestsRunning,
    /// `teardownModule` running
    TeardownRunning,
    /// Lifecycle finished
    Completed,
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runs modules one at a time
#[derive(Debug)]
pub struct Executor {
    filter: Option<String>,
    state: ExecutorState,
    history: Vec<ExecutorState>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Executor that runs every test
    pub fn new() -> Self {
        Self {
            filter: None,
            state: ExecutorState::NotStarted,
            history: vec![ExecutorState::NotStarted],
        }
    }

    /// Only run tests whose name contains `filter`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Current state
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// States visited during the last run, starting with `NotStarted`
    pub fn history(&self) -> &[ExecutorState] {
        &self.history
    }

    /// Record the outcome of a load attempt, running the module if it loaded
    pub fn run_loaded<M: TestModule>(&mut self, loaded: Result<M, LoadFailure>) -> RunResult {
        match loaded {
            Ok(mut module) => self.run(&mut module),
            Err(failure) => {
                self.reset();
                RunResult::load_failed(failure)
            }
        }
    }

    /// Run `module` through its whole lifecycle
    pub fn run(&mut self, module: &mut dyn TestModule) -> RunResult {
        self.reset();
        let module_id = module.id().clone();
        let mut hook_failures = Vec::new();

        self.transition(&module_id, ExecutorState::SetupRunning);
        let mut failed_step = None;
        for step in [LifecycleStep::Initialize, LifecycleStep::Setup] {
            let outcome = invoke(&module_id, &step, || match step {
                LifecycleStep::Initialize => module.initialize(),
                _ => module.setup(),
            });
            if let Some(Err(failure)) = outcome {
                hook_failures.push(failure);
                failed_step = Some(step);
                break;
            }
        }

        let names: Vec<String> = module
            .test_names()
            .into_iter()
            .filter(|name| self.selects(name))
            .collect();

        let tests = match failed_step {
            Some(step) => {
                self.transition(&module_id, ExecutorState::SetupFailed);
                let reason = format!("{} failed", step.function_name());
                names
                    .into_iter()
                    .map(|name| TestOutcome {
                        name,
                        status: TestStatus::Skipped(reason.clone()),
                    })
                    .collect()
            }
            None => {
                self.transition(&module_id, ExecutorState::TestsRunning);
                names
                    .into_iter()
                    .map(|name| {
                        let step = LifecycleStep::Test(name.clone());
                        let status = match invoke(&module_id, &step, || Some(module.run_test(&name))) {
                            Some(Err(failure)) => TestStatus::Failed(failure),
                            _ => TestStatus::Passed,
                        };
                        TestOutcome { name, status }
                    })
                    .collect()
            }
        };

        self.transition(&module_id, ExecutorState::TeardownRunning);
        if let Some(Err(failure)) = invoke(&module_id, &LifecycleStep::Teardown, || module.teardown()) {
            hook_failures.push(failure);
        }
        self.transition(&module_id, ExecutorState::Completed);

        RunResult {
            module_id,
            outcome: ModuleOutcome::Ran {
                tests,
                hook_failures,
            },
        }
    }

    fn selects(&self, name: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |filter| name.contains(filter))
    }

    fn reset(&mut self) {
        self.state = ExecutorState::NotStarted;
        self.history.clear();
        self.history.push(ExecutorState::NotStarted);
    }

    fn transition(&mut self, module_id: &ModuleId, next: ExecutorState) {
        debug!(module = %module_id, from = %self.state, to = %next, "executor transition");
        self.state = next;
        self.history.push(next);
    }
}

/// Run one step, converting a thrown error or panic into a failure
fn invoke(
    module_id: &ModuleId,
    step: &LifecycleStep,
    f: impl FnOnce() -> Option<StepResult>,
) -> Option<Result<(), RuntimeFailure>> {
    let failure = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(None) => return None,
        Ok(Some(Ok(()))) => return Some(Ok(())),
        Ok(Some(Err(error))) => RuntimeFailure::from_error(module_id.clone(), step.clone(), &error),
        Err(payload) => {
            RuntimeFailure::from_panic(module_id.clone(), step.clone(), panic_message(payload.as_ref()))
        }
    };
    warn!(
        module = %module_id,
        step = %step,
        kind = %failure.error_kind,
        message = %failure.message,
        "lifecycle step failed"
    );
    Some(Err(failure))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
