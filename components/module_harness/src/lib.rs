//! Module test harness
//!
//! Loads script test modules, runs each through the lifecycle
//! `setupModule` → `test*` functions → `teardownModule`, and records every
//! failure as data instead of letting it escape:
//!
//! - a module that does not parse becomes a [`LoadFailure`] and never runs;
//! - a lifecycle step that throws becomes a [`RuntimeFailure`] and the
//!   executor moves on to the next step;
//! - every module yields exactly one [`RunResult`], and a batch
//!   ([`TestRun`]) always processes every scheduled module.
//!
//! # Examples
//!
//! ```
//! use module_harness::{Executor, ModuleLoader};
//!
//! let source = r#"
//!     function setupModule(module) { module.base = "http://localhost/"; }
//!     function testBase() { assert.equal(base, "http://localhost/"); }
//!     function testBroken() { test(); }
//! "#;
//!
//! let loaded = ModuleLoader::new().load(source, "testExample.js".into());
//! let result = Executor::new().run_loaded(loaded);
//!
//! assert_eq!(result.passed_count(), 1);
//! let failures = result.runtime_failures();
//! assert_eq!(failures[0].function_name(), "testBroken");
//! assert_eq!(failures[0].message, "test is not defined");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod executor;
pub mod failure;
pub mod host;
pub mod loader;
pub mod module;
pub mod report;
pub mod result;
pub mod run;

pub use cli::Cli;
pub use collaborators::{
    BrowserCall, BrowserController, HttpResourceCollector, RecordingController,
    RegisteredResource, ResourceResolver,
};
pub use config::HarnessConfig;
pub use error::{CollaboratorError, HarnessError, HarnessResult};
pub use executor::{Executor, ExecutorState};
pub use failure::{FailureCategory, LifecycleStep, LoadFailure, RuntimeFailure};
pub use host::HostBindings;
pub use loader::ModuleLoader;
pub use module::{DiscoveredTest, ModuleId, ScriptModule, StaticModule, StepResult, TestModule};
pub use report::{JsonReporter, Reporter, SummaryReporter, TestReport};
pub use result::{ModuleOutcome, RunResult, TestOutcome, TestStatus};
pub use run::{CancelToken, RunSummary, TestRun};
