//! Batch runner
//!
//! Runs modules strictly one after another. A module that fails to load or
//! fails at runtime never stops the batch; only infrastructure errors
//! (unwalkable directory, failing reporter) do.

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::executor::Executor;
use crate::loader::{ModuleLoader, TEST_PREFIX};
use crate::module::{ModuleId, TestModule};
use crate::report::{Reporter, TestReport};
use crate::result::RunResult;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Extension of module files picked up from directories
pub const MODULE_EXTENSION: &str = "js";

/// Shared flag a host sets to stop a batch between modules
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; modules already started still complete
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a batch produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One result per processed module, in run order
    pub results: Vec<RunResult>,
    /// Aggregate over `results`
    pub report: TestReport,
    /// Whether the batch stopped early on request
    pub cancelled: bool,
}

impl RunSummary {
    /// Whether every processed module passed
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

/// A borrowed reporter reports too
impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn module_finished(&mut self, result: &RunResult) -> HarnessResult<()> {
        (**self).module_finished(result)
    }

    fn run_finished(&mut self, report: &TestReport) -> HarnessResult<()> {
        (**self).run_finished(report)
    }
}

/// Sequential runner over many modules
///
/// # Examples
///
/// ```
/// use module_harness::{ModuleId, TestRun};
///
/// let summary = TestRun::new()
///     .run_sources(vec![
///         (ModuleId::new("broken.js"), "var x = ;"),
///         (ModuleId::new("fine.js"), "function testFine() {}"),
///     ])
///     .unwrap();
///
/// assert_eq!(summary.results.len(), 2);
/// assert_eq!(summary.report.load_failures, 1);
/// assert_eq!(summary.report.passed, 1);
/// ```
pub struct TestRun<'r> {
    loader: ModuleLoader,
    executor: Executor,
    cancel: CancelToken,
    reporters: Vec<Box<dyn Reporter + 'r>>,
}

impl Default for TestRun<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> TestRun<'r> {
    /// Runner with a default loader and executor
    pub fn new() -> Self {
        Self {
            loader: ModuleLoader::new(),
            executor: Executor::new(),
            cancel: CancelToken::new(),
            reporters: Vec::new(),
        }
    }

    /// Runner built from configuration
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new()
            .with_loader(config.loader())
            .with_executor(config.executor())
    }

    /// Replace the loader
    pub fn with_loader(mut self, loader: ModuleLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the executor
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Use `token` for cancellation
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Add a reporter
    pub fn with_reporter(mut self, reporter: impl Reporter + 'r) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    /// The cancellation token this run checks
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Load and run each `(id, source)` pair
    pub fn run_sources<I, S>(&mut self, sources: I) -> HarnessResult<RunSummary>
    where
        I: IntoIterator<Item = (ModuleId, S)>,
        S: AsRef<str>,
    {
        self.drive(sources, |loader, executor, (id, source)| {
            executor.run_loaded(loader.load(source.as_ref(), id))
        })
    }

    /// Run already constructed modules
    pub fn run_modules<M, I>(&mut self, modules: I) -> HarnessResult<RunSummary>
    where
        M: TestModule,
        I: IntoIterator<Item = M>,
    {
        self.drive(modules, |_, executor, mut module| executor.run(&mut module))
    }

    /// Run one module file, or every module file under a directory
    pub fn run_path(&mut self, path: &Path) -> HarnessResult<RunSummary> {
        let (root, files) = if path.is_dir() {
            (path.to_path_buf(), discover(path)?)
        } else {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (root, vec![path.to_path_buf()])
        };
        info!(path = %path.display(), modules = files.len(), "starting module run");

        self.drive(files, |loader, executor, file| {
            let id = ModuleId::from_path(&file, Some(&root));
            executor.run_loaded(loader.load_file(&file, id))
        })
    }

    fn drive<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        mut run_one: impl FnMut(&ModuleLoader, &mut Executor, T) -> RunResult,
    ) -> HarnessResult<RunSummary> {
        let mut results = Vec::new();
        let mut report = TestReport::new();
        let mut cancelled = false;

        for item in items {
            if self.cancel.is_cancelled() {
                warn!(completed = results.len(), "run cancelled");
                cancelled = true;
                break;
            }

            let result = run_one(&self.loader, &mut self.executor, item);
            info!(module = %result.module_id, summary = %result, "module finished");

            for reporter in &mut self.reporters {
                reporter.module_finished(&result)?;
            }
            report.add_result(&result);
            results.push(result);
        }

        for reporter in &mut self.reporters {
            reporter.run_finished(&report)?;
        }

        Ok(RunSummary {
            results,
            report,
            cancelled,
        })
    }
}

/// Module files under `dir`: `test*.js`, sorted by path
pub fn discover(dir: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_module_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_module_file(path: &Path) -> bool {
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEST_PREFIX));
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == MODULE_EXTENSION);
    has_prefix && has_extension
}
