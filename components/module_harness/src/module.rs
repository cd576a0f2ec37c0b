//! The lifecycle contract and its two implementations
//!
//! [`TestModule`] is what the executor drives. [`ScriptModule`] is produced
//! by the loader from script source; [`StaticModule`] registers the same
//! lifecycle from Rust closures.

use crate::failure::{SETUP_HOOK, TEARDOWN_HOOK};
use crate::host::HostBindings;
use core_types::{ErrorKind, JsError, SourcePosition};
use interpreter::{Interpreter, Value};
use parser::Program;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable identifier of a test module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create an identifier from a logical name
    pub fn new(name: impl Into<String>) -> Self {
        ModuleId(name.into())
    }

    /// Identifier for a file, relative to `root` when it lies under it.
    ///
    /// Components are joined with `/` on every platform.
    pub fn from_path(path: &Path, root: Option<&Path>) -> Self {
        let relative = root
            .and_then(|root| path.strip_prefix(root).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .unwrap_or(path);
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        ModuleId(name)
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        ModuleId::new(name)
    }
}

impl From<String> for ModuleId {
    fn from(name: String) -> Self {
        ModuleId(name)
    }
}

/// Outcome of one lifecycle invocation
pub type StepResult = Result<(), JsError>;

/// A module the executor can run.
///
/// Hook methods return `None` when the module has no such hook.
pub trait TestModule {
    /// Module identifier
    fn id(&self) -> &ModuleId;

    /// Test names in declaration order
    fn test_names(&self) -> Vec<String>;

    /// Evaluate module top-level code
    fn initialize(&mut self) -> Option<StepResult> {
        None
    }

    /// Run `setupModule`
    fn setup(&mut self) -> Option<StepResult> {
        None
    }

    /// Run one test function
    fn run_test(&mut self, name: &str) -> StepResult;

    /// Run `teardownModule`
    fn teardown(&mut self) -> Option<StepResult> {
        None
    }
}

type Hook = Box<dyn FnMut() -> StepResult>;

/// Module registered from Rust closures
///
/// # Examples
///
/// ```
/// use module_harness::{Executor, StaticModule};
///
/// let mut module = StaticModule::new("static")
///     .setup(|| Ok(()))
///     .test("testAlwaysPasses", || Ok(()));
///
/// let result = Executor::new().run(&mut module);
/// assert_eq!(result.passed_count(), 1);
/// ```
pub struct StaticModule {
    id: ModuleId,
    setup: Option<Hook>,
    tests: Vec<(String, Hook)>,
    teardown: Option<Hook>,
}

impl StaticModule {
    /// Create an empty module
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            setup: None,
            tests: Vec::new(),
            teardown: None,
        }
    }

    /// Register the setup hook
    pub fn setup(mut self, hook: impl FnMut() -> StepResult + 'static) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Register a test. Re-registering a name replaces its body in place.
    pub fn test(mut self, name: impl Into<String>, body: impl FnMut() -> StepResult + 'static) -> Self {
        let name = name.into();
        match self.tests.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = Box::new(body),
            None => self.tests.push((name, Box::new(body))),
        }
        self
    }

    /// Register the teardown hook
    pub fn teardown(mut self, hook: impl FnMut() -> StepResult + 'static) -> Self {
        self.teardown = Some(Box::new(hook));
        self
    }
}

impl TestModule for StaticModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn test_names(&self) -> Vec<String> {
        self.tests.iter().map(|(name, _)| name.clone()).collect()
    }

    fn setup(&mut self) -> Option<StepResult> {
        self.setup.as_mut().map(|hook| hook())
    }

    fn run_test(&mut self, name: &str) -> StepResult {
        match self.tests.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, body)) => body(),
            None => Err(JsError::new(
                ErrorKind::ReferenceError,
                format!("{} is not defined", name),
            )),
        }
    }

    fn teardown(&mut self) -> Option<StepResult> {
        self.teardown.as_mut().map(|hook| hook())
    }
}

impl fmt::Debug for StaticModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticModule")
            .field("id", &self.id)
            .field("setup", &self.setup.is_some())
            .field("tests", &self.test_names())
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// A test function found by static inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTest {
    /// Function name
    pub name: String,
    /// Position of its first declaration
    pub position: SourcePosition,
}

/// A parsed script module.
///
/// Nothing runs until the executor calls [`TestModule::initialize`], which
/// creates a fresh interpreter for this module. The interpreter is dropped
/// once teardown has run.
pub struct ScriptModule {
    id: ModuleId,
    program: Program,
    source_url: String,
    base_dir: Option<PathBuf>,
    tests: Vec<DiscoveredTest>,
    has_setup: bool,
    has_teardown: bool,
    host: HostBindings,
    max_call_depth: usize,
    interpreter: Option<Interpreter>,
}

impl ScriptModule {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ModuleId,
        program: Program,
        source_url: String,
        base_dir: Option<PathBuf>,
        tests: Vec<DiscoveredTest>,
        hooks: (bool, bool),
        host: HostBindings,
        max_call_depth: usize,
    ) -> Self {
        Self {
            id,
            program,
            source_url,
            base_dir,
            tests,
            has_setup: hooks.0,
            has_teardown: hooks.1,
            host,
            max_call_depth,
            interpreter: None,
        }
    }

    /// Discovered tests in declaration order
    pub fn tests(&self) -> &[DiscoveredTest] {
        &self.tests
    }

    /// Whether `setupModule` is declared
    pub fn has_setup(&self) -> bool {
        self.has_setup
    }

    /// Whether `teardownModule` is declared
    pub fn has_teardown(&self) -> bool {
        self.has_teardown
    }

    /// URL recorded in stack frames
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Directory relative resources resolve against
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn start_interpreter(&mut self) -> StepResult {
        let mut interp = Interpreter::new()
            .with_source_url(self.source_url.clone())
            .with_max_call_depth(self.max_call_depth);
        self.host.install(&mut interp, self.base_dir.clone());
        let result = interp.run_program(&self.program).map(|_| ());
        self.interpreter = Some(interp);
        result
    }

    fn interpreter(&mut self) -> Result<&mut Interpreter, JsError> {
        if self.interpreter.is_none() {
            self.start_interpreter()?;
        }
        self.interpreter.as_mut().ok_or_else(|| {
            JsError::new(ErrorKind::InternalError, "module interpreter unavailable")
        })
    }

    fn call_global(&mut self, name: &str, with_module: bool) -> StepResult {
        let interp = self.interpreter()?;
        let function = interp.get_global(name).ok_or_else(|| {
            JsError::new(ErrorKind::ReferenceError, format!("{} is not defined", name))
        })?;
        if !function.is_callable() {
            return Err(JsError::new(
                ErrorKind::TypeError,
                format!("{} is not a function", name),
            ));
        }
        let args = if with_module {
            vec![interp.global_object()]
        } else {
            Vec::new()
        };
        interp.call_function(&function, &Value::Undefined, &args)?;
        Ok(())
    }
}

impl TestModule for ScriptModule {
    fn id(&self) -> &ModuleId {
        &self.id
    }

    fn test_names(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.name.clone()).collect()
    }

    fn initialize(&mut self) -> Option<StepResult> {
        Some(self.start_interpreter())
    }

    fn setup(&mut self) -> Option<StepResult> {
        self.has_setup.then(|| self.call_global(SETUP_HOOK, true))
    }

    fn run_test(&mut self, name: &str) -> StepResult {
        self.call_global(name, false)
    }

    fn teardown(&mut self) -> Option<StepResult> {
        let result = self
            .has_teardown
            .then(|| self.call_global(TEARDOWN_HOOK, true));
        self.interpreter = None;
        result
    }
}

impl fmt::Debug for ScriptModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptModule")
            .field("id", &self.id)
            .field("source_url", &self.source_url)
            .field("tests", &self.tests)
            .field("has_setup", &self.has_setup)
            .field("has_teardown", &self.has_teardown)
            .finish()
    }
}
