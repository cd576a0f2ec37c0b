//! Module loader
//!
//! Parses module source and inspects its top-level declarations. No script
//! code runs here; a parse error comes back as a [`LoadFailure`].

use crate::failure::{LoadFailure, SETUP_HOOK, TEARDOWN_HOOK};
use crate::host::HostBindings;
use crate::module::{DiscoveredTest, ModuleId, ScriptModule};
use interpreter::DEFAULT_MAX_CALL_DEPTH;
use parser::Program;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix that marks a top-level function as a test
pub const TEST_PREFIX: &str = "test";

/// Turns module source into a [`ScriptModule`] or a [`LoadFailure`]
#[derive(Clone, Default)]
pub struct ModuleLoader {
    host: HostBindings,
    max_call_depth: Option<usize>,
}

impl ModuleLoader {
    /// Loader with default host bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `host` for modules loaded from now on
    pub fn with_host(mut self, host: HostBindings) -> Self {
        self.host = host;
        self
    }

    /// Call depth limit for module interpreters
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = Some(depth);
        self
    }

    /// Parse `source` as module `id`
    pub fn load(&self, source: &str, id: ModuleId) -> Result<ScriptModule, LoadFailure> {
        let source_url = id.to_string();
        self.build(source, id, source_url, None)
    }

    /// Read and parse the module file at `path`.
    ///
    /// An unreadable file is an `IoError` load failure. Relative resource
    /// paths resolve against the file's directory.
    pub fn load_file(&self, path: &Path, id: ModuleId) -> Result<ScriptModule, LoadFailure> {
        let source = std::fs::read_to_string(path).map_err(|err| {
            warn!(module = %id, path = %path.display(), error = %err, "module unreadable");
            LoadFailure::io(id.clone(), &err)
        })?;
        let base_dir = path.parent().map(Path::to_path_buf);
        self.build(&source, id, path.display().to_string(), base_dir)
    }

    fn build(
        &self,
        source: &str,
        id: ModuleId,
        source_url: String,
        base_dir: Option<PathBuf>,
    ) -> Result<ScriptModule, LoadFailure> {
        let program = parser::parse_program(source).map_err(|err| {
            let failure = LoadFailure::syntax(id.clone(), &err);
            warn!(module = %id, failure = %failure, "module failed to parse");
            failure
        })?;

        let (tests, has_setup, has_teardown) = discover(&program);
        debug!(
            module = %id,
            tests = tests.len(),
            has_setup,
            has_teardown,
            "module loaded"
        );

        Ok(ScriptModule::new(
            id,
            program,
            source_url,
            base_dir,
            tests,
            (has_setup, has_teardown),
            self.host.clone(),
            self.max_call_depth.unwrap_or(DEFAULT_MAX_CALL_DEPTH),
        ))
    }
}

/// Collect lifecycle hooks and `test*` functions from top-level declarations.
///
/// A repeated test name keeps its first position.
fn discover(program: &Program) -> (Vec<DiscoveredTest>, bool, bool) {
    let mut tests: Vec<DiscoveredTest> = Vec::new();
    let mut has_setup = false;
    let mut has_teardown = false;

    for def in program.function_declarations() {
        let Some(name) = def.name.as_deref() else {
            continue;
        };
        if name == SETUP_HOOK {
            has_setup = true;
        } else if name == TEARDOWN_HOOK {
            has_teardown = true;
        } else if name.starts_with(TEST_PREFIX) && !tests.iter().any(|t| t.name == name) {
            tests.push(DiscoveredTest {
                name: name.to_string(),
                position: def.position,
            });
        }
    }

    (tests, has_setup, has_teardown)
}
