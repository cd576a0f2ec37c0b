//! Integration test suite for the module harness
//!
//! Runs the fixture modules under `tests/fixtures` through the loader,
//! executor and batch runner together.

use std::path::PathBuf;

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use interpreter;
    pub use module_harness;
    pub use parser;
}

/// Directory holding the fixture modules
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
}

/// Path of one fixture module
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}
