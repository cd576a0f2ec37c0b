//! Harness configuration
//!
//! Loaded from YAML; every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! test_path: tests/js
//! filter: Frame
//! report_path: target/module-report.json
//! resource_host: localhost
//! resource_port: 43336
//! max_call_depth: 128
//! log_level: debug
//! log_file: target/module-run.log
//! ```

use crate::collaborators::{
    HttpResourceCollector, RecordingController, DEFAULT_RESOURCE_HOST, DEFAULT_RESOURCE_PORT,
};
use crate::error::{HarnessError, HarnessResult};
use crate::executor::Executor;
use crate::host::HostBindings;
use crate::loader::ModuleLoader;
use interpreter::DEFAULT_MAX_CALL_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Accepted `log_level` values
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Harness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Module file or directory of modules
    pub test_path: Option<PathBuf>,
    /// Only run tests whose name contains this
    pub filter: Option<String>,
    /// Where to write the JSON report
    pub report_path: Option<PathBuf>,
    /// Host used in resource URLs
    pub resource_host: String,
    /// Port used in resource URLs
    pub resource_port: u16,
    /// Script call depth limit
    pub max_call_depth: usize,
    /// Log filter directive
    pub log_level: String,
    /// Send log output here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_path: None,
            filter: None,
            report_path: None,
            resource_host: DEFAULT_RESOURCE_HOST.to_string(),
            resource_port: DEFAULT_RESOURCE_PORT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl HarnessConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let config: HarnessConfig = if yaml.trim().is_empty() {
            HarnessConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|err| HarnessError::io(path, err))?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject values the harness cannot use
    pub fn validate(&self) -> HarnessResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(HarnessError::InvalidValue {
                field: "log_level",
                value: self.log_level.clone(),
            });
        }
        if self.max_call_depth == 0 {
            return Err(HarnessError::InvalidValue {
                field: "max_call_depth",
                value: self.max_call_depth.to_string(),
            });
        }
        if self.resource_host.trim().is_empty() {
            return Err(HarnessError::InvalidValue {
                field: "resource_host",
                value: self.resource_host.clone(),
            });
        }
        Ok(())
    }

    /// Resource collector for the configured host and port
    pub fn collector(&self) -> HttpResourceCollector {
        HttpResourceCollector::new(self.resource_host.clone(), self.resource_port)
    }

    /// Loader using the configured collector, a recording browser
    /// controller and the configured depth limit
    pub fn loader(&self) -> ModuleLoader {
        let host = HostBindings::new(
            Rc::new(self.collector()),
            Rc::new(RecordingController::new()),
        );
        ModuleLoader::new()
            .with_host(host)
            .with_max_call_depth(self.max_call_depth)
    }

    /// Executor applying the configured filter
    pub fn executor(&self) -> Executor {
        match &self.filter {
            Some(filter) => Executor::new().with_filter(filter.clone()),
            None => Executor::new(),
        }
    }
}
