//! External collaborators reached through narrow interfaces
//!
//! The harness never fetches, serves or drives a browser itself. Scripts
//! reach these traits through host bindings; errors cross back as script
//! exceptions at the call site.

use crate::error::CollaboratorError;
use std::cell::RefCell;
use std::path::{Component, Path, PathBuf};

/// Default host for resource URLs
pub const DEFAULT_RESOURCE_HOST: &str = "localhost";
/// Default port for resource URLs
pub const DEFAULT_RESOURCE_PORT: u16 = 43336;

/// Maps a resource path to the URL a test should open
pub trait ResourceResolver {
    /// Resolve `path`, relative to `base_dir` when given
    fn resolve(&self, base_dir: Option<&Path>, path: &str) -> Result<String, CollaboratorError>;
}

/// Browser automation boundary
pub trait BrowserController {
    /// Navigate to `url`
    fn open(&self, url: &str) -> Result<(), CollaboratorError>;
    /// Block until the current page has loaded
    fn wait_for_page_load(&self) -> Result<(), CollaboratorError>;
}

/// A resource root registered through [`HttpResourceCollector`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredResource {
    /// Normalized directory path
    pub path: PathBuf,
    /// URL it is served under
    pub url: String,
}

/// Resolver producing `http://<host>:<port>/<last-dir-component>/` URLs.
///
/// Only computes URLs and remembers what was registered; nothing is
/// served.
///
/// # Examples
///
/// ```
/// use module_harness::{HttpResourceCollector, ResourceResolver};
/// use std::path::Path;
///
/// let collector = HttpResourceCollector::default();
/// let url = collector
///     .resolve(Some(Path::new("/tests/js/testFrame")), "../../test-files/")
///     .unwrap();
/// assert_eq!(url, "http://localhost:43336/test-files/");
/// ```
#[derive(Debug)]
pub struct HttpResourceCollector {
    host: String,
    port: u16,
    registered: RefCell<Vec<RegisteredResource>>,
}

impl HttpResourceCollector {
    /// Create a collector for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            registered: RefCell::new(Vec::new()),
        }
    }

    /// Host used in generated URLs
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port used in generated URLs
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resources registered so far, in registration order
    pub fn registered(&self) -> Vec<RegisteredResource> {
        self.registered.borrow().clone()
    }
}

impl Default for HttpResourceCollector {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_HOST, DEFAULT_RESOURCE_PORT)
    }
}

impl ResourceResolver for HttpResourceCollector {
    fn resolve(&self, base_dir: Option<&Path>, path: &str) -> Result<String, CollaboratorError> {
        if path.trim().is_empty() {
            return Err(CollaboratorError::EmptyResourcePath);
        }
        let joined = match base_dir {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        };
        let normalized = normalize(&joined);
        let url = match normalized.file_name() {
            Some(name) => format!(
                "http://{}:{}/{}/",
                self.host,
                self.port,
                name.to_string_lossy()
            ),
            None => format!("http://{}:{}/", self.host, self.port),
        };

        let mut registered = self.registered.borrow_mut();
        if !registered.iter().any(|r| r.path == normalized) {
            registered.push(RegisteredResource {
                path: normalized,
                url: url.clone(),
            });
        }
        Ok(url)
    }
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let stacked = matches!(out.components().next_back(), Some(Component::ParentDir));
                if stacked || !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// A call made on [`RecordingController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    /// `open(url)`
    Open(String),
    /// `wait_for_page_load()`
    WaitForPageLoad,
}

/// Headless controller that records calls instead of driving a browser
#[derive(Debug, Default)]
pub struct RecordingController {
    calls: RefCell<Vec<BrowserCall>>,
    fail_pattern: Option<String>,
}

impl RecordingController {
    /// Create a controller that accepts every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail for URLs containing `pattern`
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_pattern = Some(pattern.into());
        self
    }

    /// Calls recorded so far
    pub fn calls(&self) -> Vec<BrowserCall> {
        self.calls.borrow().clone()
    }
}

impl BrowserController for RecordingController {
    fn open(&self, url: &str) -> Result<(), CollaboratorError> {
        self.calls.borrow_mut().push(BrowserCall::Open(url.to_string()));
        match &self.fail_pattern {
            Some(pattern) if url.contains(pattern.as_str()) => Err(CollaboratorError::OpenFailed {
                url: url.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn wait_for_page_load(&self) -> Result<(), CollaboratorError> {
        self.calls.borrow_mut().push(BrowserCall::WaitForPageLoad);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_base() {
        let collector = HttpResourceCollector::new("127.0.0.1", 8080);
        assert_eq!(
            collector.resolve(None, "data/pages").unwrap(),
            "http://127.0.0.1:8080/pages/"
        );
    }

    #[test]
    fn test_resolve_registers_once() {
        let collector = HttpResourceCollector::default();
        let base = Path::new("/suite/js/testFrame");
        collector.resolve(Some(base), "../../test-files/").unwrap();
        collector.resolve(Some(base), "../../test-files").unwrap();

        let registered = collector.registered();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].path, PathBuf::from("/suite/test-files"));
    }

    #[test]
    fn test_resolve_empty_path_rejected() {
        let collector = HttpResourceCollector::default();
        assert_eq!(
            collector.resolve(None, "  "),
            Err(CollaboratorError::EmptyResourcePath)
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent() {
        assert_eq!(normalize(Path::new("../a/./b/..")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
    }

    #[test]
    fn test_recording_controller() {
        let controller = RecordingController::new().failing_on("broken");
        controller.open("http://localhost/ok").unwrap();
        controller.wait_for_page_load().unwrap();
        assert_eq!(
            controller.open("http://localhost/broken"),
            Err(CollaboratorError::OpenFailed {
                url: "http://localhost/broken".to_string()
            })
        );
        assert_eq!(
            controller.calls(),
            vec![
                BrowserCall::Open("http://localhost/ok".to_string()),
                BrowserCall::WaitForPageLoad,
                BrowserCall::Open("http://localhost/broken".to_string()),
            ]
        );
    }
}
