//! Script error types.
//!
//! This module provides error types that correspond to the built-in error
//! constructors of the script dialect, along with stack trace information.

use crate::{SourcePosition, StackFrame};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of script error.
///
/// These correspond to the error constructors visible to test modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Plain `Error`, also used for thrown non-error values
    Error,
    /// Syntax error in module source
    SyntaxError,
    /// Type error (e.g., calling a non-function)
    TypeError,
    /// Reference to an undeclared variable
    ReferenceError,
    /// Value out of allowed range (including call depth exhaustion)
    RangeError,
    /// Failed `assert.*` call
    AssertionError,
    /// Failure raised by a host collaborator or the engine itself
    InternalError,
}

impl ErrorKind {
    /// The constructor name as seen by scripts.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::AssertionError => "AssertionError",
            ErrorKind::InternalError => "InternalError",
        }
    }

    /// Map a constructor name back to its kind.
    ///
    /// Unknown names map to `None`; callers usually fall back to
    /// [`ErrorKind::Error`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Error" => Some(ErrorKind::Error),
            "SyntaxError" => Some(ErrorKind::SyntaxError),
            "TypeError" => Some(ErrorKind::TypeError),
            "ReferenceError" => Some(ErrorKind::ReferenceError),
            "RangeError" => Some(ErrorKind::RangeError),
            "AssertionError" => Some(ErrorKind::AssertionError),
            "InternalError" => Some(ErrorKind::InternalError),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script error with message and stack trace.
///
/// Raised by the parser (always [`ErrorKind::SyntaxError`]) and by the
/// interpreter for anything thrown while running module code.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError, SourcePosition};
///
/// let error = JsError::new(ErrorKind::SyntaxError, "Unexpected token ;")
///     .with_position(SourcePosition { line: 17, column: 21, offset: 412 });
///
/// assert_eq!(error.message, "Unexpected token ;");
/// assert_eq!(error.source_position.unwrap().line, 17);
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Stack trace (call stack at the time of the error, innermost first)
    pub stack: Vec<StackFrame>,
    /// Source position where the error occurred
    pub source_position: Option<SourcePosition>,
}

impl JsError {
    /// Create an error with no position or stack.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
            source_position: None,
        }
    }

    /// Attach the position where the error was raised.
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.source_position = Some(position);
        self
    }

    /// Attach a captured call stack.
    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        self.stack = stack;
        self
    }

    /// Whether this error was produced while parsing.
    pub fn is_syntax_error(&self) -> bool {
        self.kind == ErrorKind::SyntaxError
    }
}
