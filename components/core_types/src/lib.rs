//! Error and source-location types shared by the script engine and the
//! module harness.
//!
//! # Overview
//!
//! - [`JsError`] - Script errors with stack traces
//! - [`ErrorKind`] - Types of script errors
//! - [`SourcePosition`] - Source code location
//! - [`StackFrame`] - Call stack frame information
//! - [`ensure_sufficient_stack`] - Stack growth for deep recursion
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError};
//!
//! let error = JsError::new(ErrorKind::ReferenceError, "test is not defined");
//! assert_eq!(error.to_string(), "ReferenceError: test is not defined");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod stack;

pub use error::{ErrorKind, JsError};
pub use source::{SourcePosition, StackFrame};
pub use stack::ensure_sufficient_stack;
