//! Tree-walking interpreter for test module scripts
//!
//! This crate evaluates a parsed [`parser::Program`] directly:
//! - Lexical scopes with `var` hoisting and block-scoped `let`/`const`
//! - Closures, `new`, `try`/`catch`/`finally` and `throw`
//! - Errors carry a source position and a stack trace
//! - A call depth limit turns runaway recursion into a `RangeError`
//! - Host code can define globals, including native functions
//!
//! # Example
//!
//! ```
//! use interpreter::{Interpreter, Value};
//! use core_types::ErrorKind;
//!
//! let mut interp = Interpreter::new();
//! interp.define_global(
//!     "answer",
//!     Value::native_function("answer", |_, _, _| Ok(Value::Number(42.0))),
//! );
//!
//! let result = interp.eval("answer() + 1;").unwrap();
//! assert_eq!(result, Value::Number(43.0));
//!
//! let err = interp.eval("null.x;").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::TypeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builtins;
pub mod call_frame;
pub mod engine;
pub mod scope;
pub mod value;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use engine::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
pub use value::{Callable, NativeFn, ObjectKind, ObjectRef, Value};
