//! Call frame for function call stack management

use core_types::{SourcePosition, StackFrame};

/// Call frame representing an active function invocation
///
/// Pushed when a script function is entered and popped when it returns,
/// normally or by throwing. `current` tracks the statement or call being
/// evaluated so stack traces point at the right line.
#[derive(Debug, Clone, PartialEq)]
pub struct CallFrame {
    /// Name of the executing function (None for top-level code and
    /// anonymous functions)
    pub function_name: Option<String>,
    /// Position currently being evaluated in this frame
    pub current: SourcePosition,
}

impl CallFrame {
    /// Create a new call frame starting at `position`
    pub fn new(function_name: Option<String>, position: SourcePosition) -> Self {
        Self {
            function_name,
            current: position,
        }
    }

    /// Snapshot as a stack trace entry at `position`
    pub fn to_stack_frame(&self, source_url: Option<&str>, position: SourcePosition) -> StackFrame {
        StackFrame {
            function_name: self.function_name.clone(),
            source_url: source_url.map(str::to_string),
            line: position.line,
            column: position.column,
        }
    }
}
