//! Parser error types and helpers

use core_types::{ErrorKind, JsError, SourcePosition};

/// Create a syntax error at a given position
pub fn syntax_error(message: impl Into<String>, position: Option<SourcePosition>) -> JsError {
    JsError {
        kind: ErrorKind::SyntaxError,
        message: message.into(),
        stack: vec![],
        source_position: position,
    }
}

/// Create an unexpected token error
pub fn unexpected_token(got: &str, position: SourcePosition) -> JsError {
    syntax_error(format!("Unexpected token {}", got), Some(position))
}

/// Create an unexpected end of input error
pub fn unexpected_eof(position: SourcePosition) -> JsError {
    syntax_error("Unexpected end of input", Some(position))
}
