//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, SourcePosition, StackFrame};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_display_uses_constructor_name() {
        assert_eq!(ErrorKind::SyntaxError.to_string(), "SyntaxError");
        assert_eq!(ErrorKind::ReferenceError.to_string(), "ReferenceError");
        assert_eq!(ErrorKind::AssertionError.to_string(), "AssertionError");
    }

    #[test]
    fn test_error_kind_from_unknown_name() {
        assert_eq!(ErrorKind::from_name("URIError"), None);
        assert_eq!(ErrorKind::from_name("TypeError"), Some(ErrorKind::TypeError));
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_js_error_builder_methods() {
        let error = JsError::new(ErrorKind::ReferenceError, "test is not defined")
            .with_position(SourcePosition {
                line: 20,
                column: 3,
                offset: 430,
            })
            .with_stack(vec![StackFrame {
                function_name: Some("testErrorConsole".to_string()),
                source_url: None,
                line: 20,
                column: 3,
            }]);

        assert_eq!(error.kind, ErrorKind::ReferenceError);
        assert_eq!(error.source_position.map(|p| p.line), Some(20));
        assert_eq!(error.stack.len(), 1);
    }

    #[test]
    fn test_js_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        let error = JsError::new(ErrorKind::Error, "boom");
        takes_error(&error);
        assert_eq!(error.to_string(), "Error: boom");
    }

    #[test]
    fn test_js_error_syntax_predicate() {
        assert!(JsError::new(ErrorKind::SyntaxError, "x").is_syntax_error());
        assert!(!JsError::new(ErrorKind::RangeError, "x").is_syntax_error());
    }

    #[test]
    fn test_js_error_json_round_trip_keeps_kind() {
        let error = JsError::new(ErrorKind::TypeError, "undefined is not a function");
        let json = serde_json::to_string(&error).unwrap();
        let back: JsError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, error);
    }
}
