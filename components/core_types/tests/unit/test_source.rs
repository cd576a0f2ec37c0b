//! Unit tests for SourcePosition and StackFrame

use core_types::{SourcePosition, StackFrame};

#[cfg(test)]
mod source_position_tests {
    use super::*;

    #[test]
    fn test_source_position_creation() {
        let pos = SourcePosition {
            line: 17,
            column: 21,
            offset: 412,
        };

        assert_eq!(pos.line, 17);
        assert_eq!(pos.column, 21);
        assert_eq!(pos.offset, 412);
    }

    #[test]
    fn test_source_position_is_copy() {
        let pos1 = SourcePosition {
            line: 42,
            column: 7,
            offset: 1000,
        };
        let pos2 = pos1;

        assert_eq!(pos1, pos2);
    }

    #[test]
    fn test_source_position_display_is_line_colon_column() {
        let pos = SourcePosition {
            line: 3,
            column: 14,
            offset: 60,
        };
        assert_eq!(pos.to_string(), "3:14");
    }

    #[test]
    fn test_source_position_serializes_all_fields() {
        let pos = SourcePosition {
            line: 1,
            column: 2,
            offset: 3,
        };
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(json, r#"{"line":1,"column":2,"offset":3}"#);
    }
}

#[cfg(test)]
mod stack_frame_tests {
    use super::*;

    #[test]
    fn test_stack_frame_display_named() {
        let frame = StackFrame {
            function_name: Some("setupModule".to_string()),
            source_url: Some("tests/testFoo.js".to_string()),
            line: 9,
            column: 24,
        };
        assert_eq!(frame.to_string(), "setupModule@tests/testFoo.js:9:24");
    }

    #[test]
    fn test_stack_frame_display_top_level() {
        let frame = StackFrame {
            function_name: None,
            source_url: Some("testFoo.js".to_string()),
            line: 5,
            column: 1,
        };
        assert_eq!(frame.to_string(), "@testFoo.js:5:1");
    }

    #[test]
    fn test_stack_frame_equality() {
        let a = StackFrame {
            function_name: Some("f".to_string()),
            source_url: None,
            line: 1,
            column: 1,
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.line = 2;
        assert_ne!(a, b);
    }
}
