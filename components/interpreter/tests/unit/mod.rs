//! Unit tests for interpreter components

use core_types::{ErrorKind, SourcePosition};
use interpreter::{CallFrame, Interpreter, ObjectKind, Value, DEFAULT_MAX_CALL_DEPTH};

// ============================================================================
// Interpreter Tests
// ============================================================================

#[test]
fn test_interpreter_creation() {
    let interp = Interpreter::new();
    assert_eq!(interp.call_depth(), 0);
    assert!(interp.source_url().is_none());
    // Standard globals are installed
    assert!(interp.get_global("Error").is_some());
    assert!(interp.get_global("console").is_some());
}

#[test]
fn test_interpreter_global_variables() {
    let mut interp = Interpreter::new();

    interp.define_global("x", Value::Number(10.0));
    interp.define_global("flag", Value::Boolean(true));

    assert_eq!(interp.get_global("x"), Some(Value::Number(10.0)));
    assert_eq!(interp.get_global("flag"), Some(Value::Boolean(true)));
    assert_eq!(interp.eval("x * 2;").unwrap(), Value::Number(20.0));
}

#[test]
fn test_interpreter_global_overwrite() {
    let mut interp = Interpreter::new();

    interp.define_global("x", Value::Number(10.0));
    interp.define_global("x", Value::Number(20.0));

    assert_eq!(interp.get_global("x"), Some(Value::Number(20.0)));
}

#[test]
fn test_script_globals_visible_to_host() {
    let mut interp = Interpreter::new();
    interp.eval("var fromVar = 1; implicit = 2; function named() {}").unwrap();

    assert_eq!(interp.get_global("fromVar"), Some(Value::Number(1.0)));
    assert_eq!(interp.get_global("implicit"), Some(Value::Number(2.0)));
    assert!(interp.get_global("named").unwrap().is_callable());
}

#[test]
fn test_call_function_from_host() {
    let mut interp = Interpreter::new();
    interp
        .eval("function greet(name) { return 'hello ' + name; }")
        .unwrap();

    let greet = interp.get_global("greet").unwrap();
    let result = interp
        .call_function(&greet, &Value::Undefined, &[Value::string("world")])
        .unwrap();
    assert_eq!(result, Value::string("hello world"));
}

#[test]
fn test_call_non_function_from_host() {
    let mut interp = Interpreter::new();
    let err = interp
        .call_function(&Value::Number(1.0), &Value::Undefined, &[])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn test_global_object_is_scope_view() {
    let mut interp = Interpreter::new();
    interp.eval("var shared = 'yes';").unwrap();

    let module = interp.global_object();
    let object = module.as_object().unwrap();
    assert!(matches!(object.borrow().kind, ObjectKind::Scope(_)));

    interp.define_global("module", module);
    assert_eq!(interp.eval("module.shared;").unwrap(), Value::string("yes"));
    interp.eval("module.created = 5;").unwrap();
    assert_eq!(interp.get_global("created"), Some(Value::Number(5.0)));
}

#[test]
fn test_default_call_depth() {
    assert_eq!(DEFAULT_MAX_CALL_DEPTH, 128);
}

// ============================================================================
// Native Function Tests
// ============================================================================

#[test]
fn test_native_function_receives_this_and_args() {
    let mut interp = Interpreter::new();
    let method = Value::native_function("describe", |_, this, args| {
        Ok(Value::string(format!(
            "{}:{}",
            this.type_of(),
            args.len()
        )))
    });
    let holder = Value::new_object();
    holder.as_object().unwrap().set("describe", method);
    interp.define_global("holder", holder);

    assert_eq!(
        interp.eval("holder.describe(1, 2);").unwrap(),
        Value::string("object:2")
    );
}

#[test]
fn test_native_error_gets_call_site_position() {
    let mut interp = Interpreter::new().with_source_url("file:///native.js");
    interp.define_global(
        "fail",
        Value::native_function("fail", |_, _, _| {
            Err(core_types::JsError::new(ErrorKind::Error, "host failure"))
        }),
    );

    let err = interp.eval("\n\n   fail();").unwrap_err();
    assert_eq!(err.message, "host failure");
    let pos = err.source_position.unwrap();
    assert_eq!((pos.line, pos.column), (3, 4));
    assert_eq!(err.stack.len(), 1);
    assert_eq!(err.stack[0].source_url.as_deref(), Some("file:///native.js"));
}

#[test]
fn test_native_error_is_catchable() {
    let mut interp = Interpreter::new();
    interp.define_global(
        "fail",
        Value::native_function("fail", |_, _, _| {
            Err(core_types::JsError::new(ErrorKind::AssertionError, "nope"))
        }),
    );

    let result = interp
        .eval("var r; try { fail(); } catch (e) { r = e instanceof AssertionError; } r;")
        .unwrap();
    assert_eq!(result, Value::Boolean(true));
}

// ============================================================================
// CallFrame Tests
// ============================================================================

#[test]
fn test_call_frame_snapshot() {
    let pos = SourcePosition {
        line: 4,
        column: 2,
        offset: 30,
    };
    let frame = CallFrame::new(None, pos);
    let entry = frame.to_stack_frame(None, pos);
    assert!(entry.function_name.is_none());
    assert_eq!(entry.to_string(), "@<anonymous>:4:2");
}
