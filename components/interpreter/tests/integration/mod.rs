//! Integration tests for interpreter
//!
//! Tests parsing and evaluation together on module-shaped scripts

use core_types::ErrorKind;
use interpreter::{Interpreter, Value};
use parser::Parser;

const LIFECYCLE_MODULE: &str = r#"
var log = [];

function setupModule(module) {
  module.state = "ready";
  log.push("setup");
}

function testUsesState() {
  log.push("test:" + state);
}

function teardownModule(module) {
  log.push("teardown");
}
"#;

#[test]
fn test_module_lifecycle_calls_share_globals() {
    let program = Parser::new(LIFECYCLE_MODULE).parse().unwrap();
    let mut interp = Interpreter::new().with_source_url("file:///lifecycle.js");
    interp.run_program(&program).unwrap();

    let module = interp.global_object();
    for name in ["setupModule", "testUsesState", "teardownModule"] {
        let function = interp.get_global(name).unwrap();
        interp
            .call_function(&function, &Value::Undefined, &[module.clone()])
            .unwrap();
    }

    assert_eq!(
        interp.eval("log.join(',');").unwrap(),
        Value::string("setup,test:ready,teardown")
    );
}

#[test]
fn test_failure_in_called_function_reports_stack() {
    let source = "function setupModule() {}\n\nfunction testBroken() {\n  test();\n}\n";
    let program = Parser::new(source).parse().unwrap();
    let mut interp = Interpreter::new().with_source_url("file:///broken.js");
    interp.run_program(&program).unwrap();

    let test = interp.get_global("testBroken").unwrap();
    let err = interp
        .call_function(&test, &Value::Undefined, &[])
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ReferenceError);
    assert_eq!(err.message, "test is not defined");
    assert_eq!(err.stack.len(), 1);
    assert_eq!(err.stack[0].function_name.as_deref(), Some("testBroken"));
    assert_eq!(err.stack[0].line, 4);
    assert_eq!(err.stack[0].column, 3);
    assert_eq!(interp.call_depth(), 0);
}

#[test]
fn test_interpreter_usable_after_failure() {
    let mut interp = Interpreter::new();
    interp.eval("var count = 0; function bump() { count++; return count; }").unwrap();

    assert!(interp.eval("bump(); throw new Error('stop');").is_err());
    assert_eq!(interp.eval("bump();").unwrap(), Value::Number(2.0));
}

#[test]
fn test_thrown_error_object_kind_preserved() {
    let mut interp = Interpreter::new();
    let err = interp
        .eval("function check() { throw new RangeError('too big'); }\ncheck();")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(err.message, "too big");
    assert_eq!(err.source_position.unwrap().line, 1);
}

#[test]
fn test_thrown_primitive_becomes_error() {
    let mut interp = Interpreter::new();
    let err = interp.eval("throw 'plain string';").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Error);
    assert_eq!(err.message, "plain string");
}

#[test]
fn test_separate_interpreters_do_not_share_globals() {
    let mut first = Interpreter::new();
    let mut second = Interpreter::new();
    first.eval("var leaked = true;").unwrap();

    let err = second.eval("leaked;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReferenceError);
}

#[test]
fn test_runaway_recursion_is_range_error() {
    let mut interp = Interpreter::new().with_max_call_depth(32);
    interp.eval("function spin(n) { return spin(n + 1); }").unwrap();
    let spin = interp.get_global("spin").unwrap();

    let err = interp
        .call_function(&spin, &Value::Undefined, &[Value::Number(0.0)])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RangeError);
    assert_eq!(err.message, "Maximum call stack size exceeded");
    assert_eq!(err.stack.len(), 32);
}

#[test]
fn test_object_and_array_programs() {
    let source = r#"
        var page = { url: "http://localhost:43336/frame/", loads: 0 };
        var visited = [];
        function open(p) { p.loads += 1; visited.push(p.url); return p; }
        open(page);
        open(page);
        page.loads + ":" + visited.length + ":" + ("url" in page);
    "#;
    let mut interp = Interpreter::new();
    assert_eq!(interp.eval(source).unwrap(), Value::string("2:2:true"));
}
