//! Unit tests for the executor lifecycle

use core_types::{ErrorKind, JsError};
use module_harness::{
    Executor, ExecutorState, LifecycleStep, ModuleLoader, StaticModule, TestStatus,
};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, entry: &str) -> impl FnMut() -> Result<(), JsError> + 'static {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move || {
        log.borrow_mut().push(entry.clone());
        Ok(())
    }
}

fn thrower(log: &Log, entry: &str) -> impl FnMut() -> Result<(), JsError> + 'static {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move || {
        log.borrow_mut().push(entry.clone());
        Err(JsError::new(ErrorKind::Error, format!("{} threw", entry)))
    }
}

// ============================================================================
// Ordering Tests
// ============================================================================

#[test]
fn test_lifecycle_order() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("ordered")
        .setup(recorder(&log, "setup"))
        .test("testOne", recorder(&log, "testOne"))
        .test("testTwo", recorder(&log, "testTwo"))
        .teardown(recorder(&log, "teardown"));

    let result = Executor::new().run(&mut module);

    assert_eq!(
        *log.borrow(),
        vec!["setup", "testOne", "testTwo", "teardown"]
    );
    assert_eq!(result.passed_count(), 2);
    assert!(result.is_success());
}

#[test]
fn test_every_test_attempted_after_failures() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("mixed")
        .test("testFirst", thrower(&log, "testFirst"))
        .test("testSecond", recorder(&log, "testSecond"))
        .test("testThird", thrower(&log, "testThird"));

    let result = Executor::new().run(&mut module);

    assert_eq!(*log.borrow(), vec!["testFirst", "testSecond", "testThird"]);
    assert_eq!(result.passed_count(), 1);
    assert_eq!(result.failed_count(), 2);
    let names: Vec<_> = result.tests().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["testFirst", "testSecond", "testThird"]);
}

// ============================================================================
// Setup Failure Tests
// ============================================================================

#[test]
fn test_setup_failure_skips_tests_and_runs_teardown() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("setup-fails")
        .setup(thrower(&log, "setup"))
        .test("testA", recorder(&log, "testA"))
        .test("testB", recorder(&log, "testB"))
        .teardown(recorder(&log, "teardown"));

    let mut executor = Executor::new();
    let result = executor.run(&mut module);

    assert_eq!(*log.borrow(), vec!["setup", "teardown"]);
    assert_eq!(result.passed_count(), 0);
    assert_eq!(result.skipped_count(), 2);

    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, LifecycleStep::Setup);
    assert_eq!(failures[0].function_name(), "setupModule");
    assert_eq!(failures[0].message, "setup threw");

    assert_eq!(
        executor.history(),
        &[
            ExecutorState::NotStarted,
            ExecutorState::SetupRunning,
            ExecutorState::SetupFailed,
            ExecutorState::TeardownRunning,
            ExecutorState::Completed,
        ]
    );
}

#[test]
fn test_setup_and_teardown_failures_both_recorded() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("both-fail")
        .setup(thrower(&log, "setup"))
        .test("testA", recorder(&log, "testA"))
        .teardown(thrower(&log, "teardown"));

    let result = Executor::new().run(&mut module);

    let steps: Vec<_> = result
        .runtime_failures()
        .iter()
        .map(|f| f.function_name().to_string())
        .collect();
    assert_eq!(steps, vec!["setupModule", "teardownModule"]);
    assert_eq!(log.borrow().iter().filter(|e| *e == "setup").count(), 1);
}

// ============================================================================
// Teardown Tests
// ============================================================================

#[test]
fn test_teardown_runs_once_after_test_failure() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("teardown-once")
        .test("testFails", thrower(&log, "testFails"))
        .teardown(recorder(&log, "teardown"));

    let result = Executor::new().run(&mut module);

    assert_eq!(log.borrow().iter().filter(|e| *e == "teardown").count(), 1);
    assert_eq!(result.failed_count(), 1);
    assert!(result.hook_failures().is_empty());
}

#[test]
fn test_teardown_failure_keeps_test_results() {
    let log: Log = Rc::default();
    let mut module = StaticModule::new("teardown-fails")
        .test("testPasses", recorder(&log, "testPasses"))
        .teardown(thrower(&log, "teardown"));

    let result = Executor::new().run(&mut module);

    assert_eq!(result.passed_count(), 1);
    assert_eq!(result.hook_failures().len(), 1);
    assert_eq!(result.hook_failures()[0].step, LifecycleStep::Teardown);
    assert!(!result.is_success());
}

#[test]
fn test_panicking_teardown_is_recorded() {
    let mut module = StaticModule::new("panics")
        .test("testA", || Ok(()))
        .teardown(|| panic!("teardown exploded"));

    let mut executor = Executor::new();
    let result = executor.run(&mut module);

    assert_eq!(executor.state(), ExecutorState::Completed);
    assert_eq!(result.hook_failures()[0].error_kind, ErrorKind::InternalError);
    assert_eq!(result.hook_failures()[0].message, "teardown exploded");
}

// ============================================================================
// Script Module Tests
// ============================================================================

#[test]
fn test_undefined_call_scenario() {
    let source = "function setupModule(module) {\n}\n\nfunction testX() {\n  test();\n}\n";
    let loaded = ModuleLoader::new().load(source, "testX.js".into());
    let result = Executor::new().run_loaded(loaded);

    assert_eq!(result.passed_count(), 0);
    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].function_name(), "testX");
    assert_eq!(failures[0].error_kind, ErrorKind::ReferenceError);
    assert_eq!(failures[0].message, "test is not defined");
    let location = failures[0].location.unwrap();
    assert_eq!((location.line, location.column), (5, 3));
}

#[test]
fn test_top_level_failure_attributed_to_module() {
    let source = "var config = loadConfig();\n\
                  function setupModule() { marker(); }\n\
                  function testA() {}\n\
                  function teardownModule() {}\n";
    let mut executor = Executor::new();
    let result = executor.run_loaded(ModuleLoader::new().load(source, "init.js".into()));

    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, LifecycleStep::Initialize);
    assert_eq!(failures[0].function_name(), "<module>");
    assert_eq!(
        result.tests()[0].status,
        TestStatus::Skipped("<module> failed".to_string())
    );
    assert!(executor.history().contains(&ExecutorState::SetupFailed));
}

#[test]
fn test_assertion_failure_is_runtime_failure() {
    let source = "function testMath() { assert.equal(1 + 1, 3, 'math is broken'); }";
    let result = Executor::new().run_loaded(ModuleLoader::new().load(source, "assert.js".into()));

    let failures = result.runtime_failures();
    assert_eq!(failures[0].error_kind, ErrorKind::AssertionError);
    assert_eq!(failures[0].message, "math is broken");
}
