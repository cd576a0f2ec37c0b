//! Fixture Module Integration Tests
//!
//! Loads the fixture modules from disk and runs them through the full
//! stack: Loader -> Parser -> Executor -> Interpreter -> RunResult.

use core_types::ErrorKind;
use integration_tests::fixture;
use module_harness::{
    BrowserCall, Executor, ExecutorState, FailureCategory, HostBindings, HttpResourceCollector,
    LifecycleStep, ModuleId, ModuleLoader, RecordingController, TestStatus,
};
use std::rc::Rc;

fn load(name: &str) -> module_harness::RunResult {
    let path = fixture(name);
    Executor::new().run_loaded(ModuleLoader::new().load_file(&path, ModuleId::new(name)))
}

/// Test: the shipped syntax error fixture never becomes runnable
#[test]
fn test_syntax_error_fixture_is_load_failure() {
    let result = load("testSyntaxError.js");

    let failure = result.load_failure().expect("expected a load failure");
    assert_eq!(failure.category, FailureCategory::SyntaxError);
    assert_eq!(failure.module_id, ModuleId::new("testSyntaxError.js"));
    assert_eq!(failure.message, "Unexpected token ;");

    let location = failure.location.expect("expected a location");
    assert_eq!(location.line, 17);
    assert_eq!(location.column, 21);

    assert!(result.tests().is_empty());
    assert!(result.runtime_failures().is_empty());
}

/// Test: the runtime error fixture fails only the throwing test
#[test]
fn test_runtime_error_fixture_isolates_test() {
    let result = load("testRuntimeError.js");

    assert!(result.load_failure().is_none());
    assert_eq!(result.passed_count(), 1);

    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].category, FailureCategory::RuntimeError);
    assert_eq!(failures[0].function_name(), "testErrorConsole");
    assert_eq!(failures[0].error_kind, ErrorKind::ReferenceError);
    assert_eq!(failures[0].message, "test is not defined");
    let location = failures[0].location.expect("expected a location");
    assert_eq!((location.line, location.column), (13, 3));
}

/// Test: the passing fixture drives the browser collaborator
#[test]
fn test_passing_fixture_uses_collaborators() {
    let controller = Rc::new(RecordingController::new());
    let collector = Rc::new(HttpResourceCollector::default());
    let host = HostBindings::new(collector.clone(), controller.clone());
    let loader = ModuleLoader::new().with_host(host);

    let path = fixture("testPassing.js");
    let result =
        Executor::new().run_loaded(loader.load_file(&path, ModuleId::new("testPassing.js")));

    assert!(result.is_success(), "{:?}", result.runtime_failures());
    assert_eq!(result.passed_count(), 2);
    assert_eq!(
        controller.calls(),
        vec![
            BrowserCall::Open("http://localhost:43336/data/link.html".to_string()),
            BrowserCall::WaitForPageLoad,
        ]
    );
    assert_eq!(collector.registered().len(), 1);
}

/// Test: a failing setupModule skips the tests and still tears down
#[test]
fn test_setup_failure_fixture() {
    let path = fixture("testSetupFailure.js");
    let mut executor = Executor::new();
    let result =
        executor.run_loaded(ModuleLoader::new().load_file(&path, ModuleId::new("testSetupFailure.js")));

    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].step, LifecycleStep::Setup);
    assert_eq!(failures[0].error_kind, ErrorKind::TypeError);

    assert_eq!(
        result.tests()[0].status,
        TestStatus::Skipped("setupModule failed".to_string())
    );
    assert!(executor.history().contains(&ExecutorState::SetupFailed));
    assert_eq!(executor.state(), ExecutorState::Completed);
}

/// Test: the controller failing mid-test is a runtime failure of that test
#[test]
fn test_browser_failure_in_fixture() {
    let host = HostBindings::new(
        Rc::new(HttpResourceCollector::default()),
        Rc::new(RecordingController::new().failing_on("link.html")),
    );
    let path = fixture("testPassing.js");
    let result = Executor::new().run_loaded(
        ModuleLoader::new()
            .with_host(host)
            .load_file(&path, ModuleId::new("testPassing.js")),
    );

    let names: Vec<_> = result
        .runtime_failures()
        .iter()
        .map(|f| f.function_name().to_string())
        .collect();
    assert_eq!(names, vec!["testOpenPage", "teardownModule"]);
    assert_eq!(result.passed_count(), 1);
}
