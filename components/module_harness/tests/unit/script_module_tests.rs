//! Unit tests for script modules driven through the lifecycle

use module_harness::{
    BrowserCall, Executor, HostBindings, HttpResourceCollector, ModuleLoader, RecordingController,
    TestModule,
};
use std::rc::Rc;

#[test]
fn test_module_object_defines_bindings() {
    let source = r#"
        function setupModule(module) {
          module.controller = mozmill.getBrowserController();
          module.visits = 0;
        }
        function testOpen() {
          controller.open("http://localhost:43336/frame/");
          controller.waitForPageLoad();
          visits++;
        }
        function testVisitsShared() {
          assert.equal(visits, 1);
        }
    "#;
    let controller = Rc::new(RecordingController::new());
    let host = HostBindings::new(Rc::new(HttpResourceCollector::default()), controller.clone());
    let loaded = ModuleLoader::new().with_host(host).load(source, "shared.js".into());

    let result = Executor::new().run_loaded(loaded);

    assert!(result.is_success(), "{:?}", result.runtime_failures());
    assert_eq!(
        controller.calls(),
        vec![
            BrowserCall::Open("http://localhost:43336/frame/".to_string()),
            BrowserCall::WaitForPageLoad,
        ]
    );
}

#[test]
fn test_browser_failure_isolated_to_test() {
    let source = r#"
        function testBrokenPage() {
          mozmill.getBrowserController().open("http://localhost/unreachable/");
        }
        function testStillRuns() {}
    "#;
    let host = HostBindings::new(
        Rc::new(HttpResourceCollector::default()),
        Rc::new(RecordingController::new().failing_on("unreachable")),
    );
    let loaded = ModuleLoader::new().with_host(host).load(source, "browser.js".into());
    let result = Executor::new().run_loaded(loaded);

    assert_eq!(result.passed_count(), 1);
    let failures = result.runtime_failures();
    assert_eq!(failures[0].function_name(), "testBrokenPage");
    assert_eq!(failures[0].message, "Failed to open http://localhost/unreachable/");
}

#[test]
fn test_duplicate_test_runs_last_body_once() {
    let source = r#"
        var runs = [];
        function testDup() { runs.push("first"); }
        function testOther() {}
        function testDup() { runs.push("second"); }
        function teardownModule() { assert.equal(runs.join(","), "second"); }
    "#;
    let result = Executor::new().run_loaded(ModuleLoader::new().load(source, "dup.js".into()));

    let names: Vec<_> = result.tests().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["testDup", "testOther"]);
    assert!(result.is_success(), "{:?}", result.runtime_failures());
}

#[test]
fn test_runaway_recursion_is_isolated() {
    let source = "function spin() { return spin(); }\nfunction testSpin() { spin(); }\nfunction testAfter() {}";
    let loaded = ModuleLoader::new()
        .with_max_call_depth(32)
        .load(source, "spin.js".into());
    let result = Executor::new().run_loaded(loaded);

    assert_eq!(result.passed_count(), 1);
    let failures = result.runtime_failures();
    assert_eq!(failures[0].error_kind, core_types::ErrorKind::RangeError);
    assert_eq!(failures[0].message, "Maximum call stack size exceeded");
}

#[test]
fn test_runaway_recursion_at_default_depth() {
    let source = "function count(n) { return 1 + count(n + 1); }\nfunction testSpin() { count(0); }\nfunction testAfter() {}";
    let result = Executor::new().run_loaded(ModuleLoader::new().load(source, "deep.js".into()));

    assert_eq!(result.passed_count(), 1);
    let failures = result.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].function_name(), "testSpin");
    assert_eq!(failures[0].error_kind, core_types::ErrorKind::RangeError);
}

#[test]
fn test_oversized_array_length_is_isolated() {
    let source = "function testLen() { var a = []; a.length = 4000000000; }\nfunction testAfter() {}";
    let result = Executor::new().run_loaded(ModuleLoader::new().load(source, "len.js".into()));

    assert_eq!(result.passed_count(), 1);
    let failures = result.runtime_failures();
    assert_eq!(failures[0].function_name(), "testLen");
    assert_eq!(failures[0].error_kind, core_types::ErrorKind::RangeError);
}

#[test]
fn test_failure_stack_names_test_function() {
    let source = "function helper() {\n  undefinedHelper();\n}\nfunction testCallsHelper() {\n  helper();\n}\n";
    let result = Executor::new().run_loaded(ModuleLoader::new().load(source, "stack.js".into()));

    let failures = result.runtime_failures();
    let names: Vec<_> = failures[0]
        .stack
        .iter()
        .map(|frame| frame.function_name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["helper", "testCallsHelper"]);
    assert_eq!(failures[0].stack[0].source_url.as_deref(), Some("stack.js"));
}

#[test]
fn test_run_test_without_initialize_starts_interpreter() {
    let mut module = ModuleLoader::new()
        .load("var ready = true;\nfunction testReady() { assert.ok(ready); }", "lazy.js".into())
        .unwrap();
    assert!(module.run_test("testReady").is_ok());
    assert!(module.run_test("testMissing").is_err());
}
