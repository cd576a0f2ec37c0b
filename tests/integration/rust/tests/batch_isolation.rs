//! Batch Isolation Integration Tests
//!
//! A batch of modules where some fail to load or fail at runtime still
//! yields one result per module, in order.

use integration_tests::{fixture, fixtures_dir};
use module_harness::{
    CancelToken, FailureCategory, ModuleId, StaticModule, TestRun, TestStatus,
};
use std::fs;
use tempfile::TempDir;

/// Test: N sources with a broken one in the middle give N results
#[test]
fn test_batch_continues_after_syntax_error() {
    let summary = TestRun::new()
        .run_sources(vec![
            (ModuleId::new("first.js"), "function testOne() {}"),
            (ModuleId::new("broken.js"), "var x = ;"),
            (ModuleId::new("third.js"), "function testThree() {}"),
        ])
        .unwrap();

    assert_eq!(summary.results.len(), 3);
    assert!(summary.results[0].is_success());
    assert_eq!(
        summary.results[1].load_failure().unwrap().category,
        FailureCategory::SyntaxError
    );
    assert_eq!(summary.results[1].module_id, ModuleId::new("broken.js"));
    assert!(summary.results[2].is_success());
}

/// Test: pathologically nested source is a load failure, not a crash
#[test]
fn test_batch_continues_after_deeply_nested_source() {
    let nested = format!("var x = {};", "[".repeat(5000));
    let parens = format!("var y = {}1{};", "(".repeat(5000), ")".repeat(5000));
    let summary = TestRun::new()
        .run_sources(vec![
            (ModuleId::new("testANest.js"), nested),
            (ModuleId::new("testParens.js"), parens),
            (ModuleId::new("testBFine.js"), "function testFine() {}".to_string()),
        ])
        .unwrap();

    assert_eq!(summary.results.len(), 3);
    for result in &summary.results[..2] {
        let failure = result.load_failure().expect("expected a load failure");
        assert_eq!(failure.category, FailureCategory::SyntaxError);
        assert_eq!(failure.message, "Maximum nesting depth exceeded");
    }
    assert!(summary.results[2].is_success());
    assert_eq!(summary.report.passed, 1);
}

/// Test: a deeply nested module file in a directory run does not stop the run
#[test]
fn test_directory_run_survives_nested_module() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("testANest.js"),
        format!("var x = {};", "[".repeat(5000)),
    )
    .unwrap();
    fs::write(dir.path().join("testBFine.js"), "function testFine() {}").unwrap();

    let summary = TestRun::new().run_path(dir.path()).unwrap();

    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.report.load_failures, 1);
    assert_eq!(summary.results[1].module_id.as_str(), "testBFine.js");
    assert!(summary.results[1].is_success());
}

/// Test: the undefined-function scenario from setup through tests
#[test]
fn test_batch_continues_after_runtime_error() {
    let summary = TestRun::new()
        .run_sources(vec![
            (
                ModuleId::new("scenario.js"),
                "function setupModule(m) {}\nfunction testX() { test(); }",
            ),
            (ModuleId::new("after.js"), "function testAfter() {}"),
        ])
        .unwrap();

    let scenario = &summary.results[0];
    assert_eq!(scenario.passed_count(), 0);
    let failures = scenario.runtime_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].function_name(), "testX");

    assert!(summary.results[1].is_success());
    assert_eq!(summary.report.passed, 1);
    assert_eq!(summary.report.failed, 1);
}

/// Test: globals never leak between modules
#[test]
fn test_modules_do_not_share_globals() {
    let summary = TestRun::new()
        .run_sources(vec![
            (ModuleId::new("a.js"), "var shared = 1;\nfunction testA() {}"),
            (ModuleId::new("b.js"), "function testB() { shared; }"),
        ])
        .unwrap();

    let failures = summary.results[1].runtime_failures();
    assert_eq!(failures[0].message, "shared is not defined");
}

/// Test: the fixture directory runs every module
#[test]
fn test_fixture_directory_run() {
    let summary = TestRun::new().run_path(&fixtures_dir()).unwrap();

    let ids: Vec<_> = summary
        .results
        .iter()
        .map(|r| r.module_id.as_str().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "testPassing.js",
            "testRuntimeError.js",
            "testSetupFailure.js",
            "testSyntaxError.js",
        ]
    );
    assert_eq!(summary.report.modules, 4);
    assert_eq!(summary.report.load_failures, 1);
    assert_eq!(summary.report.passed, 3);
    assert_eq!(summary.report.failed, 1);
    assert_eq!(summary.report.skipped, 1);
    assert_eq!(summary.report.hook_failures, 1);
    assert!(!summary.is_success());
}

/// Test: a copied fixture set in a nested layout keeps relative ids
#[test]
fn test_nested_directory_ids() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("js/testFrame");
    fs::create_dir_all(&nested).unwrap();
    fs::copy(fixture("testSyntaxError.js"), nested.join("testSyntaxError.js")).unwrap();

    let summary = TestRun::new().run_path(dir.path()).unwrap();
    let failure = summary.results[0].load_failure().unwrap();
    assert_eq!(failure.module_id.as_str(), "js/testFrame/testSyntaxError.js");
    assert_eq!(
        failure.to_string(),
        "js/testFrame/testSyntaxError.js:17:21: SyntaxError: Unexpected token ;"
    );
}

/// Test: cancellation stops between modules, never inside one
#[test]
fn test_cancellation_between_modules() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let modules = vec![
        StaticModule::new("first").test("testFirst", || Ok(())),
        StaticModule::new("second")
            .test("testCancel", move || {
                trigger.cancel();
                Ok(())
            })
            .test("testStillRuns", || Ok(())),
        StaticModule::new("third").test("testSkipped", || Ok(())),
    ];

    let summary = TestRun::new()
        .with_cancel_token(token)
        .run_modules(modules)
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.results.len(), 2);
    assert_eq!(summary.results[1].passed_count(), 2);
    assert!(summary.results[1]
        .tests()
        .iter()
        .all(|t| t.status == TestStatus::Passed));
}
