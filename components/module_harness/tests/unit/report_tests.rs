//! Unit tests for report generation

use module_harness::{ModuleId, ModuleLoader, RunResult, StaticModule, TestReport, TestRun};

fn sample_report() -> TestReport {
    let summary = TestRun::new()
        .run_sources(vec![
            (ModuleId::new("testSyntax.js"), "var x = ;"),
            (
                ModuleId::new("testMixed.js"),
                "function testOk() {}\nfunction testBad() { nope(); }",
            ),
        ])
        .unwrap();
    summary.report
}

#[test]
fn test_new_report() {
    let report = TestReport::new();
    assert_eq!(report.modules, 0);
    assert_eq!(report.total(), 0);
    assert!(report.failures.is_empty());
    assert!(report.skips.is_empty());
    assert!(report.is_success());
}

#[test]
fn test_pass_rate_empty() {
    let report = TestReport::new();
    assert_eq!(report.pass_rate(), 0.0);
    assert_eq!(report.effective_pass_rate(), 0.0);
}

#[test]
fn test_counts_from_batch() {
    let report = sample_report();
    assert_eq!(report.modules, 2);
    assert_eq!(report.load_failures, 1);
    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].0, "testSyntax.js:1:9");
    assert_eq!(report.failures[0].1, "SyntaxError: Unexpected token ;");
    assert_eq!(report.failures[1].0, "testMixed.js::testBad");
    assert_eq!(report.failures[1].1, "ReferenceError: nope is not defined");
}

#[test]
fn test_skips_recorded_with_reason() {
    let mut module = StaticModule::new("skipping")
        .setup(|| Err(core_types::JsError::new(core_types::ErrorKind::Error, "down")))
        .test("testA", || Ok(()));
    let result = module_harness::Executor::new().run(&mut module);

    let report = TestReport::from_results([&result]);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.hook_failures, 1);
    assert_eq!(
        report.skips,
        vec![("skipping::testA".to_string(), "setupModule failed".to_string())]
    );
    assert_eq!(report.effective_pass_rate(), 0.0);
}

#[test]
fn test_summary_and_detailed_summary() {
    let report = sample_report();
    let summary = report.summary();
    assert!(summary.contains("Modules: 2 (1 failed to load)"));
    assert!(summary.contains("Passed: 1 (50.0%)"));

    let detailed = report.detailed_summary();
    assert!(detailed.contains("Failures:"));
    assert!(detailed.contains("  - testMixed.js::testBad\n    Reason: ReferenceError: nope is not defined"));
}

#[test]
fn test_merge_reports() {
    let mut first = sample_report();
    let second = sample_report();
    first.merge(&second);
    assert_eq!(first.modules, 4);
    assert_eq!(first.failures.len(), 4);
    assert_eq!(first.top_failures(1).len(), 1);
}

#[test]
fn test_json_export_import() {
    let report = sample_report();
    let json = report.to_json().unwrap();
    let restored = TestReport::from_json(&json).unwrap();
    assert_eq!(restored, report);
}

#[test]
fn test_run_result_json_keeps_failure_details() {
    let loaded = ModuleLoader::new().load("function testA() { missing(); }", "json.js".into());
    let result = module_harness::Executor::new().run_loaded(loaded);

    let json = serde_json::to_value(&result).unwrap();
    let failure = &json["outcome"]["Ran"]["tests"][0]["status"]["Failed"];
    assert_eq!(failure["error_kind"], "ReferenceError");
    assert_eq!(failure["category"], "RuntimeError");
    assert_eq!(failure["step"]["Test"], "testA");

    let restored: RunResult = serde_json::from_value(json).unwrap();
    assert_eq!(restored, result);
}
