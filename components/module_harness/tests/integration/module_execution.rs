//! Integration tests for running module files from disk

use module_harness::{
    cli, FailureCategory, HarnessConfig, HarnessError, JsonReporter, ModuleId, SummaryReporter,
    TestRun,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, source: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, source).unwrap();
}

fn suite() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "frame/testFramePasses.js",
        r#"
const BASE = collector.addHttpResource("../../pages/");

function setupModule(module) {
  module.controller = mozmill.getBrowserController();
}

function testOpen() {
  controller.open(BASE + "index.html");
  controller.waitForPageLoad();
}
"#,
    );
    write(
        dir.path(),
        "frame/testFrameSyntax.js",
        "function testBroken() {\n  var value = ;\n}\n",
    );
    write(
        dir.path(),
        "runtime/testRuntime.js",
        "function testThrows() {\n  throw new TypeError('bad input');\n}\nfunction testFine() {}\n",
    );
    write(dir.path(), "runtime/helpers.js", "this is not a module");
    write(dir.path(), "runtime/testNotes.txt", "ignored");
    dir
}

#[test]
fn test_directory_run_processes_every_module() {
    let dir = suite();
    let summary = TestRun::new().run_path(dir.path()).unwrap();

    let ids: Vec<_> = summary
        .results
        .iter()
        .map(|r| r.module_id.as_str().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![
            "frame/testFramePasses.js",
            "frame/testFrameSyntax.js",
            "runtime/testRuntime.js"
        ]
    );
    assert!(!summary.cancelled);

    assert!(summary.results[0].is_success());

    let load_failure = summary.results[1].load_failure().unwrap();
    assert_eq!(load_failure.category, FailureCategory::SyntaxError);
    let location = load_failure.location.unwrap();
    assert_eq!((location.line, location.column), (2, 15));

    assert_eq!(summary.results[2].passed_count(), 1);
    assert_eq!(summary.results[2].failed_count(), 1);

    assert_eq!(summary.report.modules, 3);
    assert_eq!(summary.report.load_failures, 1);
    assert!(!summary.is_success());
}

#[test]
fn test_single_file_run() {
    let dir = suite();
    let file = dir.path().join("runtime/testRuntime.js");
    let summary = TestRun::new().run_path(&file).unwrap();

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].module_id, ModuleId::new("testRuntime.js"));
}

#[test]
fn test_missing_path_is_io_load_failure() {
    let dir = TempDir::new().unwrap();
    let summary = TestRun::new()
        .run_path(&dir.path().join("testGone.js"))
        .unwrap();

    let failure = summary.results[0].load_failure().unwrap();
    assert_eq!(failure.category, FailureCategory::IoError);
}

#[test]
fn test_reporters_receive_results() {
    let dir = suite();
    let mut text = SummaryReporter::new(Vec::new()).verbose(true);
    let mut json = JsonReporter::new(Vec::new());
    TestRun::new()
        .with_reporter(&mut text)
        .with_reporter(&mut json)
        .run_path(dir.path())
        .unwrap();

    let text = String::from_utf8(text.into_inner()).unwrap();
    assert!(text.contains("PASS frame/testFramePasses.js: 1 passed, 0 failed, 0 skipped"));
    assert!(text.contains("FAIL frame/testFrameSyntax.js:2:15: SyntaxError: Unexpected token ;"));
    assert!(text.contains("runtime/testRuntime.js::testThrows: TypeError: bad input"));

    let value: serde_json::Value = serde_json::from_slice(&json.into_inner()).unwrap();
    assert_eq!(value["report"]["modules"], 3);
}

#[test]
fn test_config_drives_run() {
    let dir = suite();
    let report_path = dir.path().join("report.json");
    let config_path = dir.path().join("harness.yaml");
    fs::write(
        &config_path,
        format!(
            "test_path: {}\nfilter: Fine\nreport_path: {}\nresource_port: 9000\n",
            dir.path().join("runtime").display(),
            report_path.display()
        ),
    )
    .unwrap();

    let config = HarnessConfig::load(&config_path).unwrap();
    let outcome = cli::execute(&config, false);
    assert_eq!(cli::exit_code(&outcome), cli::EXIT_SUCCESS);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["report"]["passed"], 1);
    assert_eq!(report["report"]["failed"], 0);
}

#[test]
fn test_unreadable_config_is_infrastructure_error() {
    let err = HarnessConfig::load(Path::new("/nonexistent/harness.yaml")).unwrap_err();
    assert!(matches!(err, HarnessError::Io { .. }));
}
