//! Unit tests for the module loader

use module_harness::{FailureCategory, ModuleId, ModuleLoader, TestModule};

#[test]
fn test_syntax_error_never_yields_module() {
    let failure = ModuleLoader::new()
        .load("var x = ;", ModuleId::new("syntax.js"))
        .unwrap_err();

    assert_eq!(failure.category, FailureCategory::SyntaxError);
    assert_eq!(failure.module_id, ModuleId::new("syntax.js"));
    assert_eq!(failure.message, "Unexpected token ;");
}

#[test]
fn test_unterminated_function_reports_end_of_input() {
    let failure = ModuleLoader::new()
        .load("function testA() {\n  var a = 1;\n", "open.js".into())
        .unwrap_err();
    assert_eq!(failure.category, FailureCategory::SyntaxError);
    assert_eq!(failure.message, "Unexpected end of input");
}

#[test]
fn test_test_names_follow_declaration_order() {
    let source = r#"
        function testZeta() {}
        function setupModule() {}
        function testAlpha() {}
        function testMiddle() {}
    "#;
    let module = ModuleLoader::new().load(source, "order.js".into()).unwrap();
    assert_eq!(module.test_names(), vec!["testZeta", "testAlpha", "testMiddle"]);
    assert!(module.has_setup());
    assert!(!module.has_teardown());
}

#[test]
fn test_module_without_tests_is_runnable() {
    let module = ModuleLoader::new()
        .load("var helper = 1;", "helpers.js".into())
        .unwrap();
    assert!(module.test_names().is_empty());
    assert_eq!(module.id().as_str(), "helpers.js");
}

#[test]
fn test_load_file_records_base_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("testFile.js");
    std::fs::write(&path, "function testA() {}").unwrap();

    let module = ModuleLoader::new()
        .load_file(&path, ModuleId::from_path(&path, Some(dir.path())))
        .unwrap();

    assert_eq!(module.id().as_str(), "testFile.js");
    assert_eq!(module.base_dir(), Some(dir.path()));
    assert_eq!(module.source_url(), path.display().to_string());
}
