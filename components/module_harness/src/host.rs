//! Host bindings installed into each script module's interpreter
//!
//! - `collector.addHttpResource(path)` resolves through a [`ResourceResolver`]
//! - `mozmill.getBrowserController()` returns an object whose `open` and
//!   `waitForPageLoad` call a [`BrowserController`]
//! - `assert.ok/equal/notEqual` throw `AssertionError` on failure

use crate::collaborators::{
    BrowserController, HttpResourceCollector, RecordingController, ResourceResolver,
};
use core_types::{ErrorKind, JsError};
use interpreter::{Interpreter, ObjectKind, ObjectRef, Value};
use std::path::PathBuf;
use std::rc::Rc;

/// Collaborators exposed to scripts
#[derive(Clone)]
pub struct HostBindings {
    resolver: Rc<dyn ResourceResolver>,
    controller: Rc<dyn BrowserController>,
}

impl Default for HostBindings {
    fn default() -> Self {
        Self::new(
            Rc::new(HttpResourceCollector::default()),
            Rc::new(RecordingController::new()),
        )
    }
}

impl HostBindings {
    /// Bind the given collaborators
    pub fn new(
        resolver: Rc<dyn ResourceResolver>,
        controller: Rc<dyn BrowserController>,
    ) -> Self {
        Self {
            resolver,
            controller,
        }
    }

    /// Define `collector`, `mozmill` and `assert` in `interp`.
    ///
    /// `base_dir` is the module's directory, used to resolve relative
    /// resource paths.
    pub fn install(&self, interp: &mut Interpreter, base_dir: Option<PathBuf>) {
        interp.define_global("collector", self.collector_object(base_dir));
        interp.define_global("mozmill", self.mozmill_object());
        interp.define_global("assert", assert_object());
    }

    fn collector_object(&self, base_dir: Option<PathBuf>) -> Value {
        let resolver = Rc::clone(&self.resolver);
        let collector = ObjectRef::new(ObjectKind::Ordinary);
        collector.set(
            "addHttpResource",
            Value::native_function("addHttpResource", move |_, _, args| {
                let path = string_arg(args, 0, "addHttpResource")?;
                resolver
                    .resolve(base_dir.as_deref(), &path)
                    .map(Value::string)
                    .map_err(|err| JsError::new(ErrorKind::Error, err.to_string()))
            }),
        );
        Value::Object(collector)
    }

    fn mozmill_object(&self) -> Value {
        let controller = Rc::clone(&self.controller);
        let mozmill = ObjectRef::new(ObjectKind::Ordinary);
        mozmill.set(
            "getBrowserController",
            Value::native_function("getBrowserController", move |_, _, _| {
                Ok(controller_object(Rc::clone(&controller)))
            }),
        );
        Value::Object(mozmill)
    }
}

fn controller_object(controller: Rc<dyn BrowserController>) -> Value {
    let object = ObjectRef::new(ObjectKind::Ordinary);

    let for_open = Rc::clone(&controller);
    object.set(
        "open",
        Value::native_function("open", move |_, _, args| {
            let url = string_arg(args, 0, "open")?;
            tracing::debug!(%url, "browser open");
            for_open
                .open(&url)
                .map(|()| Value::Undefined)
                .map_err(|err| JsError::new(ErrorKind::Error, err.to_string()))
        }),
    );
    object.set(
        "waitForPageLoad",
        Value::native_function("waitForPageLoad", move |_, _, _| {
            controller
                .wait_for_page_load()
                .map(|()| Value::Undefined)
                .map_err(|err| JsError::new(ErrorKind::Error, err.to_string()))
        }),
    );
    Value::Object(object)
}

fn string_arg(args: &[Value], index: usize, function: &str) -> Result<String, JsError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.to_string()),
        Some(other) => Ok(other.to_display_string()),
        None => Err(JsError::new(
            ErrorKind::TypeError,
            format!("{} requires an argument", function),
        )),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_display_string(),
    }
}

fn assertion_message(args: &[Value], index: usize, fallback: impl FnOnce() -> String) -> String {
    match args.get(index) {
        None | Some(Value::Undefined) => fallback(),
        Some(message) => message.to_display_string(),
    }
}

fn assert_object() -> Value {
    let assert = ObjectRef::new(ObjectKind::Ordinary);
    assert.set(
        "ok",
        Value::native_function("ok", |_, _, args| {
            let value = args.first().cloned().unwrap_or(Value::Undefined);
            if value.is_truthy() {
                return Ok(Value::Undefined);
            }
            let message = assertion_message(args, 1, || {
                format!("Expected a truthy value but got {}", describe(&value))
            });
            Err(JsError::new(ErrorKind::AssertionError, message))
        }),
    );
    assert.set(
        "equal",
        Value::native_function("equal", |_, _, args| {
            let actual = args.first().cloned().unwrap_or(Value::Undefined);
            let expected = args.get(1).cloned().unwrap_or(Value::Undefined);
            if actual.loose_equals(&expected) {
                return Ok(Value::Undefined);
            }
            let message = assertion_message(args, 2, || {
                format!("Expected {} but got {}", describe(&expected), describe(&actual))
            });
            Err(JsError::new(ErrorKind::AssertionError, message))
        }),
    );
    assert.set(
        "notEqual",
        Value::native_function("notEqual", |_, _, args| {
            let actual = args.first().cloned().unwrap_or(Value::Undefined);
            let unexpected = args.get(1).cloned().unwrap_or(Value::Undefined);
            if !actual.loose_equals(&unexpected) {
                return Ok(Value::Undefined);
            }
            let message = assertion_message(args, 2, || {
                format!("Expected a value other than {}", describe(&unexpected))
            });
            Err(JsError::new(ErrorKind::AssertionError, message))
        }),
    );
    Value::Object(assert)
}
