//! Runtime value representation.
//!
//! Primitives are stored inline; objects, arrays, functions and error
//! objects share one reference-counted [`ObjectRef`] representation so they
//! can carry properties and be compared by identity.

use crate::scope::ScopeRef;
use crate::Interpreter;
use core_types::{ErrorKind, JsError};
use parser::FunctionDef;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of a host-provided function.
///
/// Receives the interpreter, the `this` value and the call arguments.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, JsError>>;

/// Any value a test module can observe.
///
/// # Examples
///
/// ```
/// use interpreter::Value;
///
/// let number = Value::Number(42.0);
/// assert!(number.is_truthy());
/// assert_eq!(number.type_of(), "number");
/// assert_eq!(Value::string("a").to_display_string(), "a");
/// ```
#[derive(Clone)]
pub enum Value {
    /// undefined
    Undefined,
    /// null
    Null,
    /// true / false
    Boolean(bool),
    /// IEEE 754 double-precision number
    Number(f64),
    /// Immutable string
    String(Rc<str>),
    /// Object, array, function, error or module object
    Object(ObjectRef),
}

/// Shared handle to a heap object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<JsObject>>);

/// Heap object: a kind plus an ordinary property map
pub struct JsObject {
    /// What sort of object this is
    pub kind: ObjectKind,
    /// Named properties
    pub properties: HashMap<String, Value>,
    /// Function used with `new` to create this object, for `instanceof`
    pub constructor: Option<ObjectRef>,
}

/// Object variants with behaviour beyond a property map
pub enum ObjectKind {
    /// Plain `{}` object
    Ordinary,
    /// Array with dense elements
    Array(Vec<Value>),
    /// Callable function
    Function(Callable),
    /// Error object created by an error constructor or the engine
    Error(ErrorKind),
    /// Object view of a scope: reads and writes go to its bindings
    Scope(ScopeRef),
}

/// Callable function body
#[derive(Clone)]
pub enum Callable {
    /// Script function with its captured scope
    Closure {
        /// Parsed function
        def: Rc<FunctionDef>,
        /// Scope the function was created in
        scope: ScopeRef,
    },
    /// Host function
    Native {
        /// Name used in stack traces and messages
        name: String,
        /// Implementation
        func: NativeFn,
    },
}

impl Callable {
    /// Function name, empty for anonymous functions
    pub fn name(&self) -> &str {
        match self {
            Callable::Closure { def, .. } => def.name.as_deref().unwrap_or(""),
            Callable::Native { name, .. } => name,
        }
    }
}

impl ObjectRef {
    /// Allocate a new object of the given kind
    pub fn new(kind: ObjectKind) -> Self {
        ObjectRef(Rc::new(RefCell::new(JsObject {
            kind,
            properties: HashMap::new(),
            constructor: None,
        })))
    }

    /// Immutable access to the object
    pub fn borrow(&self) -> Ref<'_, JsObject> {
        self.0.borrow()
    }

    /// Mutable access to the object
    pub fn borrow_mut(&self) -> RefMut<'_, JsObject> {
        self.0.borrow_mut()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Set an own property, ignoring the object kind.
    ///
    /// Host code uses this to assemble binding objects before any script
    /// runs.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().properties.insert(key.into(), value);
    }

    /// Read an own property from the property map
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().properties.get(key).cloned()
    }

    /// The callable behind a function object
    pub fn callable(&self) -> Option<Callable> {
        match &self.0.borrow().kind {
            ObjectKind::Function(callable) => Some(callable.clone()),
            _ => None,
        }
    }
}

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Create an empty ordinary object
    pub fn new_object() -> Value {
        Value::Object(ObjectRef::new(ObjectKind::Ordinary))
    }

    /// Create an array from elements
    pub fn new_array(elements: Vec<Value>) -> Value {
        Value::Object(ObjectRef::new(ObjectKind::Array(elements)))
    }

    /// Wrap a Rust closure as a callable function value.
    ///
    /// # Examples
    ///
    /// ```
    /// use interpreter::{Interpreter, Value};
    ///
    /// let mut interp = Interpreter::new();
    /// let double = Value::native_function("double", |_, _, args| {
    ///     Ok(Value::Number(args.first().map(|v| v.to_number()).unwrap_or(0.0) * 2.0))
    /// });
    /// interp.define_global("double", double);
    /// assert_eq!(interp.eval("double(21);").unwrap(), Value::Number(42.0));
    /// ```
    pub fn native_function<F>(name: &str, func: F) -> Value
    where
        F: Fn(&mut Interpreter, &Value, &[Value]) -> Result<Value, JsError> + 'static,
    {
        Value::Object(ObjectRef::new(ObjectKind::Function(Callable::Native {
            name: name.to_string(),
            func: Rc::new(func),
        })))
    }

    /// Create an error object with `name` and `message` properties
    pub fn new_error(kind: ErrorKind, message: &str) -> Value {
        let object = ObjectRef::new(ObjectKind::Error(kind));
        object.set("name", Value::string(kind.name()));
        object.set("message", Value::string(message));
        Value::Object(object)
    }

    /// The object handle, if this is an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Whether this value can be called
    pub fn is_callable(&self) -> bool {
        self.as_object()
            .map(|o| matches!(o.borrow().kind, ObjectKind::Function(_)))
            .unwrap_or(false)
    }

    /// Truthiness: `undefined`, `null`, `false`, `0`, `NaN` and `""` are
    /// falsy, everything else (including all objects) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) if self.is_callable() => "function",
            Value::Object(_) => "object",
        }
    }

    /// Numeric conversion
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else if let Some(hex) = trimmed
                    .strip_prefix("0x")
                    .or_else(|| trimmed.strip_prefix("0X"))
                {
                    u64::from_str_radix(hex, 16)
                        .map(|n| n as f64)
                        .unwrap_or(f64::NAN)
                } else {
                    match trimmed {
                        "Infinity" | "+Infinity" => f64::INFINITY,
                        "-Infinity" => f64::NEG_INFINITY,
                        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
                    }
                }
            }
            Value::Object(_) => Value::string(self.to_display_string()).to_number(),
        }
    }

    /// String conversion, as used by `+` concatenation and `String(x)`
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Object(object) => {
                let obj = object.borrow();
                match &obj.kind {
                    ObjectKind::Array(elements) => elements
                        .iter()
                        .map(|v| match v {
                            Value::Undefined | Value::Null => String::new(),
                            other => other.to_display_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    ObjectKind::Function(callable) => {
                        format!("function {}() {{ [code] }}", callable.name())
                    }
                    ObjectKind::Error(kind) => {
                        let name = obj
                            .properties
                            .get("name")
                            .map(|v| v.to_display_string())
                            .unwrap_or_else(|| kind.name().to_string());
                        let message = obj
                            .properties
                            .get("message")
                            .map(|v| v.to_display_string())
                            .unwrap_or_default();
                        if message.is_empty() {
                            name
                        } else {
                            format!("{}: {}", name, message)
                        }
                    }
                    ObjectKind::Ordinary | ObjectKind::Scope(_) => "[object Object]".to_string(),
                }
            }
        }
    }

    /// `===` comparison
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `==` comparison with the usual primitive coercions
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Boolean(_), _)
            | (_, Value::Boolean(_)) => {
                if matches!(self, Value::Object(_)) || matches!(other, Value::Object(_)) {
                    self.primitive().loose_equals(&other.primitive())
                } else {
                    self.to_number() == other.to_number()
                }
            }
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Object(_), _) | (_, Value::Object(_)) => {
                self.primitive().loose_equals(&other.primitive())
            }
            _ => self.strict_equals(other),
        }
    }

    fn primitive(&self) -> Value {
        match self {
            Value::Object(_) => Value::string(self.to_display_string()),
            other => other.clone(),
        }
    }
}

/// Format a number the way scripts print it: shortest round-trip digits,
/// switching to exponent form from `1e21` up.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 {
        format!("{:e}", n).replacen('e', "e+", 1)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Object(_) => f
                .debug_tuple("Object")
                .field(&self.to_display_string())
                .finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("0").is_truthy());
        assert!(Value::new_object().is_truthy());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_format_large_whole_numbers() {
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(-1e19), "-10000000000000000000");
        assert_eq!(format_number(123456789012345678901.0), "123456789012345680000");
        assert_eq!(format_number(9007199254740993.0), "9007199254740992");
        assert_eq!(format_number(1e21), "1e+21");
    }

    #[test]
    fn test_loose_equality_coercions() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(Value::Number(1.0).loose_equals(&Value::string("1")));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Null.loose_equals(&Value::Number(0.0)));
        assert!(Value::new_array(vec![Value::Number(1.0), Value::Number(2.0)])
            .loose_equals(&Value::string("1,2")));
    }

    #[test]
    fn test_strict_equality_identity() {
        let a = Value::new_object();
        let b = Value::new_object();
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&b));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_error_display() {
        let err = Value::new_error(ErrorKind::TypeError, "bad");
        assert_eq!(err.to_display_string(), "TypeError: bad");
        assert_eq!(err.type_of(), "object");
    }
}
