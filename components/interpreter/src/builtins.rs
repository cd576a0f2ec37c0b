//! Standard globals available to every module
//!
//! Error constructors, conversion functions, `Math`, `Object.keys`,
//! `console` (routed to `tracing`) and the methods reachable from string
//! and array values.

use crate::value::{ObjectKind, ObjectRef, Value};
use crate::Interpreter;
use core_types::{ErrorKind, JsError};

const ERROR_CONSTRUCTORS: [ErrorKind; 6] = [
    ErrorKind::Error,
    ErrorKind::TypeError,
    ErrorKind::ReferenceError,
    ErrorKind::RangeError,
    ErrorKind::SyntaxError,
    ErrorKind::AssertionError,
];

/// Install the standard globals into `interp`
pub(crate) fn install(interp: &mut Interpreter) {
    interp.define_global("undefined", Value::Undefined);
    interp.define_global("NaN", Value::Number(f64::NAN));
    interp.define_global("Infinity", Value::Number(f64::INFINITY));

    for kind in ERROR_CONSTRUCTORS {
        interp.define_global(kind.name(), error_constructor(kind));
    }

    interp.define_global(
        "String",
        Value::native_function("String", |_, _, args| {
            Ok(Value::string(
                args.first().map(Value::to_display_string).unwrap_or_default(),
            ))
        }),
    );
    interp.define_global(
        "Number",
        Value::native_function("Number", |_, _, args| {
            Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0)))
        }),
    );
    interp.define_global(
        "Boolean",
        Value::native_function("Boolean", |_, _, args| {
            Ok(Value::Boolean(
                args.first().map(Value::is_truthy).unwrap_or(false),
            ))
        }),
    );
    interp.define_global(
        "isNaN",
        Value::native_function("isNaN", |_, _, args| {
            Ok(Value::Boolean(arg(args, 0).to_number().is_nan()))
        }),
    );
    interp.define_global(
        "parseInt",
        Value::native_function("parseInt", |_, _, args| {
            Ok(Value::Number(parse_int(&arg(args, 0).to_display_string())))
        }),
    );
    interp.define_global(
        "parseFloat",
        Value::native_function("parseFloat", |_, _, args| {
            Ok(Value::Number(parse_float(&arg(args, 0).to_display_string())))
        }),
    );

    interp.define_global("Math", math_object());
    interp.define_global("Object", object_constructor());
    interp.define_global("console", console_object());
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn error_constructor(kind: ErrorKind) -> Value {
    Value::native_function(kind.name(), move |_, _, args| {
        let message = match args.first() {
            None | Some(Value::Undefined) => String::new(),
            Some(message) => message.to_display_string(),
        };
        Ok(Value::new_error(kind, &message))
    })
}

fn math_object() -> Value {
    let math = ObjectRef::new(ObjectKind::Ordinary);
    math.set("PI", Value::Number(std::f64::consts::PI));

    let unary: [(&str, fn(f64) -> f64); 5] = [
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("abs", f64::abs),
        ("sqrt", f64::sqrt),
        ("round", |n| (n + 0.5).floor()),
    ];
    for (name, op) in unary {
        math.set(
            name,
            Value::native_function(name, move |_, _, args| {
                Ok(Value::Number(op(arg(args, 0).to_number())))
            }),
        );
    }
    math.set(
        "max",
        Value::native_function("max", |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                f64::NEG_INFINITY,
                |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.max(n) },
            )))
        }),
    );
    math.set(
        "min",
        Value::native_function("min", |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                f64::INFINITY,
                |acc, n| if n.is_nan() || acc.is_nan() { f64::NAN } else { acc.min(n) },
            )))
        }),
    );
    Value::Object(math)
}

fn object_constructor() -> Value {
    let constructor = Value::native_function("Object", |_, _, _| Ok(Value::new_object()));
    if let Value::Object(object) = &constructor {
        object.set(
            "keys",
            Value::native_function("keys", |_, _, args| {
                let keys = match arg(args, 0) {
                    Value::Object(object) => {
                        let obj = object.borrow();
                        let mut keys: Vec<String> = match &obj.kind {
                            ObjectKind::Array(elements) => {
                                (0..elements.len()).map(|i| i.to_string()).collect()
                            }
                            _ => Vec::new(),
                        };
                        let mut named: Vec<String> = obj.properties.keys().cloned().collect();
                        named.sort();
                        keys.extend(named);
                        keys
                    }
                    _ => Vec::new(),
                };
                Ok(Value::new_array(keys.into_iter().map(Value::string).collect()))
            }),
        );
    }
    constructor
}

fn console_object() -> Value {
    fn join(args: &[Value]) -> String {
        args.iter()
            .map(Value::to_display_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    let console = ObjectRef::new(ObjectKind::Ordinary);
    console.set(
        "log",
        Value::native_function("log", |_, _, args| {
            tracing::info!(target: "console", "{}", join(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "info",
        Value::native_function("info", |_, _, args| {
            tracing::info!(target: "console", "{}", join(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "debug",
        Value::native_function("debug", |_, _, args| {
            tracing::debug!(target: "console", "{}", join(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "warn",
        Value::native_function("warn", |_, _, args| {
            tracing::warn!(target: "console", "{}", join(args));
            Ok(Value::Undefined)
        }),
    );
    console.set(
        "error",
        Value::native_function("error", |_, _, args| {
            tracing::error!(target: "console", "{}", join(args));
            Ok(Value::Undefined)
        }),
    );
    Value::Object(console)
}

fn parse_int(s: &str) -> f64 {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if end == 0 {
        return f64::NAN;
    }
    let magnitude = digits[..end]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    // Longest prefix that parses as a number
    (1..=s.len())
        .rev()
        .filter(|&end| s.is_char_boundary(end))
        .find_map(|end| s[..end].parse::<f64>().ok().filter(|n| !n.is_nan()))
        .unwrap_or(f64::NAN)
}

fn this_string(this: &Value) -> String {
    this.to_display_string()
}

fn char_index_to_byte(s: &str, index: usize) -> usize {
    s.char_indices().nth(index).map(|(b, _)| b).unwrap_or(s.len())
}

fn clamp_index(value: &Value, len: usize) -> usize {
    let n = value.to_number();
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= len as f64 {
        len
    } else {
        n as usize
    }
}

/// Method looked up on a string value, receiving the string as `this`
pub(crate) fn string_method(name: &str) -> Option<Value> {
    let method = match name {
        "indexOf" => Value::native_function("indexOf", |_, this, args| {
            let s = this_string(this);
            let needle = arg(args, 0).to_display_string();
            Ok(Value::Number(match s.find(&needle) {
                Some(byte) => s[..byte].chars().count() as f64,
                None => -1.0,
            }))
        }),
        "includes" => Value::native_function("includes", |_, this, args| {
            let needle = arg(args, 0).to_display_string();
            Ok(Value::Boolean(this_string(this).contains(&needle)))
        }),
        "startsWith" => Value::native_function("startsWith", |_, this, args| {
            let needle = arg(args, 0).to_display_string();
            Ok(Value::Boolean(this_string(this).starts_with(&needle)))
        }),
        "charAt" => Value::native_function("charAt", |_, this, args| {
            let index = arg(args, 0).to_number();
            let s = this_string(this);
            let c = if index >= 0.0 {
                s.chars().nth(index as usize)
            } else {
                None
            };
            Ok(Value::string(c.map(String::from).unwrap_or_default()))
        }),
        "substring" => Value::native_function("substring", |_, this, args| {
            let s = this_string(this);
            let len = s.chars().count();
            let start = clamp_index(&arg(args, 0), len);
            let end = match args.get(1) {
                None | Some(Value::Undefined) => len,
                Some(end) => clamp_index(end, len),
            };
            let (from, to) = if start <= end { (start, end) } else { (end, start) };
            Ok(Value::string(
                &s[char_index_to_byte(&s, from)..char_index_to_byte(&s, to)],
            ))
        }),
        "split" => Value::native_function("split", |_, this, args| {
            let s = this_string(this);
            let parts = match args.first() {
                None | Some(Value::Undefined) => vec![Value::string(&s)],
                Some(separator) => {
                    let separator = separator.to_display_string();
                    if separator.is_empty() {
                        s.chars().map(|c| Value::string(c.to_string())).collect()
                    } else {
                        s.split(separator.as_str()).map(Value::string).collect()
                    }
                }
            };
            Ok(Value::new_array(parts))
        }),
        "trim" => Value::native_function("trim", |_, this, _| {
            Ok(Value::string(this_string(this).trim()))
        }),
        "toUpperCase" => Value::native_function("toUpperCase", |_, this, _| {
            Ok(Value::string(this_string(this).to_uppercase()))
        }),
        "toLowerCase" => Value::native_function("toLowerCase", |_, this, _| {
            Ok(Value::string(this_string(this).to_lowercase()))
        }),
        "toString" => Value::native_function("toString", |_, this, _| {
            Ok(Value::string(this_string(this)))
        }),
        _ => return None,
    };
    Some(method)
}

fn with_elements<R>(
    this: &Value,
    method: &str,
    f: impl FnOnce(&mut Vec<Value>) -> R,
) -> Result<R, JsError> {
    if let Value::Object(object) = this {
        if let ObjectKind::Array(elements) = &mut object.borrow_mut().kind {
            return Ok(f(elements));
        }
    }
    Err(JsError::new(
        ErrorKind::TypeError,
        format!("Array.prototype.{} called on a non-array", method),
    ))
}

/// Method looked up on an array value, receiving the array as `this`
pub(crate) fn array_method(name: &str) -> Option<Value> {
    let method = match name {
        "push" => Value::native_function("push", |_, this, args| {
            with_elements(this, "push", |elements| {
                elements.extend(args.iter().cloned());
                Value::Number(elements.len() as f64)
            })
        }),
        "pop" => Value::native_function("pop", |_, this, _| {
            with_elements(this, "pop", |elements| {
                elements.pop().unwrap_or(Value::Undefined)
            })
        }),
        "indexOf" => Value::native_function("indexOf", |_, this, args| {
            let needle = arg(args, 0);
            with_elements(this, "indexOf", |elements| {
                Value::Number(
                    elements
                        .iter()
                        .position(|v| v.strict_equals(&needle))
                        .map(|i| i as f64)
                        .unwrap_or(-1.0),
                )
            })
        }),
        "join" => Value::native_function("join", |_, this, args| {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(separator) => separator.to_display_string(),
            };
            let elements = with_elements(this, "join", |elements| elements.clone())?;
            Ok(Value::string(
                elements
                    .iter()
                    .map(|v| match v {
                        Value::Undefined | Value::Null => String::new(),
                        other => other.to_display_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            ))
        }),
        "slice" => Value::native_function("slice", |_, this, args| {
            let elements = with_elements(this, "slice", |elements| elements.clone())?;
            let len = elements.len();
            let start = clamp_index(&arg(args, 0), len);
            let end = match args.get(1) {
                None | Some(Value::Undefined) => len,
                Some(end) => clamp_index(end, len),
            };
            Ok(Value::new_array(
                elements.get(start..end.max(start)).unwrap_or_default().to_vec(),
            ))
        }),
        _ => return None,
    };
    Some(method)
}
