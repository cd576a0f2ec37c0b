//! Tree-walking evaluator

use crate::builtins;
use crate::call_frame::CallFrame;
use crate::scope::{self, AssignError, Scope, ScopeRef};
use crate::value::{Callable, ObjectKind, ObjectRef, Value};
use core_types::{ensure_sufficient_stack, ErrorKind, JsError, SourcePosition, StackFrame};
use parser::ast::{
    AssignmentTarget, BinaryOperator, Literal, LogicalOperator,
    MemberProperty, UnaryOperator, UpdateOperator, VariableKind,
};
use parser::{Expression, FunctionDef, Program, Statement};
use std::cmp::Ordering;
use std::rc::Rc;

/// Default limit on nested script function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Indices beyond `len + MAX_ARRAY_GAP` are stored as plain properties
const MAX_ARRAY_GAP: usize = 1 << 16;

const ORIGIN: SourcePosition = SourcePosition {
    line: 1,
    column: 1,
    offset: 0,
};

/// How a statement finished
#[derive(Debug)]
enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Resolved assignment target
enum Reference {
    Binding(String),
    Property(Value, String),
}

/// Script interpreter holding one global environment.
///
/// Each test module gets its own `Interpreter`, so globals never leak
/// between modules.
///
/// # Examples
///
/// ```
/// use interpreter::{Interpreter, Value};
///
/// let mut interp = Interpreter::new();
/// interp.eval("function add(a, b) { return a + b; }").unwrap();
///
/// let add = interp.get_global("add").unwrap();
/// let sum = interp
///     .call_function(&add, &Value::Undefined, &[Value::Number(2.0), Value::Number(3.0)])
///     .unwrap();
/// assert_eq!(sum, Value::Number(5.0));
///
/// let err = interp.eval("missing();").unwrap_err();
/// assert_eq!(err.message, "missing is not defined");
/// ```
pub struct Interpreter {
    global: ScopeRef,
    global_object: Value,
    frames: Vec<CallFrame>,
    source_url: Option<String>,
    max_call_depth: usize,
    /// Last value thrown by a `throw` statement, paired with the error it
    /// became, so `catch` can hand the original value back
    thrown: Option<(JsError, Value)>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the standard globals installed
    pub fn new() -> Self {
        let global = Scope::global();
        let global_object = Value::Object(ObjectRef::new(ObjectKind::Scope(Rc::clone(&global))));
        let mut interp = Self {
            global,
            global_object,
            frames: Vec::new(),
            source_url: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            thrown: None,
        };
        builtins::install(&mut interp);
        interp
    }

    /// Set the URL recorded in stack frames
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the maximum nesting of script function calls
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// URL recorded in stack frames
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Number of script function calls currently active
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Define (or overwrite) a global binding
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.global.borrow_mut().declare(name, value, true);
    }

    /// Read a global binding
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.global.borrow().get_own(name)
    }

    /// Object view of the global scope.
    ///
    /// Property writes on it create or update globals, so host code can
    /// pass it to scripts as the module object.
    pub fn global_object(&self) -> Value {
        self.global_object.clone()
    }

    /// Parse and run source text in the global scope
    pub fn eval(&mut self, source: &str) -> Result<Value, JsError> {
        let program = parser::parse_program(source)?;
        self.run_program(&program)
    }

    /// Run a parsed program in the global scope.
    ///
    /// Returns the value of the last expression statement.
    pub fn run_program(&mut self, program: &Program) -> Result<Value, JsError> {
        self.reset_if_idle();
        let global = Rc::clone(&self.global);
        self.hoist_declarations(&program.body, &global);

        let start = program.body.first().map(Statement::position).unwrap_or(ORIGIN);
        self.frames.push(CallFrame::new(None, start));
        let result = self.run_top_level(&program.body, &global);
        self.frames.pop();
        result
    }

    /// Call a function value from host code
    pub fn call_function(
        &mut self,
        callee: &Value,
        this: &Value,
        args: &[Value],
    ) -> Result<Value, JsError> {
        self.reset_if_idle();
        if !callee.is_callable() {
            return Err(JsError::new(
                ErrorKind::TypeError,
                format!("{} is not a function", callee.to_display_string()),
            ));
        }
        self.invoke(callee, this, args, None)
    }

    /// Convert an error into the value a `catch` clause receives
    pub fn error_to_value(&self, error: &JsError) -> Value {
        let value = Value::new_error(error.kind, &error.message);
        if let Value::Object(object) = &value {
            let stack = error
                .stack
                .iter()
                .map(StackFrame::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            object.set("stack", Value::string(stack));
        }
        value
    }

    /// Build an error at `position` with the current stack attached
    pub fn raise(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        position: SourcePosition,
    ) -> JsError {
        JsError::new(kind, message)
            .with_position(position)
            .with_stack(self.capture_stack(position))
    }

    fn reset_if_idle(&mut self) {
        if self.frames.is_empty() {
            self.thrown = None;
        }
    }

    fn capture_stack(&self, position: SourcePosition) -> Vec<StackFrame> {
        self.frames
            .iter()
            .rev()
            .enumerate()
            .map(|(i, frame)| {
                let at = if i == 0 { position } else { frame.current };
                frame.to_stack_frame(self.source_url.as_deref(), at)
            })
            .collect()
    }

    fn mark(&mut self, position: SourcePosition) {
        if let Some(frame) = self.frames.last_mut() {
            frame.current = position;
        }
    }

    fn locate(&self, mut error: JsError, position: SourcePosition) -> JsError {
        if error.source_position.is_none() {
            error.source_position = Some(position);
        }
        if error.stack.is_empty() {
            error.stack = self.capture_stack(position);
        }
        error
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn hoist_declarations(&mut self, body: &[Statement], scope: &ScopeRef) {
        let mut names = Vec::new();
        collect_var_names(body, &mut names);
        {
            let mut s = scope.borrow_mut();
            for name in names {
                if !s.has_own(&name) {
                    s.declare(&name, Value::Undefined, true);
                }
            }
        }
        instantiate_functions(body, scope);
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn run_top_level(&mut self, body: &[Statement], scope: &ScopeRef) -> Result<Value, JsError> {
        let mut last = Value::Undefined;
        for stmt in body {
            if let Statement::ExpressionStatement {
                expression,
                position,
            } = stmt
            {
                self.mark(*position);
                last = self.evaluate(expression, scope)?;
            } else {
                self.execute_statement(stmt, scope)?;
            }
        }
        Ok(last)
    }

    fn execute_statements(
        &mut self,
        body: &[Statement],
        scope: &ScopeRef,
    ) -> Result<Completion, JsError> {
        for stmt in body {
            match self.execute_statement(stmt, scope)? {
                Completion::Normal => {}
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal)
    }

    fn execute_block(&mut self, body: &[Statement], scope: &ScopeRef) -> Result<Completion, JsError> {
        let block = Scope::child(scope);
        instantiate_functions(body, &block);
        self.execute_statements(body, &block)
    }

    fn execute_statement(&mut self, stmt: &Statement, scope: &ScopeRef) -> Result<Completion, JsError> {
        ensure_sufficient_stack(|| self.execute_statement_inner(stmt, scope))
    }

    fn execute_statement_inner(
        &mut self,
        stmt: &Statement,
        scope: &ScopeRef,
    ) -> Result<Completion, JsError> {
        self.mark(stmt.position());
        match stmt {
            Statement::VariableDeclaration {
                kind,
                declarations,
                position,
            } => {
                for decl in declarations {
                    let value = match &decl.init {
                        Some(init) => self.evaluate(init, scope)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        VariableKind::Var => {
                            if decl.init.is_some() {
                                self.assign_binding(&decl.name, value, scope, *position)?;
                            }
                        }
                        VariableKind::Let => scope.borrow_mut().declare(&decl.name, value, true),
                        VariableKind::Const => {
                            scope.borrow_mut().declare(&decl.name, value, false)
                        }
                    }
                }
                Ok(Completion::Normal)
            }

            // Hoisted when the enclosing body was entered
            Statement::FunctionDeclaration(_) => Ok(Completion::Normal),

            Statement::ExpressionStatement { expression, .. } => {
                self.evaluate(expression, scope)?;
                Ok(Completion::Normal)
            }

            Statement::ReturnStatement { argument, .. } => {
                let value = match argument {
                    Some(expr) => self.evaluate(expr, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }

            Statement::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.evaluate(test, scope)?.is_truthy() {
                    self.execute_statement(consequent, scope)
                } else if let Some(alternate) = alternate {
                    self.execute_statement(alternate, scope)
                } else {
                    Ok(Completion::Normal)
                }
            }

            Statement::WhileStatement { test, body, .. } => {
                while self.evaluate(test, scope)?.is_truthy() {
                    match self.execute_statement(body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
                Ok(Completion::Normal)
            }

            Statement::DoWhileStatement { body, test, .. } => {
                loop {
                    match self.execute_statement(body, scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if !self.evaluate(test, scope)?.is_truthy() {
                        break;
                    }
                }
                Ok(Completion::Normal)
            }

            Statement::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => {
                let loop_scope = Scope::child(scope);
                if let Some(init) = init {
                    self.execute_statement(init, &loop_scope)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.evaluate(test, &loop_scope)?.is_truthy() {
                            break;
                        }
                    }
                    match self.execute_statement(body, &loop_scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = update {
                        self.evaluate(update, &loop_scope)?;
                    }
                }
                Ok(Completion::Normal)
            }

            Statement::BreakStatement { .. } => Ok(Completion::Break),
            Statement::ContinueStatement { .. } => Ok(Completion::Continue),

            Statement::ThrowStatement { argument, position } => {
                let value = self.evaluate(argument, scope)?;
                let error = self.exception_from_value(&value, *position);
                self.thrown = Some((error.clone(), value));
                Err(error)
            }

            Statement::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                let result = match (self.execute_block(block, scope), handler) {
                    (Err(error), Some(handler)) => {
                        let exception = self.take_exception(&error);
                        let catch_scope = Scope::child(scope);
                        if let Some(param) = &handler.param {
                            catch_scope.borrow_mut().declare(param, exception, true);
                        }
                        instantiate_functions(&handler.body, &catch_scope);
                        self.execute_statements(&handler.body, &catch_scope)
                    }
                    (result, _) => result,
                };
                if let Some(finalizer) = finalizer {
                    match self.execute_block(finalizer, scope)? {
                        Completion::Normal => {}
                        abrupt => return Ok(abrupt),
                    }
                }
                result
            }

            Statement::BlockStatement { body, .. } => self.execute_block(body, scope),

            Statement::EmptyStatement { .. } => Ok(Completion::Normal),
        }
    }

    fn take_exception(&mut self, error: &JsError) -> Value {
        match self.thrown.take() {
            Some((thrown_error, value)) if &thrown_error == error => value,
            _ => self.error_to_value(error),
        }
    }

    fn exception_from_value(&self, value: &Value, position: SourcePosition) -> JsError {
        let described = value.as_object().and_then(|object| {
            let obj = object.borrow();
            let message = obj.properties.get("message").map(Value::to_display_string);
            match &obj.kind {
                ObjectKind::Error(kind) => Some((*kind, message.unwrap_or_default())),
                _ => {
                    let kind = obj
                        .properties
                        .get("name")
                        .and_then(|name| ErrorKind::from_name(&name.to_display_string()))?;
                    Some((kind, message?))
                }
            }
        });
        let (kind, message) =
            described.unwrap_or_else(|| (ErrorKind::Error, value.to_display_string()));
        self.raise(kind, message, position)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn evaluate(&mut self, expr: &Expression, scope: &ScopeRef) -> Result<Value, JsError> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr, scope))
    }

    fn evaluate_inner(&mut self, expr: &Expression, scope: &ScopeRef) -> Result<Value, JsError> {
        match expr {
            Expression::Identifier { name, position } => scope::lookup(scope, name).ok_or_else(|| {
                self.raise(
                    ErrorKind::ReferenceError,
                    format!("{} is not defined", name),
                    *position,
                )
            }),

            Expression::Literal { value, .. } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::string(s),
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Null => Value::Null,
            }),

            Expression::ArrayExpression { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.evaluate(element, scope)?);
                }
                Ok(Value::new_array(values))
            }

            Expression::ObjectExpression { properties, .. } => {
                let object = ObjectRef::new(ObjectKind::Ordinary);
                for (key, value_expr) in properties {
                    let value = self.evaluate(value_expr, scope)?;
                    object.set(key.clone(), value);
                }
                Ok(Value::Object(object))
            }

            Expression::FunctionExpression(def) => Ok(make_closure(def, scope)),

            Expression::ThisExpression { .. } => {
                Ok(scope::lookup(scope, "this").unwrap_or(Value::Undefined))
            }

            Expression::UnaryExpression {
                operator,
                argument,
                ..
            } => {
                if let (UnaryOperator::Typeof, Expression::Identifier { name, .. }) =
                    (operator, argument.as_ref())
                {
                    let value = scope::lookup(scope, name).unwrap_or(Value::Undefined);
                    return Ok(Value::string(value.type_of()));
                }
                let value = self.evaluate(argument, scope)?;
                Ok(match operator {
                    UnaryOperator::Not => Value::Boolean(!value.is_truthy()),
                    UnaryOperator::Minus => Value::Number(-value.to_number()),
                    UnaryOperator::Plus => Value::Number(value.to_number()),
                    UnaryOperator::Typeof => Value::string(value.type_of()),
                })
            }

            Expression::UpdateExpression {
                operator,
                prefix,
                target,
                position,
            } => {
                let reference = self.resolve_target(target, scope)?;
                let old = self.get_reference(&reference, scope, *position)?.to_number();
                let new = match operator {
                    UpdateOperator::Increment => old + 1.0,
                    UpdateOperator::Decrement => old - 1.0,
                };
                self.put_reference(&reference, Value::Number(new), scope, *position)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expression::BinaryExpression {
                left,
                operator,
                right,
                position,
            } => {
                let lhs = self.evaluate(left, scope)?;
                let rhs = self.evaluate(right, scope)?;
                self.apply_binary(*operator, &lhs, &rhs, *position)
            }

            Expression::LogicalExpression {
                left,
                operator,
                right,
                ..
            } => {
                let lhs = self.evaluate(left, scope)?;
                match (operator, lhs.is_truthy()) {
                    (LogicalOperator::And, false) | (LogicalOperator::Or, true) => Ok(lhs),
                    _ => self.evaluate(right, scope),
                }
            }

            Expression::AssignmentExpression {
                target,
                operator,
                value,
                position,
            } => {
                let reference = self.resolve_target(target, scope)?;
                let result = match operator.binary_operator() {
                    None => self.evaluate(value, scope)?,
                    Some(op) => {
                        let current = self.get_reference(&reference, scope, *position)?;
                        let rhs = self.evaluate(value, scope)?;
                        self.apply_binary(op, &current, &rhs, *position)?
                    }
                };
                self.put_reference(&reference, result.clone(), scope, *position)?;
                Ok(result)
            }

            Expression::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                if self.evaluate(test, scope)?.is_truthy() {
                    self.evaluate(consequent, scope)
                } else {
                    self.evaluate(alternate, scope)
                }
            }

            Expression::CallExpression {
                callee,
                arguments,
                position,
            } => {
                let (function, this) = match callee.as_ref() {
                    Expression::MemberExpression {
                        object,
                        property,
                        position: member_position,
                    } => {
                        let object = self.evaluate(object, scope)?;
                        let key = self.property_key(property, scope)?;
                        let function = self.get_property(&object, &key, *member_position)?;
                        (function, object)
                    }
                    other => (self.evaluate(other, scope)?, Value::Undefined),
                };
                let args = self.evaluate_arguments(arguments, scope)?;
                if !function.is_callable() {
                    return Err(self.raise(
                        ErrorKind::TypeError,
                        format!("{} is not a function", callee.describe()),
                        *position,
                    ));
                }
                self.mark(*position);
                self.invoke(&function, &this, &args, Some(*position))
            }

            Expression::NewExpression {
                callee,
                arguments,
                position,
            } => {
                let constructor = self.evaluate(callee, scope)?;
                let args = self.evaluate_arguments(arguments, scope)?;
                self.construct(&constructor, &args, callee, *position)
            }

            Expression::MemberExpression {
                object,
                property,
                position,
            } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                self.get_property(&object, &key, *position)
            }
        }
    }

    fn evaluate_arguments(
        &mut self,
        arguments: &[Expression],
        scope: &ScopeRef,
    ) -> Result<Vec<Value>, JsError> {
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate(arg, scope)?);
        }
        Ok(args)
    }

    fn property_key(&mut self, property: &MemberProperty, scope: &ScopeRef) -> Result<String, JsError> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expr) => Ok(self.evaluate(expr, scope)?.to_display_string()),
        }
    }

    fn resolve_target(
        &mut self,
        target: &AssignmentTarget,
        scope: &ScopeRef,
    ) -> Result<Reference, JsError> {
        match target {
            AssignmentTarget::Identifier(name) => Ok(Reference::Binding(name.clone())),
            AssignmentTarget::Member { object, property } => {
                let object = self.evaluate(object, scope)?;
                let key = self.property_key(property, scope)?;
                Ok(Reference::Property(object, key))
            }
        }
    }

    fn get_reference(
        &mut self,
        reference: &Reference,
        scope: &ScopeRef,
        position: SourcePosition,
    ) -> Result<Value, JsError> {
        match reference {
            Reference::Binding(name) => scope::lookup(scope, name).ok_or_else(|| {
                self.raise(
                    ErrorKind::ReferenceError,
                    format!("{} is not defined", name),
                    position,
                )
            }),
            Reference::Property(object, key) => self.get_property(object, key, position),
        }
    }

    fn put_reference(
        &mut self,
        reference: &Reference,
        value: Value,
        scope: &ScopeRef,
        position: SourcePosition,
    ) -> Result<(), JsError> {
        match reference {
            Reference::Binding(name) => self.assign_binding(name, value, scope, position),
            Reference::Property(object, key) => self.set_property(object, key, value, position),
        }
    }

    fn assign_binding(
        &self,
        name: &str,
        value: Value,
        scope: &ScopeRef,
        position: SourcePosition,
    ) -> Result<(), JsError> {
        scope::assign(scope, name, value).map_err(|AssignError::Constant| {
            self.raise(
                ErrorKind::TypeError,
                "Assignment to constant variable.",
                position,
            )
        })
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Read `object[key]`
    pub fn get_property(
        &self,
        object: &Value,
        key: &str,
        position: SourcePosition,
    ) -> Result<Value, JsError> {
        match object {
            Value::Undefined | Value::Null => Err(self.raise(
                ErrorKind::TypeError,
                format!(
                    "Cannot read properties of {} (reading '{}')",
                    object.to_display_string(),
                    key
                ),
                position,
            )),
            Value::String(s) => Ok(string_property(s, key)),
            Value::Boolean(_) | Value::Number(_) => Ok(Value::Undefined),
            Value::Object(object) => Ok(object_property(object, key)),
        }
    }

    /// Write `object[key] = value`
    pub fn set_property(
        &self,
        object: &Value,
        key: &str,
        value: Value,
        position: SourcePosition,
    ) -> Result<(), JsError> {
        let object = match object {
            Value::Undefined | Value::Null => {
                return Err(self.raise(
                    ErrorKind::TypeError,
                    format!(
                        "Cannot set properties of {} (setting '{}')",
                        object.to_display_string(),
                        key
                    ),
                    position,
                ))
            }
            Value::Object(object) => object,
            // Writes to primitives are silently dropped
            _ => return Ok(()),
        };

        let backing_scope = match &object.borrow().kind {
            ObjectKind::Scope(scope) => Some(Rc::clone(scope)),
            _ => None,
        };
        if let Some(scope) = backing_scope {
            return scope.borrow_mut().set_own(key, value).map_err(|_| {
                self.raise(
                    ErrorKind::TypeError,
                    "Assignment to constant variable.",
                    position,
                )
            });
        }

        let mut obj = object.borrow_mut();
        if let ObjectKind::Array(elements) = &mut obj.kind {
            if key == "length" {
                let length = value.to_number();
                if length < 0.0 || length.fract() != 0.0 || length > u32::MAX as f64 {
                    return Err(self.raise(ErrorKind::RangeError, "Invalid array length", position));
                }
                let length = length as usize;
                if length > elements.len() + MAX_ARRAY_GAP {
                    return Err(self.raise(
                        ErrorKind::RangeError,
                        "Array length exceeds supported size",
                        position,
                    ));
                }
                elements.resize(length, Value::Undefined);
                return Ok(());
            }
            if let Ok(index) = key.parse::<usize>() {
                if index < elements.len() + MAX_ARRAY_GAP {
                    if index >= elements.len() {
                        elements.resize(index + 1, Value::Undefined);
                    }
                    elements[index] = value;
                    return Ok(());
                }
            }
        }
        obj.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn has_property(&self, object: &Value, key: &str, position: SourcePosition) -> Result<bool, JsError> {
        let object = match object {
            Value::Object(object) => object,
            other => {
                return Err(self.raise(
                    ErrorKind::TypeError,
                    format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key,
                        other.to_display_string()
                    ),
                    position,
                ))
            }
        };
        let obj = object.borrow();
        let own = match &obj.kind {
            ObjectKind::Scope(scope) => scope.borrow().has_own(key),
            ObjectKind::Array(elements) => {
                key == "length" || key.parse::<usize>().map(|i| i < elements.len()).unwrap_or(false)
            }
            ObjectKind::Function(_) => key == "name",
            ObjectKind::Ordinary | ObjectKind::Error(_) => false,
        };
        Ok(own || obj.properties.contains_key(key))
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn apply_binary(
        &self,
        operator: BinaryOperator,
        lhs: &Value,
        rhs: &Value,
        position: SourcePosition,
    ) -> Result<Value, JsError> {
        let value = match operator {
            BinaryOperator::Add => {
                let stringy = |v: &Value| matches!(v, Value::String(_) | Value::Object(_));
                if stringy(lhs) || stringy(rhs) {
                    let mut s = lhs.to_display_string();
                    s.push_str(&rhs.to_display_string());
                    Value::string(s)
                } else {
                    Value::Number(lhs.to_number() + rhs.to_number())
                }
            }
            BinaryOperator::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
            BinaryOperator::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
            BinaryOperator::Div => Value::Number(lhs.to_number() / rhs.to_number()),
            BinaryOperator::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
            BinaryOperator::Eq => Value::Boolean(lhs.loose_equals(rhs)),
            BinaryOperator::NotEq => Value::Boolean(!lhs.loose_equals(rhs)),
            BinaryOperator::StrictEq => Value::Boolean(lhs.strict_equals(rhs)),
            BinaryOperator::StrictNotEq => Value::Boolean(!lhs.strict_equals(rhs)),
            BinaryOperator::Lt => Value::Boolean(compare(lhs, rhs) == Some(Ordering::Less)),
            BinaryOperator::LtEq => Value::Boolean(matches!(
                compare(lhs, rhs),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOperator::Gt => Value::Boolean(compare(lhs, rhs) == Some(Ordering::Greater)),
            BinaryOperator::GtEq => Value::Boolean(matches!(
                compare(lhs, rhs),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOperator::Instanceof => Value::Boolean(self.instance_of(lhs, rhs, position)?),
            BinaryOperator::In => {
                Value::Boolean(self.has_property(rhs, &lhs.to_display_string(), position)?)
            }
        };
        Ok(value)
    }

    fn instance_of(&self, value: &Value, constructor: &Value, position: SourcePosition) -> Result<bool, JsError> {
        let constructor = match constructor.as_object() {
            Some(object) if constructor.is_callable() => object,
            _ => {
                return Err(self.raise(
                    ErrorKind::TypeError,
                    "Right-hand side of 'instanceof' is not callable",
                    position,
                ))
            }
        };
        let object = match value {
            Value::Object(object) => object,
            _ => return Ok(false),
        };
        let obj = object.borrow();
        if let Some(created_by) = &obj.constructor {
            if created_by.ptr_eq(constructor) {
                return Ok(true);
            }
        }
        if let ObjectKind::Error(kind) = &obj.kind {
            if let Some(Callable::Native { name, .. }) = constructor.callable() {
                return Ok(name == "Error" || name == kind.name());
            }
        }
        Ok(false)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn invoke(
        &mut self,
        function: &Value,
        this: &Value,
        args: &[Value],
        call_site: Option<SourcePosition>,
    ) -> Result<Value, JsError> {
        let callable = match function.as_object().and_then(ObjectRef::callable) {
            Some(callable) => callable,
            None => {
                return Err(JsError::new(
                    ErrorKind::TypeError,
                    format!("{} is not a function", function.to_display_string()),
                ))
            }
        };
        match callable {
            Callable::Closure { def, scope } => self.call_closure(function, &def, &scope, this, args),
            Callable::Native { func, .. } => match func(self, this, args) {
                Ok(value) => Ok(value),
                Err(error) => Err(match call_site {
                    Some(position) => self.locate(error, position),
                    None => error,
                }),
            },
        }
    }

    fn call_closure(
        &mut self,
        function: &Value,
        def: &Rc<FunctionDef>,
        captured: &ScopeRef,
        this: &Value,
        args: &[Value],
    ) -> Result<Value, JsError> {
        if self.frames.len() >= self.max_call_depth {
            let at = self.frames.last().map(|f| f.current).unwrap_or(def.position);
            return Err(self.raise(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
                at,
            ));
        }

        let scope = Scope::child(captured);
        {
            let mut s = scope.borrow_mut();
            if let Some(name) = &def.name {
                s.declare(name, function.clone(), true);
            }
            s.declare("this", this.clone(), false);
            s.declare("arguments", Value::new_array(args.to_vec()), true);
            for (i, param) in def.params.iter().enumerate() {
                let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
                s.declare(param, arg, true);
            }
        }
        self.hoist_declarations(&def.body, &scope);

        self.frames.push(CallFrame::new(def.name.clone(), def.position));
        let result = self.execute_statements(&def.body, &scope);
        self.frames.pop();

        match result? {
            Completion::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    fn construct(
        &mut self,
        constructor: &Value,
        args: &[Value],
        callee: &Expression,
        position: SourcePosition,
    ) -> Result<Value, JsError> {
        let (object, callable) = match constructor
            .as_object()
            .and_then(|o| o.callable().map(|c| (o.clone(), c)))
        {
            Some(found) => found,
            None => {
                return Err(self.raise(
                    ErrorKind::TypeError,
                    format!("{} is not a constructor", callee.describe()),
                    position,
                ))
            }
        };
        self.mark(position);
        match callable {
            Callable::Native { .. } => {
                let result = self.invoke(constructor, &Value::Undefined, args, Some(position))?;
                if let Value::Object(created) = &result {
                    let unset = created.borrow().constructor.is_none();
                    if unset {
                        created.borrow_mut().constructor = Some(object);
                    }
                }
                Ok(result)
            }
            Callable::Closure { .. } => {
                let instance = ObjectRef::new(ObjectKind::Ordinary);
                instance.borrow_mut().constructor = Some(object);
                let this = Value::Object(instance);
                let result = self.invoke(constructor, &this, args, Some(position))?;
                Ok(if matches!(result, Value::Object(_)) {
                    result
                } else {
                    this
                })
            }
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Closures stored in globals capture the global scope
        self.global.borrow_mut().clear();
    }
}

fn make_closure(def: &Rc<FunctionDef>, scope: &ScopeRef) -> Value {
    Value::Object(ObjectRef::new(ObjectKind::Function(Callable::Closure {
        def: Rc::clone(def),
        scope: Rc::clone(scope),
    })))
}

fn instantiate_functions(body: &[Statement], scope: &ScopeRef) {
    for stmt in body {
        if let Statement::FunctionDeclaration(def) = stmt {
            if let Some(name) = &def.name {
                let closure = make_closure(def, scope);
                scope.borrow_mut().declare(name, closure, true);
            }
        }
    }
}

fn collect_var_names(body: &[Statement], names: &mut Vec<String>) {
    for stmt in body {
        collect_var_names_in(stmt, names);
    }
}

fn collect_var_names_in(stmt: &Statement, names: &mut Vec<String>) {
    match stmt {
        Statement::VariableDeclaration {
            kind: VariableKind::Var,
            declarations,
            ..
        } => names.extend(declarations.iter().map(|d| d.name.clone())),
        Statement::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names_in(consequent, names);
            if let Some(alternate) = alternate {
                collect_var_names_in(alternate, names);
            }
        }
        Statement::WhileStatement { body, .. } | Statement::DoWhileStatement { body, .. } => {
            collect_var_names_in(body, names)
        }
        Statement::ForStatement { init, body, .. } => {
            if let Some(init) = init {
                collect_var_names_in(init, names);
            }
            collect_var_names_in(body, names);
        }
        Statement::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            collect_var_names(block, names);
            if let Some(handler) = handler {
                collect_var_names(&handler.body, names);
            }
            if let Some(finalizer) = finalizer {
                collect_var_names(finalizer, names);
            }
        }
        Statement::BlockStatement { body, .. } => collect_var_names(body, names),
        _ => {}
    }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}

fn string_property(s: &str, key: &str) -> Value {
    if key == "length" {
        return Value::Number(s.chars().count() as f64);
    }
    if let Ok(index) = key.parse::<usize>() {
        return s
            .chars()
            .nth(index)
            .map(|c| Value::string(c.to_string()))
            .unwrap_or(Value::Undefined);
    }
    builtins::string_method(key).unwrap_or(Value::Undefined)
}

fn object_property(object: &ObjectRef, key: &str) -> Value {
    let obj = object.borrow();
    match &obj.kind {
        ObjectKind::Scope(scope) => return scope.borrow().get_own(key).unwrap_or(Value::Undefined),
        ObjectKind::Array(elements) => {
            if key == "length" {
                return Value::Number(elements.len() as f64);
            }
            if let Ok(index) = key.parse::<usize>() {
                if let Some(element) = elements.get(index) {
                    return element.clone();
                }
            }
        }
        ObjectKind::Function(callable) => {
            if key == "name" && !obj.properties.contains_key(key) {
                return Value::string(callable.name());
            }
        }
        ObjectKind::Ordinary | ObjectKind::Error(_) => {}
    }
    if let Some(value) = obj.properties.get(key) {
        return value.clone();
    }
    match &obj.kind {
        ObjectKind::Array(_) => builtins::array_method(key).unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    }
}
