//! Lexical scopes and variable bindings

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope
pub type ScopeRef = Rc<RefCell<Scope>>;

/// A single variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    /// Current value
    pub value: Value,
    /// False for `const`
    pub mutable: bool,
}

/// Why an assignment was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// Target is a `const` binding
    Constant,
}

/// One level of the scope chain.
///
/// `var` names are hoisted into the scope of the enclosing function body;
/// block scopes only hold `let`, `const`, catch parameters and block-level
/// function declarations.
#[derive(Debug)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    parent: Option<ScopeRef>,
}

impl Scope {
    /// Create the root (global) scope
    pub fn global() -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: None,
        }))
    }

    /// Create a nested scope for a function body, block, loop or catch
    /// clause
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            bindings: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Create or overwrite a binding in this scope
    pub fn declare(&mut self, name: &str, value: Value, mutable: bool) {
        self.bindings
            .insert(name.to_string(), Binding { value, mutable });
    }

    /// Whether this scope itself holds `name`
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Own binding value
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(|b| b.value.clone())
    }

    /// Write an own binding, declaring it as `var` if missing
    pub fn set_own(&mut self, name: &str, value: Value) -> Result<(), AssignError> {
        match self.bindings.get_mut(name) {
            Some(binding) if !binding.mutable => Err(AssignError::Constant),
            Some(binding) => {
                binding.value = value;
                Ok(())
            }
            None => {
                self.declare(name, value, true);
                Ok(())
            }
        }
    }

    /// Drop every binding in this scope
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

/// Resolve `name` along the scope chain
pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Value> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let s = current.borrow();
            if let Some(binding) = s.bindings.get(name) {
                return Some(binding.value.clone());
            }
            s.parent.clone()
        };
        current = next?;
    }
}

/// Assign to the nearest binding of `name`.
///
/// An unresolved name becomes a new binding of the root scope, the way
/// sloppy-mode scripts create globals by assignment.
pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<(), AssignError> {
    let mut current = Rc::clone(scope);
    loop {
        let next = {
            let mut s = current.borrow_mut();
            if let Some(binding) = s.bindings.get_mut(name) {
                if !binding.mutable {
                    return Err(AssignError::Constant);
                }
                binding.value = value;
                return Ok(());
            }
            s.parent.clone()
        };
        match next {
            Some(parent) => current = parent,
            None => {
                current.borrow_mut().declare(name, value, true);
                return Ok(());
            }
        }
    }
}
