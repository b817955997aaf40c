//! Lexical environment: a parent-linked chain of frames with shared
//! ownership, so closures can keep a frame alive after its defining call
//! returns. Modeled with `Rc<RefCell<_>>` rather than raw parent
//! back-pointers, per the closure environment graph design note.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub struct Environment {
    values: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn root() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            parent: None,
        }))
    }

    pub fn create_child(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.values.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.borrow().get(name))
    }

    /// Assigns to the nearest enclosing scope that already contains `name`;
    /// if no scope declares it, creates the binding in the current scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return;
        }
        if let Some(parent) = &self.parent {
            if parent.borrow().contains(name) {
                parent.borrow_mut().assign(name, value);
                return;
            }
        }
        self.values.insert(name.to_string(), value);
    }

    /// Forces a binding into the current scope, used for parameter binding
    /// at call time so a recursive call never clobbers an outer binding.
    pub fn assign_current(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|p| p.borrow().contains(name))
    }
}
