//! The variable context: a lexically nested scope chain.
//!
//! Child scopes hold a non-owning (`Rc`, not a back-pointer from parent to
//! child) reference to their parent and outlive nothing beyond the frame or
//! lambda call that created them — there is no cycle to worry about.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub struct Scope {
    parent: Option<Rc<Scope>>,
    vars: RefCell<HashMap<String, Value>>,
}

impl Scope {
    pub fn root() -> Rc<Scope> {
        Rc::new(Scope { parent: None, vars: RefCell::new(HashMap::new()) })
    }

    pub fn child(parent: &Rc<Scope>) -> Rc<Scope> {
        Rc::new(Scope {
            parent: Some(parent.clone()),
            vars: RefCell::new(HashMap::new()),
        })
    }

    /// Walks the chain to the root looking for `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.vars.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Writes into the innermost scope that already holds `name`; if no
    /// scope in the chain holds it, binds it in `self` (the current frame's
    /// scope).
    pub fn assign(self: &Rc<Self>, name: &str, value: Value) {
        let mut scope = self.clone();
        loop {
            if scope.vars.borrow().contains_key(name) {
                scope.vars.borrow_mut().insert(name.to_string(), value);
                return;
            }
            match &scope.parent {
                Some(p) => {
                    let next = p.clone();
                    scope = next;
                }
                None => break,
            }
        }
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    /// Binds `name` in `self` directly, regardless of any shadowed outer
    /// binding. Used for lambda parameter binding at call time.
    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_parent() {
        let root = Scope::root();
        root.bind("x", Value::Int(1));
        let child = Scope::child(&root);
        assert_eq!(child.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_writes_innermost_holder() {
        let root = Scope::root();
        root.bind("x", Value::Int(1));
        let child = Scope::child(&root);
        child.assign("x", Value::Int(2));
        assert_eq!(root.get("x"), Some(Value::Int(2)));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
    }

    #[test]
    fn assign_with_no_existing_binding_writes_current_frame() {
        let root = Scope::root();
        let child = Scope::child(&root);
        child.assign("y", Value::Int(5));
        assert_eq!(child.get("y"), Some(Value::Int(5)));
        assert_eq!(root.get("y"), None);
    }

    #[test]
    fn lambda_scope_does_not_leak_to_caller() {
        let root = Scope::root();
        let call_scope = Scope::child(&root);
        call_scope.bind("local", Value::Int(42));
        assert_eq!(root.get("local"), None);
    }
}
