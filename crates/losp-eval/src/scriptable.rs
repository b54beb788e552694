//! The script-object interface: a polymorphic "object with named fields"
//! capability used by object literals and host-provided objects alike.
//!
//! The language core depends only on the [`Scriptable`] trait, never on a
//! concrete implementation — grounded in the host-object abstraction the
//! teacher reaches for when bridging external state into the VM
//! (`lumen-runtime/src/tools.rs`'s `ToolProvider`/`ToolDispatcher` split).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Keys, get, set, try-clear, and materialise-to-map: the full capability
/// surface a script object exposes to the evaluator and to built-ins like
/// `.` (property) and `MERGE`.
pub trait Scriptable: fmt::Debug {
    fn keys(&self) -> Vec<String>;
    fn get(&self, key: &str) -> Option<Value>;
    /// Sets `key` to `value`, returning whether the object accepted the
    /// write (a reflection-backed object may reject unknown or read-only
    /// fields).
    fn set(&self, key: &str, value: Value) -> bool;
    /// Clears `key`, returning whether the object accepted the removal.
    fn try_clear(&self, key: &str) -> bool;
    /// The tags attached at construction, if any (object literals carry an
    /// ordered tag list; host objects generally have none).
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Materialises every key into a caller-supplied type via `mapper`.
    fn to_map<T>(&self, mut mapper: impl FnMut(&str, Value) -> T) -> HashMap<String, T>
    where
        Self: Sized,
    {
        self.keys()
            .into_iter()
            .filter_map(|k| {
                let v = self.get(&k)?;
                Some((k.clone(), mapper(&k, v)))
            })
            .collect()
    }
}

/// The built-in object literal: an insertion-ordered map plus a tag list,
/// backing `{{ ... }}` expressions.
#[derive(Debug)]
pub struct ObjectLiteral {
    tags: Vec<String>,
    order: RefCell<Vec<String>>,
    fields: RefCell<HashMap<String, Value>>,
}

impl ObjectLiteral {
    pub fn new(tags: Vec<String>, entries: Vec<(String, Value)>) -> Self {
        let order = entries.iter().map(|(k, _)| k.clone()).collect();
        let fields = entries.into_iter().collect();
        Self {
            tags,
            order: RefCell::new(order),
            fields: RefCell::new(fields),
        }
    }
}

impl Scriptable for ObjectLiteral {
    fn keys(&self) -> Vec<String> {
        self.order.borrow().clone()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.fields.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> bool {
        let mut fields = self.fields.borrow_mut();
        if !fields.contains_key(key) {
            self.order.borrow_mut().push(key.to_string());
        }
        fields.insert(key.to_string(), value);
        true
    }

    fn try_clear(&self, key: &str) -> bool {
        let removed = self.fields.borrow_mut().remove(key).is_some();
        if removed {
            self.order.borrow_mut().retain(|k| k != key);
        }
        removed
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }
}

/// A script object backed by host-supplied closures, for hosts that want to
/// expose a live computed view rather than a snapshot.
pub struct LambdaBacked {
    pub list_keys: Box<dyn Fn() -> Vec<String>>,
    pub getter: Box<dyn Fn(&str) -> Option<Value>>,
    pub setter: Box<dyn Fn(&str, Value) -> bool>,
    pub clearer: Box<dyn Fn(&str) -> bool>,
}

impl fmt::Debug for LambdaBacked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaBacked").finish_non_exhaustive()
    }
}

impl Scriptable for LambdaBacked {
    fn keys(&self) -> Vec<String> {
        (self.list_keys)()
    }

    fn get(&self, key: &str) -> Option<Value> {
        (self.getter)(key)
    }

    fn set(&self, key: &str, value: Value) -> bool {
        (self.setter)(key, value)
    }

    fn try_clear(&self, key: &str) -> bool {
        (self.clearer)(key)
    }
}

/// A read-only script object that enumerates a fixed set of host fields by
/// name, backed by a single reflection closure. Set/clear are always
/// rejected — hosts wanting mutation use [`LambdaBacked`] instead.
pub struct ReflectionBacked {
    pub field_names: Vec<String>,
    pub read: Box<dyn Fn(&str) -> Option<Value>>,
}

impl fmt::Debug for ReflectionBacked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionBacked")
            .field("field_names", &self.field_names)
            .finish_non_exhaustive()
    }
}

impl Scriptable for ReflectionBacked {
    fn keys(&self) -> Vec<String> {
        self.field_names.clone()
    }

    fn get(&self, key: &str) -> Option<Value> {
        (self.read)(key)
    }

    fn set(&self, _key: &str, _value: Value) -> bool {
        false
    }

    fn try_clear(&self, _key: &str) -> bool {
        false
    }
}

/// Produces a new object with keys from both `a` and `b`; `b`'s keys win on
/// conflict. Values are carried by reference (`Value::clone` is a ref-count
/// bump for every reference-shaped variant).
pub fn merge(a: &Rc<dyn Scriptable>, b: &Rc<dyn Scriptable>) -> ObjectLiteral {
    let mut order = Vec::new();
    let mut fields = HashMap::new();
    for key in a.keys() {
        if let Some(v) = a.get(&key) {
            order.push(key.clone());
            fields.insert(key, v);
        }
    }
    for key in b.keys() {
        if let Some(v) = b.get(&key) {
            if !fields.contains_key(&key) {
                order.push(key.clone());
            }
            fields.insert(key, v);
        }
    }
    ObjectLiteral {
        tags: Vec::new(),
        order: RefCell::new(order),
        fields: RefCell::new(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_literal_roundtrip() {
        let obj = ObjectLiteral::new(vec!["flag".into()], vec![("a".into(), Value::Int(1))]);
        assert_eq!(obj.get("a"), Some(Value::Int(1)));
        assert!(obj.set("b", Value::Int(2)));
        assert_eq!(obj.keys(), vec!["a".to_string(), "b".to_string()]);
        assert!(obj.try_clear("a"));
        assert_eq!(obj.keys(), vec!["b".to_string()]);
        assert_eq!(obj.tags(), vec!["flag".to_string()]);
    }

    #[test]
    fn merge_prefers_later_object() {
        let a: Rc<dyn Scriptable> = Rc::new(ObjectLiteral::new(
            vec![],
            vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))],
        ));
        let b: Rc<dyn Scriptable> = Rc::new(ObjectLiteral::new(vec![], vec![("x".into(), Value::Int(9))]));
        let merged = merge(&a, &b);
        assert_eq!(merged.get("x"), Some(Value::Int(9)));
        assert_eq!(merged.get("y"), Some(Value::Int(2)));
    }
}
