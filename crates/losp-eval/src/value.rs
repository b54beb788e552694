//! The runtime value model.
//!
//! Collection-shaped variants (`List`, `Lambda`, `Scriptable`, `Extrinsic`)
//! are `Rc`-wrapped so assignment and merge carry references, never copies —
//! the same reference-counted-by-default posture as the grounding teacher's
//! `Value` enum in `lumen-vm/src/values.rs`.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use losp_syntax::NodeRef;

use crate::scriptable::Scriptable;

/// A first-class function value: captured parameter names plus the body
/// nodes of the `Function` AST node it was built from.
#[derive(Debug)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Vec<NodeRef>,
}

/// Tagged runtime values. `Int`/`Float` are exactly `i32`/`f32` — Losp has no
/// numeric tower beyond those two widths.
#[derive(Clone)]
pub enum Value {
    Null,
    Int(i32),
    Float(f32),
    Bool(bool),
    String(Rc<str>),
    List(Rc<Vec<Value>>),
    Lambda(Rc<Lambda>),
    Scriptable(Rc<dyn Scriptable>),
    /// A host value opaque to the interpreter core, operated on only by
    /// host-registered operators that know how to downcast it.
    Extrinsic(Rc<dyn Any>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::from(s.into()))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Rc::new(values))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Lambda(_) => "lambda",
            Value::Scriptable(_) => "scriptable",
            Value::Extrinsic(_) => "extrinsic",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_scriptable(&self) -> Option<&Rc<dyn Scriptable>> {
        match self {
            Value::Scriptable(s) => Some(s),
            _ => None,
        }
    }

    /// `GetTrue`: exactly boolean `true`, or a list where every element is
    /// strictly true (recursively).
    pub fn is_strictly_true(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::List(items) => items.iter().all(Value::is_strictly_true),
            _ => false,
        }
    }

    /// `GetTrueLike`: strictly true, or a non-zero number, a non-empty
    /// string, or a list where every element is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => items.iter().all(Value::is_truthy),
            Value::Null => false,
            Value::Lambda(_) | Value::Scriptable(_) | Value::Extrinsic(_) => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Scriptable(a), Value::Scriptable(b)) => Rc::ptr_eq(a, b),
            (Value::Extrinsic(a), Value::Extrinsic(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Value {
    /// The untyped, REPL-style rendering: lists as `[v1 v2 …]`, object
    /// literals as space-joined `{key value}` entries. Strings nested inside
    /// a list or object entry are quoted so the structure stays readable;
    /// a bare top-level string is not.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, false)
    }
}

fn render(value: &Value, f: &mut fmt::Formatter<'_>, quote_strings: bool) -> fmt::Result {
    match value {
        Value::Null => write!(f, "null"),
        Value::Int(n) => write!(f, "{n}"),
        Value::Float(n) => write!(f, "{n}"),
        Value::Bool(b) => write!(f, "{b}"),
        Value::String(s) if quote_strings => write!(f, "\"{s}\""),
        Value::String(s) => write!(f, "{s}"),
        Value::List(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                render(item, f, true)?;
            }
            write!(f, "]")
        }
        Value::Lambda(_) => write!(f, "<lambda>"),
        Value::Scriptable(obj) => {
            for (i, key) in obj.keys().iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{{{key} ")?;
                render(&obj.get(key).unwrap_or(Value::Null), f, true)?;
                write!(f, "}}")?;
            }
            Ok(())
        }
        Value::Extrinsic(_) => write!(f, "<extrinsic>"),
    }
}

/// Writes the `<type>`-prefixed rendering tests may assert on.
pub fn write_typed(value: &Value, out: &mut impl fmt::Write) -> fmt::Result {
    match value {
        Value::List(items) => {
            write!(out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, " ")?;
                }
                write_typed(item, out)?;
            }
            write!(out, "]")
        }
        other => write!(out, "<{}>{}", other.type_name(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_equals_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn int_and_float_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn truthiness_laws() {
        assert!(Value::Bool(true).is_strictly_true());
        assert!(!Value::Int(5).is_strictly_true());
        assert!(Value::Int(5).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        let list = Value::list(vec![Value::Bool(true), Value::Int(2)]);
        assert!(list.is_truthy());
        assert!(!list.is_strictly_true());
    }

    #[test]
    fn display_renders_list() {
        let v = Value::list(vec![Value::Int(5), Value::Int(11), Value::string("hello")]);
        assert_eq!(v.to_string(), "[5 11 \"hello\"]");
    }

    #[test]
    fn write_typed_prefixes_atoms() {
        let mut s = String::new();
        write_typed(&Value::Int(5), &mut s).unwrap();
        assert_eq!(s, "<int>5");
    }
}
