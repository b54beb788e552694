//! `ANY`/`ALL`/`IN`/`COUNT` (`spec.md` §4.6).

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

/// `ANY`/`ALL` switch between the strict and truthy predicate via a `~`
/// keyed bool option; truthy when present and true, strict otherwise.
fn predicate_for(children: &ChildResults) -> fn(&Value) -> bool {
    match children.get_key("~") {
        Some(v) if v.is_truthy() => Value::is_truthy,
        _ => Value::is_strictly_true,
    }
}

pub fn any() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.is_empty() {
            return EvalResult::error(LospError::arity("ANY", "at least one argument is required"));
        }
        let test = predicate_for(children);
        EvalResult::emit(Value::Bool(args.iter().any(test)))
    })
}

pub fn all() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.is_empty() {
            return EvalResult::error(LospError::arity("ALL", "at least one argument is required"));
        }
        let test = predicate_for(children);
        EvalResult::emit(Value::Bool(args.iter().all(test)))
    })
}

/// `IN list needle`: equality on boxed values, `null` equals `null`.
pub fn contains_value() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.len() != 2 {
            return EvalResult::error(LospError::arity("IN", "exactly two arguments are required"));
        }
        let list = match &args[0] {
            Value::List(items) => items.clone(),
            other => return EvalResult::error(LospError::wrong_type("IN", 0, "list", other.type_name())),
        };
        let needle = &args[1];
        EvalResult::emit(Value::Bool(list.iter().any(|v| v == needle)))
    })
}

pub fn count() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let arg = match children.positional_vec().into_iter().next() {
            Some(v) => v,
            None => return EvalResult::error(LospError::arity("COUNT", "exactly one argument is required")),
        };
        let n = match &arg {
            Value::List(items) => items.len(),
            Value::Scriptable(obj) => obj.keys().len(),
            other => return EvalResult::error(LospError::wrong_type("COUNT", 0, "list or scriptable", other.type_name())),
        };
        EvalResult::emit(Value::Int(n as i32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::scope::Scope;
    use losp_syntax::{Node, NodeKind};

    fn dummy() -> losp_syntax::NodeRef {
        Node::new(NodeKind::Operator { id: "ANY".into() }, None, None)
    }

    #[test]
    fn any_defaults_to_strict() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(5));
        let r = any()(&ev, &scope, &dummy(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(false)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn any_with_tilde_option_uses_truthy() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(5));
        c.push(Some("~".into()), Value::Bool(true));
        let r = any()(&ev, &scope, &dummy(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(true)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn in_treats_null_as_equal_to_null() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::list(vec![Value::Null, Value::Int(1)]));
        c.push(None, Value::Null);
        let r = contains_value()(&ev, &scope, &dummy(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(true)]),
            _ => panic!("expected a value"),
        }
    }
}
