//! `CONCAT`/`LINE`/`STR-INT`/`TO-STR`/`STARTS`/`ENDS`/`CONTAINS`.

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

pub fn concat() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let delim = children.get_key("delim").and_then(Value::as_str).unwrap_or("");
        let joined = children.positional_vec().iter().map(|v| v.to_string()).collect::<Vec<_>>().join(delim);
        EvalResult::emit(Value::string(joined))
    })
}

pub fn line() -> OperatorFn {
    Rc::new(|_e, _s, _n, _children| EvalResult::emit(Value::string(if cfg!(windows) { "\r\n" } else { "\n" })))
}

pub fn str_int() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let arg = match children.positional_vec().into_iter().next() {
            Some(v) => v,
            None => return EvalResult::error(LospError::arity("STR-INT", "exactly one argument is required")),
        };
        let s = match arg.as_str() {
            Some(s) => s,
            None => return EvalResult::error(LospError::wrong_type("STR-INT", 0, "string", arg.type_name())),
        };
        match s.parse::<i32>() {
            Ok(n) => EvalResult::emit(Value::Int(n)),
            Err(_) => EvalResult::error(LospError::wrong_type("STR-INT", 0, "a parseable integer string", s)),
        }
    })
}

pub fn to_str() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let strings = children.positional_vec().into_iter().map(|v| Value::string(v.to_string())).collect();
        EvalResult::emit_many(strings)
    })
}

fn two_strings(op: &str, children: &ChildResults) -> Result<(String, String), EvalResult> {
    let args = children.positional_vec();
    if args.len() != 2 {
        return Err(EvalResult::error(LospError::arity(op, "exactly two arguments are required")));
    }
    let a = args[0].as_str().ok_or_else(|| EvalResult::error(LospError::wrong_type(op, 0, "string", args[0].type_name())))?;
    let b = args[1].as_str().ok_or_else(|| EvalResult::error(LospError::wrong_type(op, 1, "string", args[1].type_name())))?;
    let ignore_case = children.get_key("i").map(Value::is_truthy).unwrap_or(false)
        && !children.get_key("case").map(Value::is_truthy).unwrap_or(false);
    if ignore_case {
        Ok((a.to_lowercase(), b.to_lowercase()))
    } else {
        Ok((a.to_string(), b.to_string()))
    }
}

pub fn starts() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| match two_strings("STARTS", children) {
        Ok((a, b)) => EvalResult::emit(Value::Bool(a.starts_with(&b))),
        Err(e) => e,
    })
}

pub fn ends() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| match two_strings("ENDS", children) {
        Ok((a, b)) => EvalResult::emit(Value::Bool(a.ends_with(&b))),
        Err(e) => e,
    })
}

pub fn contains_str() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| match two_strings("CONTAINS", children) {
        Ok((a, b)) => EvalResult::emit(Value::Bool(a.contains(&b))),
        Err(e) => e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::scope::Scope;
    use losp_syntax::{Node, NodeKind};

    fn dummy() -> losp_syntax::NodeRef {
        Node::new(NodeKind::Operator { id: "CONCAT".into() }, None, None)
    }

    #[test]
    fn concat_joins_with_delimiter() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(1));
        c.push(None, Value::string("x"));
        c.push(Some("delim".into()), Value::string(","));
        match concat()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::string("1,x")]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn contains_respects_case_insensitive_option() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::string("Hello"));
        c.push(None, Value::string("ELL"));
        c.push(Some("i".into()), Value::Bool(true));
        match contains_str()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(true)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn str_int_errors_on_unparsable_input() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::string("not-a-number"));
        assert!(str_int()(&ev, &scope, &dummy(), &c).is_error());
    }
}
