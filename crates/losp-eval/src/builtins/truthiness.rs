//! `1 ~1 0 ~0 ! ~!`: single-argument strict/truthy predicates and their
//! negations (`spec.md` §4.6). `!`/`~!` are the same predicates as `0`/`~0`
//! under their more conventional spelling.
//!
//! Note: the tokenizer classifies a bare `1` or `0` as an `Int` literal, not
//! a `Symbol`, so `(1 x)`/`(0 x)` cannot be written in concrete syntax with
//! this grammar — only `~1`, `~0`, `!`, `~!` are reachable that way. All six
//! names are still registered here (reachable via `register_operator`
//! lookups or a hand-built AST) for fidelity to the operator table; see
//! `DESIGN.md`.

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::ChildResults;
use crate::result::EvalResult;
use crate::value::Value;

fn single_arg(op: &str, children: &ChildResults) -> Result<Value, EvalResult> {
    children.positional_vec().into_iter().next().ok_or_else(|| EvalResult::error(LospError::arity(op, "exactly one argument is required")))
}

fn predicate(op: &str, children: &ChildResults, test: impl Fn(&Value) -> bool) -> EvalResult {
    match single_arg(op, children) {
        Ok(v) => EvalResult::emit(Value::Bool(test(&v))),
        Err(e) => e,
    }
}

pub fn strict() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| predicate("1", c, Value::is_strictly_true))
}

pub fn truthy() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| predicate("~1", c, Value::is_truthy))
}

pub fn not_strict() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| predicate("0", c, |v| !v.is_strictly_true()))
}

pub fn not_truthy() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| predicate("~0", c, |v| !v.is_truthy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_requires_exact_bool_true() {
        let mut c = ChildResults::new();
        c.push(None, Value::Int(5));
        match strict()(&crate::eval::Evaluator::new(crate::eval::EvalLimits::default()), &crate::scope::Scope::root(), &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(false)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn truthy_accepts_nonzero_number() {
        let mut c = ChildResults::new();
        c.push(None, Value::Int(5));
        match truthy()(&crate::eval::Evaluator::new(crate::eval::EvalLimits::default()), &crate::scope::Scope::root(), &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Bool(true)]),
            _ => panic!("expected a value"),
        }
    }

    fn dummy() -> losp_syntax::NodeRef {
        losp_syntax::Node::new(losp_syntax::NodeKind::Operator { id: "1".into() }, None, None)
    }
}
