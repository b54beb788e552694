//! `PI` and the `LOSP:TEST:DBLPUSH` test hook.

use std::rc::Rc;

use losp_core::{Token, TokenKind};
use losp_syntax::{Literal, Node, NodeRef};

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

pub fn pi() -> OperatorFn {
    Rc::new(|_e, _s, _n, _children| EvalResult::emit(Value::Float(std::f32::consts::PI)))
}

fn synthetic_int(n: i32) -> NodeRef {
    Node::literal(Literal::Int(n), Token::new(TokenKind::Int, 0, 0))
}

/// Issues two sequential `Push` results — one evaluating a synthetic literal
/// `1`, the next a synthetic literal `2` — and emits their sum. Exists only
/// to exercise the driving loop's continuation plumbing in tests.
pub fn dblpush() -> OperatorFn {
    Rc::new(|_e, _s, _n, _children| {
        EvalResult::push(vec![synthetic_int(1)], |first: ChildResults| {
            let v1 = first.all().next().cloned().unwrap_or(Value::Int(0));
            EvalResult::push(vec![synthetic_int(2)], move |second: ChildResults| {
                let v2 = second.all().next().cloned().unwrap_or(Value::Int(0));
                let sum = match (&v1, &v2) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                    _ => Value::Null,
                };
                EvalResult::emit(sum)
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::scope::Scope;
    use losp_syntax::NodeKind;

    #[test]
    fn pi_is_pi() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let node = Node::new(NodeKind::Operator { id: "PI".into() }, None, None);
        let c = ChildResults::new();
        match pi()(&ev, &scope, &node, &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Float(std::f32::consts::PI)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn dblpush_resolves_through_the_driving_loop() {
        let ev = Evaluator::new(EvalLimits::default());
        ev.register_operator("USE-DBLPUSH", dblpush()).unwrap();
        let src = "(USE-DBLPUSH)";
        let root = losp_syntax::parse(src).unwrap();
        match ev.eval(root) {
            crate::eval::Outcome::Value(values) => assert_eq!(values, vec![Value::Int(3)]),
            _ => panic!("expected a synchronous value"),
        }
    }
}
