//! `+ - * / % ^`: the integer/float accumulator described in `spec.md` §4.6 —
//! integer mode until the first float operand, after which the whole fold
//! stays float.

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

enum Acc {
    Int(i32),
    Float(f32),
}

fn fold_arith(op: &str, children: &ChildResults, int_op: impl Fn(i32, i32) -> i32, float_op: impl Fn(f32, f32) -> f32) -> EvalResult {
    let args = children.positional_vec();
    if args.is_empty() {
        return EvalResult::error(LospError::arity(op, "at least one argument is required"));
    }
    let mut acc = match &args[0] {
        Value::Int(n) => Acc::Int(*n),
        Value::Float(f) => Acc::Float(*f),
        other => return EvalResult::error(LospError::wrong_type(op, 0, "int or float", other.type_name())),
    };
    for (i, arg) in args.iter().enumerate().skip(1) {
        let operand = match arg {
            Value::Int(n) => Acc::Int(*n),
            Value::Float(f) => Acc::Float(*f),
            other => return EvalResult::error(LospError::wrong_type(op, i, "int or float", other.type_name())),
        };
        acc = match (acc, operand) {
            (Acc::Int(a), Acc::Int(b)) => Acc::Int(int_op(a, b)),
            (Acc::Int(a), Acc::Float(b)) => Acc::Float(float_op(a as f32, b)),
            (Acc::Float(a), Acc::Int(b)) => Acc::Float(float_op(a, b as f32)),
            (Acc::Float(a), Acc::Float(b)) => Acc::Float(float_op(a, b)),
        };
    }
    EvalResult::emit(match acc {
        Acc::Int(n) => Value::Int(n),
        Acc::Float(f) => Value::Float(f),
    })
}

pub fn add() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| fold_arith("+", c, |a, b| a.wrapping_add(b), |a, b| a + b))
}

pub fn sub() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| fold_arith("-", c, |a, b| a.wrapping_sub(b), |a, b| a - b))
}

pub fn mul() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| fold_arith("*", c, |a, b| a.wrapping_mul(b), |a, b| a * b))
}

/// Division by zero yields `INT_MAX` in integer mode; float division by
/// zero produces `+∞` for free via IEEE 754 semantics.
pub fn div() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| fold_arith("/", c, |a, b| if b == 0 { i32::MAX } else { a.wrapping_div(b) }, |a, b| a / b))
}

/// Integer `%` by zero would panic in Rust, so it takes the same `INT_MAX`
/// fallback as `/` rather than the unspecified behaviour the bare operator
/// would otherwise have.
pub fn rem() -> OperatorFn {
    Rc::new(|_e, _s, _n, c| fold_arith("%", c, |a, b| if b == 0 { i32::MAX } else { a.wrapping_rem(b) }, |a, b| a % b))
}

/// `^` always folds through `f32::powf`, rounding back to int only if every
/// operand seen was an int.
pub fn pow() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.is_empty() {
            return EvalResult::error(LospError::arity("^", "at least one argument is required"));
        }
        let mut int_mode = true;
        let mut acc = match &args[0] {
            Value::Int(n) => *n as f32,
            Value::Float(f) => {
                int_mode = false;
                *f
            }
            other => return EvalResult::error(LospError::wrong_type("^", 0, "int or float", other.type_name())),
        };
        for (i, arg) in args.iter().enumerate().skip(1) {
            let operand = match arg {
                Value::Int(n) => *n as f32,
                Value::Float(f) => {
                    int_mode = false;
                    *f
                }
                other => return EvalResult::error(LospError::wrong_type("^", i, "int or float", other.type_name())),
            };
            acc = acc.powf(operand);
        }
        EvalResult::emit(if int_mode { Value::Int(acc.round() as i32) } else { Value::Float(acc) })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::scope::Scope;
    use losp_syntax::{Node, NodeKind};

    fn dummy_node() -> losp_syntax::NodeRef {
        Node::new(NodeKind::Operator { id: "+".into() }, None, None)
    }

    #[test]
    fn add_stays_int_until_a_float_appears() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(1));
        c.push(None, Value::Int(2));
        let r = add()(&ev, &scope, &dummy_node(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Int(3)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn div_by_zero_saturates_to_int_max() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(5));
        c.push(None, Value::Int(0));
        let r = div()(&ev, &scope, &dummy_node(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Int(i32::MAX)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn pow_rounds_back_to_int_in_int_mode() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(2));
        c.push(None, Value::Int(3));
        let r = pow()(&ev, &scope, &dummy_node(), &c);
        match r {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Int(8)]),
            _ => panic!("expected a value"),
        }
    }
}
