//! `== != < <= > >=`: exactly two arguments, same-type (or int/float
//! promoted) ordering.

use std::cmp::Ordering;
use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

fn apply_ord(op: &str, ord: Ordering) -> bool {
    match op {
        "==" => ord == Ordering::Equal,
        "!=" => ord != Ordering::Equal,
        "<" => ord == Ordering::Less,
        "<=" => ord != Ordering::Greater,
        ">" => ord == Ordering::Greater,
        ">=" => ord != Ordering::Less,
        _ => false,
    }
}

fn compare(op: &str, children: &ChildResults) -> EvalResult {
    let args = children.positional_vec();
    if args.len() != 2 {
        return EvalResult::error(LospError::arity(op, "exactly two arguments are required"));
    }
    let (a, b) = (&args[0], &args[1]);
    let ordered = match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => match op {
            "==" => Some(x == y),
            "!=" => Some(x != y),
            _ => None,
        },
        (Value::Int(x), Value::Int(y)) => Some(apply_ord(op, x.cmp(y))),
        (Value::Float(x), Value::Float(y)) => Some(apply_ord(op, x.partial_cmp(y).unwrap_or(Ordering::Greater))),
        (Value::Int(x), Value::Float(y)) => Some(apply_ord(op, (*x as f32).partial_cmp(y).unwrap_or(Ordering::Greater))),
        (Value::Float(x), Value::Int(y)) => Some(apply_ord(op, x.partial_cmp(&(*y as f32)).unwrap_or(Ordering::Greater))),
        (Value::String(x), Value::String(y)) => Some(apply_ord(op, x.cmp(y))),
        (Value::Null, Value::Null) => match op {
            "==" => Some(true),
            "!=" => Some(false),
            _ => None,
        },
        _ => None,
    };
    match ordered {
        Some(r) => EvalResult::emit(Value::Bool(r)),
        None => EvalResult::error(LospError::wrong_type(op, 1, a.type_name(), b.type_name())),
    }
}

macro_rules! comparison_op {
    ($name:ident, $sym:literal) => {
        pub fn $name() -> OperatorFn {
            Rc::new(|_e, _s, _n, c| compare($sym, c))
        }
    };
}

comparison_op!(eq, "==");
comparison_op!(ne, "!=");
comparison_op!(lt, "<");
comparison_op!(le, "<=");
comparison_op!(gt, ">");
comparison_op!(ge, ">=");
