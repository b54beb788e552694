//! `MERGE`: combine two script objects, later keys winning.

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::EvalResult;
use crate::scriptable::merge;
use crate::value::Value;

pub fn merge_op() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.len() != 2 {
            return EvalResult::error(LospError::arity("MERGE", "exactly two arguments are required"));
        }
        let a = match args[0].as_scriptable() {
            Some(obj) => obj.clone(),
            None => return EvalResult::error(LospError::wrong_type("MERGE", 0, "scriptable", args[0].type_name())),
        };
        let b = match args[1].as_scriptable() {
            Some(obj) => obj.clone(),
            None => return EvalResult::error(LospError::wrong_type("MERGE", 1, "scriptable", args[1].type_name())),
        };
        EvalResult::emit(Value::Scriptable(Rc::new(merge(&a, &b))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::result::ChildResults;
    use crate::scope::Scope;
    use crate::scriptable::ObjectLiteral;
    use losp_syntax::{Node, NodeKind};

    #[test]
    fn merge_prefers_second_object() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let a: Rc<dyn crate::scriptable::Scriptable> = Rc::new(ObjectLiteral::new(vec![], vec![("x".into(), Value::Int(1))]));
        let b: Rc<dyn crate::scriptable::Scriptable> = Rc::new(ObjectLiteral::new(vec![], vec![("x".into(), Value::Int(2))]));
        let mut c = ChildResults::new();
        c.push(None, Value::Scriptable(a));
        c.push(None, Value::Scriptable(b));
        let node = Node::new(NodeKind::Operator { id: "MERGE".into() }, None, None);
        match merge_op()(&ev, &scope, &node, &c) {
            EvalResult::Value { values, .. } => match &values[0] {
                Value::Scriptable(obj) => assert_eq!(obj.get("x"), Some(Value::Int(2))),
                _ => panic!("expected a scriptable"),
            },
            _ => panic!("expected a value"),
        }
    }
}
