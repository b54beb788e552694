//! `.`: chained script-object field lookup.

use std::rc::Rc;

use losp_core::LospError;

use crate::eval::OperatorFn;
use crate::result::{ChildResults, EvalResult};
use crate::value::Value;

pub fn property() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let args = children.positional_vec();
        if args.len() < 2 {
            return EvalResult::error(LospError::arity(".", "a script object and at least one key are required"));
        }
        let mut current = args[0].clone();
        for key in &args[1..] {
            let key = match key.as_str() {
                Some(k) => k,
                None => return EvalResult::error(LospError::wrong_type(".", 1, "string", key.type_name())),
            };
            let obj = match current.as_scriptable() {
                Some(obj) => obj,
                None => return EvalResult::error(LospError::Type {
                    operator: ".".into(),
                    index: 0,
                    expected: "script object".into(),
                    got: "intermediate value not a script object".into(),
                }),
            };
            current = match obj.get(key) {
                Some(v) => v,
                None => return EvalResult::error(LospError::Type {
                    operator: ".".into(),
                    index: 1,
                    expected: format!("a field named {key}"),
                    got: "property not found".into(),
                }),
            };
        }
        EvalResult::emit(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::scope::Scope;
    use crate::scriptable::ObjectLiteral;
    use losp_syntax::{Node, NodeKind};

    fn dummy() -> losp_syntax::NodeRef {
        Node::new(NodeKind::Operator { id: ".".into() }, None, None)
    }

    #[test]
    fn chained_lookup_walks_nested_objects() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let inner = ObjectLiteral::new(vec![], vec![("name".into(), Value::string("ok"))]);
        let outer = ObjectLiteral::new(vec![], vec![("child".into(), Value::Scriptable(Rc::new(inner)))]);
        let mut c = ChildResults::new();
        c.push(None, Value::Scriptable(Rc::new(outer)));
        c.push(None, Value::string("child"));
        c.push(None, Value::string("name"));
        match property()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::string("ok")]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn missing_key_errors() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let obj = ObjectLiteral::new(vec![], vec![]);
        let mut c = ChildResults::new();
        c.push(None, Value::Scriptable(Rc::new(obj)));
        c.push(None, Value::string("missing"));
        assert!(property()(&ev, &scope, &dummy(), &c).is_error());
    }
}
