//! `RUN`/`DO`/`MUTE`/`LAST`/`EXPAND`/`COLLAPSE`, plus `?` (the transparent
//! condition wrapper `FOR` expects around its boolean test — see
//! `control::for_op`).

use std::rc::Rc;

use crate::eval::OperatorFn;
use crate::result::EvalResult;
use crate::value::Value;

pub fn run() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| EvalResult::emit_many(children.all().cloned().collect()))
}

pub fn mute() -> OperatorFn {
    Rc::new(|_e, _s, _n, _children| EvalResult::no_emit())
}

pub fn last() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| match children.all().last() {
        Some(v) => EvalResult::emit(v.clone()),
        None => EvalResult::no_emit(),
    })
}

pub fn expand() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| {
        let mut out = Vec::new();
        for v in children.all() {
            match v {
                Value::List(items) => out.extend(items.iter().cloned()),
                other => out.push(other.clone()),
            }
        }
        EvalResult::emit_many(out)
    })
}

pub fn collapse() -> OperatorFn {
    Rc::new(|_e, _s, _n, children| EvalResult::emit(Value::list(children.all().cloned().collect())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvalLimits, Evaluator};
    use crate::result::ChildResults;
    use crate::scope::Scope;
    use losp_syntax::{Node, NodeKind};

    fn dummy() -> losp_syntax::NodeRef {
        Node::new(NodeKind::Operator { id: "RUN".into() }, None, None)
    }

    #[test]
    fn expand_flattens_one_level() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::list(vec![Value::Int(1), Value::Int(2)]));
        c.push(None, Value::Int(3));
        match expand()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn collapse_bundles_into_one_list() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let mut c = ChildResults::new();
        c.push(None, Value::Int(1));
        c.push(None, Value::Int(2));
        match collapse()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert_eq!(values, vec![Value::list(vec![Value::Int(1), Value::Int(2)])]),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn last_emits_nothing_on_empty_children() {
        let ev = Evaluator::new(EvalLimits::default());
        let scope = Scope::root();
        let c = ChildResults::new();
        match last()(&ev, &scope, &dummy(), &c) {
            EvalResult::Value { values, .. } => assert!(values.is_empty()),
            _ => panic!("expected a value"),
        }
    }
}
