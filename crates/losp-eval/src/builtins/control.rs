//! `IF`/`FOR`/`FORI`/`++`/`--`/`=`/`WAIT`: the seven built-in special
//! operators. Each reads its hidden children (latent, never auto-evaluated
//! by the driving loop) directly off the node and drives the rest through
//! `Push` continuations — see `spec.md` §4.3 and §4.4.

use std::rc::Rc;

use losp_core::LospError;
use losp_syntax::{NodeKind, NodeRef};

use crate::eval::{AsyncProxy, OperatorFn};
use crate::result::{ChildResults, EvalResult};
use crate::scope::Scope;
use crate::value::Value;

fn forward_all(results: ChildResults) -> EvalResult {
    EvalResult::emit_many(results.all().cloned().collect())
}

pub fn if_op() -> OperatorFn {
    Rc::new(|_e, _s, node, children| {
        let cond = match children.positional_vec().into_iter().next() {
            Some(v) => v,
            None => return EvalResult::error(LospError::arity("IF", "a condition is required")),
        };
        let hidden = node.hidden_children();
        if matches!(cond, Value::Bool(true)) {
            EvalResult::push(vec![hidden[0].clone()], forward_all)
        } else if let Some(else_branch) = hidden.get(1) {
            EvalResult::push(vec![else_branch.clone()], forward_all)
        } else {
            EvalResult::no_emit()
        }
    })
}

fn for_loop_step(cond: NodeRef, body: NodeRef) -> EvalResult {
    let cond_push = cond.clone();
    EvalResult::push(vec![cond_push], move |results: ChildResults| {
        let cond_val = results.all().next().cloned().unwrap_or(Value::Bool(false));
        if matches!(cond_val, Value::Bool(true)) {
            let body_push = body.clone();
            EvalResult::push(vec![body_push], move |_body_results| for_loop_step(cond, body))
        } else {
            EvalResult::no_emit()
        }
    })
}

pub fn for_op() -> OperatorFn {
    Rc::new(|_e, _s, node, _children| {
        let hidden = node.hidden_children();
        if hidden.len() != 2 {
            return EvalResult::error(LospError::Internal("FOR: missing prepared condition/body".into()));
        }
        for_loop_step(hidden[0].clone(), hidden[1].clone())
    })
}

fn fori_loop_step(scope: Rc<Scope>, idx_name: String, before: i32, body: NodeRef, emit: bool, mut acc: Vec<Value>) -> EvalResult {
    let current = scope.get(&idx_name).and_then(|v| v.as_int()).unwrap_or(before);
    if current < before {
        EvalResult::push(vec![body.clone()], move |results: ChildResults| {
            acc.extend(results.all().cloned());
            scope.assign(&idx_name, Value::Int(current + 1));
            fori_loop_step(scope, idx_name, before, body, emit, acc)
        })
    } else if emit {
        EvalResult::emit_many(acc)
    } else {
        EvalResult::no_emit()
    }
}

pub fn fori_op() -> OperatorFn {
    Rc::new(|_e, scope, node, children| {
        let hidden = node.hidden_children();
        if hidden.len() != 2 {
            return EvalResult::error(LospError::Internal("FORI: missing prepared idx/body".into()));
        }
        let idx_name = match &hidden[0].kind {
            NodeKind::Identifier { name } => name.clone(),
            _ => return EvalResult::error(LospError::Internal("FORI: idx child is not an identifier".into())),
        };
        let body = hidden[1].clone();
        let from = children.get_key("from").cloned().unwrap_or(Value::Int(0));
        let before = children.get_key("before").cloned().unwrap_or(Value::Int(0));
        let emit = children.get_key("emit").map(Value::is_truthy).unwrap_or(false);
        let from_n = match from {
            Value::Int(n) => n,
            other => return EvalResult::error(LospError::wrong_type("FORI", 0, "int", other.type_name())),
        };
        let before_n = match before {
            Value::Int(n) => n,
            other => return EvalResult::error(LospError::wrong_type("FORI", 1, "int", other.type_name())),
        };
        scope.bind(idx_name.clone(), Value::Int(from_n));
        fori_loop_step(scope.clone(), idx_name, before_n, body, emit, Vec::new())
    })
}

fn incdec(op: &str, delta: i32, scope: &Rc<Scope>, node: &NodeRef, children: &ChildResults) -> EvalResult {
    let hidden = node.hidden_children();
    if let Some(ident) = hidden.first() {
        let name = match &ident.kind {
            NodeKind::Identifier { name } => name.clone(),
            _ => return EvalResult::error(LospError::Internal(format!("{op}: hidden child is not an identifier"))),
        };
        let current = match scope.get(&name) {
            Some(v) => v,
            None => return EvalResult::error(LospError::name(name)),
        };
        let updated = match current {
            Value::Int(n) => Value::Int(n + delta),
            Value::Float(f) => Value::Float(f + delta as f32),
            other => return EvalResult::error(LospError::wrong_type(op, 0, "int or float", other.type_name())),
        };
        scope.assign(&name, updated.clone());
        EvalResult::emit(updated)
    } else {
        let value = match children.positional_vec().into_iter().next() {
            Some(v) => v,
            None => return EvalResult::error(LospError::arity(op, "exactly one argument is required")),
        };
        let updated = match value {
            Value::Int(n) => Value::Int(n + delta),
            Value::Float(f) => Value::Float(f + delta as f32),
            other => return EvalResult::error(LospError::wrong_type(op, 0, "int or float", other.type_name())),
        };
        EvalResult::emit(updated)
    }
}

pub fn inc() -> OperatorFn {
    Rc::new(|_e, s, n, c| incdec("++", 1, s, n, c))
}

pub fn dec() -> OperatorFn {
    Rc::new(|_e, s, n, c| incdec("--", -1, s, n, c))
}

pub fn assign() -> OperatorFn {
    Rc::new(|_e, scope, node, children| {
        let hidden = node.hidden_children();
        let name = match hidden.first().map(|n| &n.kind) {
            Some(NodeKind::Identifier { name }) => name.clone(),
            _ => return EvalResult::error(LospError::Internal("=: hidden child is not an identifier".into())),
        };
        let value = match children.positional_vec().into_iter().next() {
            Some(v) => v,
            None => return EvalResult::error(LospError::arity("=", "an expression is required")),
        };
        scope.assign(&name, value.clone());
        EvalResult::emit(value)
    })
}

pub fn wait() -> OperatorFn {
    Rc::new(|evaluator, _scope, node, children| {
        let ms = match children.positional_vec().into_iter().next() {
            Some(Value::Int(n)) if n >= 0 => n,
            Some(other) => return EvalResult::error(LospError::wrong_type("WAIT", 0, "non-negative int", other.type_name())),
            None => return EvalResult::error(LospError::arity("WAIT", "a millisecond count is required")),
        };
        let hidden = node.hidden_children();
        let body = match hidden.first() {
            Some(b) => b.clone(),
            None => return EvalResult::error(LospError::Internal("WAIT: missing prepared body".into())),
        };
        if ms == 0 {
            return EvalResult::push(vec![body], forward_all);
        }
        match evaluator.clock() {
            Some(clock) => {
                let proxy = AsyncProxy::new();
                let proxy_for_cb = proxy.clone();
                clock.schedule(
                    ms,
                    Box::new(move || {
                        proxy_for_cb.complete(EvalResult::push(vec![body], forward_all));
                    }),
                );
                EvalResult::Async { proxy }
            }
            None => EvalResult::error(LospError::Internal("WAIT: no host clock is registered".into())),
        }
    })
}
