//! The result family every node evaluation and operator handler produces.

use std::collections::HashMap;

use losp_core::LospError;
use losp_syntax::NodeRef;

use crate::eval::AsyncProxy;
use crate::value::Value;
use std::rc::Rc;

/// What a single node evaluation, or an operator handler invocation,
/// produces. `Push` is internal to the evaluator and never reaches a host.
pub enum EvalResult {
    /// Zero or more values, optionally under a shared key.
    Value { key: Option<String>, values: Vec<Value> },
    Error { source: Option<NodeRef>, error: LospError },
    Async { proxy: Rc<AsyncProxy> },
    /// A continuation: evaluate `nodes` next (in `scope`, or the current
    /// frame's scope if `None` — only lambda calls need a fresh child
    /// scope), then feed their accumulated [`ChildResults`] to
    /// `on_complete`.
    Push {
        nodes: Vec<NodeRef>,
        scope: Option<std::rc::Rc<crate::scope::Scope>>,
        on_complete: Box<dyn FnOnce(ChildResults) -> EvalResult>,
    },
}

impl EvalResult {
    pub fn emit(value: Value) -> Self {
        EvalResult::Value { key: None, values: vec![value] }
    }

    pub fn emit_keyed(key: impl Into<String>, value: Value) -> Self {
        EvalResult::Value {
            key: Some(key.into()),
            values: vec![value],
        }
    }

    pub fn emit_many(values: Vec<Value>) -> Self {
        EvalResult::Value { key: None, values }
    }

    pub fn no_emit() -> Self {
        EvalResult::Value { key: None, values: Vec::new() }
    }

    pub fn error(error: LospError) -> Self {
        EvalResult::Error { source: None, error }
    }

    pub fn error_at(source: NodeRef, error: LospError) -> Self {
        EvalResult::Error { source: Some(source), error }
    }

    pub fn push(
        nodes: Vec<NodeRef>,
        on_complete: impl FnOnce(ChildResults) -> EvalResult + 'static,
    ) -> Self {
        EvalResult::Push { nodes, scope: None, on_complete: Box::new(on_complete) }
    }

    pub fn push_in_scope(
        nodes: Vec<NodeRef>,
        scope: std::rc::Rc<crate::scope::Scope>,
        on_complete: impl FnOnce(ChildResults) -> EvalResult + 'static,
    ) -> Self {
        EvalResult::Push { nodes, scope: Some(scope), on_complete: Box::new(on_complete) }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvalResult::Error { .. })
    }
}

impl From<LospError> for EvalResult {
    fn from(error: LospError) -> Self {
        EvalResult::error(error)
    }
}

impl From<Result<EvalResult, LospError>> for EvalResult {
    fn from(result: Result<EvalResult, LospError>) -> Self {
        match result {
            Ok(r) => r,
            Err(e) => EvalResult::error(e),
        }
    }
}

/// The accumulator a frame builds up as its children finish: an ordered
/// sequence of `(key, value)` pairs, plus a key index so keyed lookups skip
/// positional arguments, mirroring [`losp_syntax::ChildCollection`] but over
/// runtime values instead of AST nodes.
#[derive(Default)]
pub struct ChildResults {
    entries: Vec<(Option<String>, Value)>,
    key_index: HashMap<String, usize>,
}

impl ChildResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Option<String>, value: Value) {
        let index = self.entries.len();
        if let Some(k) = &key {
            self.key_index.insert(k.clone(), index);
        }
        self.entries.push((key, value));
    }

    pub fn extend(&mut self, key: Option<String>, values: Vec<Value>) {
        for v in values {
            self.push(key.clone(), v);
        }
    }

    /// All values in the order their children were evaluated, key or not.
    pub fn all(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Only the unkeyed (positional) values, in order.
    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().filter(|(k, _)| k.is_none()).map(|(_, v)| v)
    }

    /// Every `(key, value)` pair in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_deref(), v))
    }

    pub fn positional_vec(&self) -> Vec<Value> {
        self.positional().cloned().collect()
    }

    pub fn nth_positional(&self, index: usize) -> Option<&Value> {
        self.positional().nth(index)
    }

    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.key_index.get(key).and_then(|&i| self.entries.get(i).map(|(_, v)| v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn positional_len(&self) -> usize {
        self.positional().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_skips_keyed() {
        let mut cr = ChildResults::new();
        cr.push(None, Value::Int(1));
        cr.push(Some("opt".into()), Value::Bool(true));
        cr.push(None, Value::Int(2));
        assert_eq!(cr.positional_vec(), vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(cr.get_key("opt"), Some(&Value::Bool(true)));
        assert_eq!(cr.len(), 3);
    }
}
