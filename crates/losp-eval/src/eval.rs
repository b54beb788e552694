//! The stack-based tree-walking evaluator: an explicit frame stack, a
//! driving loop, and the operator name→handler registry.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use losp_core::LospError;
use losp_syntax::{Literal, NodeKind, NodeRef};

use crate::builtins;
use crate::result::{ChildResults, EvalResult};
use crate::scope::Scope;
use crate::scriptable::ObjectLiteral;
use crate::value::{Lambda, Value};

/// Depth fuse for the tree walker. There is no tail-call optimisation, so a
/// pathological program must hit a catchable error rather than overflow the
/// host's native stack.
#[derive(Debug, Clone, Copy)]
pub struct EvalLimits {
    pub max_depth: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self { max_depth: 4096 }
    }
}

pub type OperatorFn = Rc<dyn Fn(&Rc<Evaluator>, &Rc<Scope>, &NodeRef, &ChildResults) -> EvalResult>;

/// A host-supplied timer, consulted only by `WAIT` for non-zero delays.
/// Installing one is optional — a program that never calls `WAIT` with a
/// positive delay needs no clock at all.
pub trait Clock {
    fn schedule(&self, ms: i32, callback: Box<dyn FnOnce()>);
}

/// The terminal shape of a whole evaluation; a host never observes `Push`.
pub enum Outcome {
    Value(Vec<Value>),
    Error(LospError),
    Async(Rc<AsyncProxy>),
}

/// A one-shot completion port bridging an operator's suspension to the
/// driving loop, modelled as a slot protected by the evaluator's
/// single-threaded discipline: first completion wins, later ones are
/// ignored, exactly as `spec.md` §9 describes.
pub struct AsyncProxy {
    completed: RefCell<bool>,
    pending_result: RefCell<Option<EvalResult>>,
    callback: RefCell<Option<Box<dyn FnOnce(EvalResult)>>>,
}

impl AsyncProxy {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            completed: RefCell::new(false),
            pending_result: RefCell::new(None),
            callback: RefCell::new(None),
        })
    }

    /// Completes the proxy with `result`. Ignored if already completed.
    /// Completing with another `Async` is a contract violation and is
    /// turned into an `Error` before delivery.
    pub fn complete(&self, result: EvalResult) {
        if *self.completed.borrow() {
            return;
        }
        let result = match result {
            EvalResult::Async { .. } => EvalResult::error(LospError::AsyncContractViolation),
            other => other,
        };
        *self.completed.borrow_mut() = true;
        let cb = self.callback.borrow_mut().take();
        match cb {
            Some(cb) => cb(result),
            None => *self.pending_result.borrow_mut() = Some(result),
        }
    }

    /// Registers the driver's resumption callback. Fires immediately if the
    /// proxy already has a pending result.
    pub fn on_completed(&self, callback: impl FnOnce(EvalResult) + 'static) {
        let pending = self.pending_result.borrow_mut().take();
        match pending {
            Some(result) => callback(result),
            None => *self.callback.borrow_mut() = Some(Box::new(callback)),
        }
    }

    /// Takes a result that is already sitting in the proxy without
    /// registering a callback. Used by the top-level caller to decide
    /// whether it can return synchronously.
    fn try_take_result(&self) -> Option<EvalResult> {
        self.pending_result.borrow_mut().take()
    }
}

enum FramePurpose {
    Node(NodeRef),
    Continuation(Box<dyn FnOnce(ChildResults) -> EvalResult>),
}

/// One entry on the evaluator's explicit stack: the children left to
/// evaluate, the results accumulated so far, the scope this frame runs in,
/// and what to do once its children are exhausted.
struct Frame {
    purpose: FramePurpose,
    children: Vec<NodeRef>,
    idx: usize,
    accum: ChildResults,
    scope: Rc<Scope>,
}

impl Frame {
    fn for_node(node: NodeRef, scope: Rc<Scope>) -> Self {
        let children = node.eval_children().to_vec();
        Self {
            purpose: FramePurpose::Node(node),
            children,
            idx: 0,
            accum: ChildResults::new(),
            scope,
        }
    }

    fn for_push(
        nodes: Vec<NodeRef>,
        scope: Rc<Scope>,
        on_complete: Box<dyn FnOnce(ChildResults) -> EvalResult>,
    ) -> Self {
        Self {
            purpose: FramePurpose::Continuation(on_complete),
            children: nodes,
            idx: 0,
            accum: ChildResults::new(),
            scope,
        }
    }
}

#[derive(Default)]
struct Registry {
    /// Built-in standard operators, keyed by name.
    standard: HashMap<String, OperatorFn>,
    /// Built-in and host-registered special operator handlers.
    special_handlers: HashMap<String, OperatorFn>,
    /// Every name considered "special" (shadows tier 2–4 lookup for plain
    /// `Operator` nodes sharing the name — see `dispatch_operator_like`).
    special_names: HashSet<String>,
    /// Host-registered standard operators; consulted ahead of the built-in
    /// standard table except for `LOSP:`-prefixed names.
    host_standard: HashMap<String, OperatorFn>,
}

/// Owns the operator registry and the root (global) scope. Cheap to clone
/// via the `Rc` it is always held behind — cloning bumps a refcount, not the
/// registry.
pub struct Evaluator {
    registry: RefCell<Registry>,
    pub globals: Rc<Scope>,
    pub limits: EvalLimits,
    clock: RefCell<Option<Rc<dyn Clock>>>,
}

impl Evaluator {
    pub fn new(limits: EvalLimits) -> Rc<Self> {
        let mut registry = Registry::default();
        registry.standard = builtins::standard_operators();
        registry.special_handlers = builtins::special_operators();
        registry.special_names = registry.special_handlers.keys().cloned().collect();
        Rc::new(Self {
            registry: RefCell::new(registry),
            globals: Scope::root(),
            limits,
            clock: RefCell::new(None),
        })
    }

    pub fn set_clock(&self, clock: Rc<dyn Clock>) {
        *self.clock.borrow_mut() = Some(clock);
    }

    pub fn clock(&self) -> Option<Rc<dyn Clock>> {
        self.clock.borrow().clone()
    }

    /// Registers or overrides a standard operator. Names beginning with
    /// `LOSP:` are reserved for built-ins and test hooks.
    pub fn register_operator(&self, name: impl Into<String>, handler: OperatorFn) -> Result<(), LospError> {
        let name = name.into();
        if name.starts_with("LOSP:") {
            return Err(LospError::SpecialOpMisuse {
                message: format!("{name}: names beginning with LOSP: are reserved"),
            });
        }
        if self.registry.borrow().special_names.contains(&name) {
            return Err(LospError::SpecialOpMisuse {
                message: format!("{name}: special operators may not be overridden"),
            });
        }
        self.registry.borrow_mut().host_standard.insert(name, handler);
        Ok(())
    }

    /// Registers a new host special operator. The name must start with `$`
    /// and be at least two characters, per `spec.md` §6.
    pub fn register_special_operator(&self, name: impl Into<String>, handler: OperatorFn) -> Result<(), LospError> {
        let name = name.into();
        if !(name.starts_with('$') && name.len() > 1) {
            return Err(LospError::SpecialOpMisuse {
                message: "host special operators must start with '$' and be at least two characters".into(),
            });
        }
        let mut reg = self.registry.borrow_mut();
        reg.special_names.insert(name.clone());
        reg.special_handlers.insert(name, handler);
        Ok(())
    }

    pub fn try_get_operator(&self, name: &str) -> Option<OperatorFn> {
        let reg = self.registry.borrow();
        reg.host_standard.get(name).or_else(|| reg.standard.get(name)).cloned()
    }

    pub fn try_get_special_operator(&self, name: &str) -> Option<OperatorFn> {
        self.registry.borrow().special_handlers.get(name).cloned()
    }

    pub fn set_global(&self, name: impl Into<String>, value: Value) {
        self.globals.bind(name, value);
    }

    pub fn try_get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    pub fn eval(self: &Rc<Self>, root: NodeRef) -> Outcome {
        self.eval_in_scope(root, self.globals.clone())
    }

    pub fn eval_in_scope(self: &Rc<Self>, root: NodeRef, scope: Rc<Scope>) -> Outcome {
        self.run_stack(vec![Frame::for_node(root, scope)])
    }

    pub fn call(self: &Rc<Self>, lambda: &Rc<Lambda>, args: Vec<Value>) -> Outcome {
        let mut accum = ChildResults::new();
        for a in args {
            accum.push(None, a);
        }
        match self.call_lambda(lambda, &self.globals, &accum) {
            EvalResult::Push { nodes, scope, on_complete } => {
                let frame_scope = scope.unwrap_or_else(|| self.globals.clone());
                self.run_stack(vec![Frame::for_push(nodes, frame_scope, on_complete)])
            }
            _ => unreachable!("call_lambda always returns a Push"),
        }
    }

    fn run_stack(self: &Rc<Self>, stack: Vec<Frame>) -> Outcome {
        let top_proxy = AsyncProxy::new();
        let proxy_for_finish = top_proxy.clone();
        let finish: Rc<dyn Fn(Outcome)> = Rc::new(move |outcome: Outcome| {
            proxy_for_finish.complete(outcome_to_eval_result(outcome));
        });
        self.drive(stack, finish);
        match top_proxy.try_take_result() {
            Some(result) => eval_result_to_outcome(result),
            None => Outcome::Async(top_proxy),
        }
    }

    /// The driving loop: repeatedly push a frame for the next unprocessed
    /// child, or dispatch the top frame once it has none left.
    fn drive(self: &Rc<Self>, mut stack: Vec<Frame>, finish: Rc<dyn Fn(Outcome)>) {
        loop {
            if stack.len() > self.limits.max_depth {
                finish(Outcome::Error(LospError::Internal(format!(
                    "evaluator exceeded max frame depth {}",
                    self.limits.max_depth
                ))));
                return;
            }
            let Some(top) = stack.last_mut() else {
                finish(Outcome::Value(Vec::new()));
                return;
            };
            if top.idx < top.children.len() {
                let child = top.children[top.idx].clone();
                top.idx += 1;
                let child_scope = top.scope.clone();
                stack.push(Frame::for_node(child, child_scope));
                continue;
            }
            let frame = stack.pop().unwrap();
            let raw = self.dispatch(frame);
            match self.settle(raw, stack, &finish) {
                Some(next) => stack = next,
                None => return,
            }
        }
    }

    /// Applies one raw `EvalResult` to the stack. Returns `Some(stack)` to
    /// keep driving, or `None` if `finish` was already called (a terminal
    /// value or error) or the frame suspended on a fresh proxy (its own
    /// resumption is already registered).
    fn settle(self: &Rc<Self>, raw: EvalResult, mut stack: Vec<Frame>, finish: &Rc<dyn Fn(Outcome)>) -> Option<Vec<Frame>> {
        match raw {
            EvalResult::Push { nodes, scope, on_complete } => {
                let frame_scope = scope.unwrap_or_else(|| {
                    stack.last().map(|f| f.scope.clone()).unwrap_or_else(|| self.globals.clone())
                });
                stack.push(Frame::for_push(nodes, frame_scope, on_complete));
                Some(stack)
            }
            EvalResult::Async { proxy } => {
                let evaluator = self.clone();
                let finish = finish.clone();
                proxy.on_completed(move |inner| evaluator.drive_from(stack, inner, finish));
                None
            }
            EvalResult::Error { source: _, error } => {
                // No built-in intercepts a child's error, so it keeps
                // unwinding: every remaining frame is discarded and the
                // error is forwarded unchanged.
                finish(Outcome::Error(error));
                None
            }
            EvalResult::Value { key, values } => match stack.last_mut() {
                Some(parent) => {
                    parent.accum.extend(key, values);
                    Some(stack)
                }
                None => {
                    finish(Outcome::Value(values));
                    None
                }
            },
        }
    }

    /// Resumes driving after a suspended frame's proxy fires with `inner`.
    fn drive_from(self: &Rc<Self>, stack: Vec<Frame>, inner: EvalResult, finish: Rc<dyn Fn(Outcome)>) {
        if let Some(next) = self.settle(inner, stack, &finish) {
            self.drive(next, finish);
        }
    }

    fn dispatch(self: &Rc<Self>, frame: Frame) -> EvalResult {
        let Frame { purpose, accum, scope, .. } = frame;
        match purpose {
            FramePurpose::Continuation(on_complete) => on_complete(accum),
            FramePurpose::Node(node) => self.dispatch_node(&node, &scope, accum),
        }
    }

    fn dispatch_node(self: &Rc<Self>, node: &NodeRef, scope: &Rc<Scope>, accum: ChildResults) -> EvalResult {
        match &node.kind {
            NodeKind::Literal(lit) => EvalResult::emit(literal_to_value(lit)),

            NodeKind::Identifier { name } => {
                if name == "," {
                    return EvalResult::no_emit();
                }
                match scope.get(name) {
                    Some(v) => EvalResult::emit(v),
                    None => EvalResult::error(LospError::name(name.clone())),
                }
            }

            NodeKind::List => EvalResult::emit(Value::list(accum.all().cloned().collect())),

            NodeKind::ObjectLiteral { tags } => {
                let entries: Vec<(String, Value)> = accum
                    .iter()
                    .filter_map(|(k, v)| k.map(|k| (k.to_string(), v.clone())))
                    .collect();
                EvalResult::emit(Value::Scriptable(Rc::new(ObjectLiteral::new(tags.clone(), entries))))
            }

            NodeKind::KeyValue { id, tags } => {
                if accum.is_empty() {
                    return EvalResult::emit_keyed(id.clone(), Value::Bool(true));
                }
                let any_keyed = accum.iter().any(|(k, _)| k.is_some());
                if any_keyed {
                    let entries: Vec<(String, Value)> = accum
                        .iter()
                        .filter_map(|(k, v)| k.map(|k| (k.to_string(), v.clone())))
                        .collect();
                    let obj = ObjectLiteral::new(tags.clone(), entries);
                    EvalResult::emit_keyed(id.clone(), Value::Scriptable(Rc::new(obj)))
                } else if accum.len() == 1 {
                    let v = accum.iter().next().unwrap().1.clone();
                    EvalResult::emit_keyed(id.clone(), v)
                } else {
                    let values: Vec<Value> = accum.iter().map(|(_, v)| v.clone()).collect();
                    EvalResult::emit_keyed(id.clone(), Value::list(values))
                }
            }

            NodeKind::Function { params } => {
                let names = params
                    .eval_children()
                    .iter()
                    .filter_map(|p| match &p.kind {
                        NodeKind::Identifier { name } => Some(name.clone()),
                        _ => None,
                    })
                    .collect();
                let body = node.function_body().to_vec();
                EvalResult::emit(Value::Lambda(Rc::new(Lambda { params: names, body })))
            }

            NodeKind::Operator { .. } | NodeKind::SpecialOperator { .. } | NodeKind::Filter { .. } => {
                self.dispatch_operator_like(node, scope, &accum)
            }
        }
    }

    /// `Operator`/`SpecialOperator`/`Filter` share one dispatch contract:
    /// first probe the scope for a lambda shadowing the name, then resolve
    /// a handler through the four-tier lookup in `spec.md` §4.4. A `Filter`
    /// node resolves exactly like an `Operator` of the same id — the
    /// language core defines no generic chain-following evaluation for
    /// `next`; a host wanting pipeline semantics reads the chain itself
    /// from a special operator's hidden children (see `DESIGN.md`).
    fn dispatch_operator_like(self: &Rc<Self>, node: &NodeRef, scope: &Rc<Scope>, accum: &ChildResults) -> EvalResult {
        let id = node.operator_id().expect("operator-like node always has an id").to_string();

        if let Some(Value::Lambda(lambda)) = scope.get(&id) {
            return self.call_lambda(&lambda, scope, accum);
        }

        let is_special_node = matches!(node.kind, NodeKind::SpecialOperator { .. });
        let names_special = self.registry.borrow().special_names.contains(&id);

        if names_special {
            if !is_special_node {
                return EvalResult::error(LospError::SpecialOpMisuse {
                    message: format!("{id} is a special operator and must be called as {id}(...)"),
                });
            }
            let handler = self.registry.borrow().special_handlers.get(&id).cloned();
            return match handler {
                Some(h) => h(self, scope, node, accum),
                None => EvalResult::error(LospError::Internal(format!(
                    "no handler registered for special operator {id}"
                ))),
            };
        }

        if id.starts_with("LOSP:") {
            let handler = self.registry.borrow().standard.get(&id).cloned();
            return match handler {
                Some(h) => h(self, scope, node, accum),
                None => EvalResult::error(LospError::name(id)),
            };
        }

        let handler = {
            let reg = self.registry.borrow();
            reg.host_standard.get(&id).cloned().or_else(|| reg.standard.get(&id).cloned())
        };
        match handler {
            Some(h) => h(self, scope, node, accum),
            None => EvalResult::error(LospError::name(id)),
        }
    }

    /// Creates the lambda-call frame's `Push`: a child scope parented on
    /// the *caller's* current scope (Losp lambdas are not lexical closures —
    /// only their parameters are fresh bindings) with the first `k`
    /// parameters bound positionally, `k = min(params, args)`.
    fn call_lambda(self: &Rc<Self>, lambda: &Rc<Lambda>, caller_scope: &Rc<Scope>, accum: &ChildResults) -> EvalResult {
        let args = accum.positional_vec();
        let call_scope = Scope::child(caller_scope);
        let k = lambda.params.len().min(args.len());
        for i in 0..k {
            call_scope.bind(lambda.params[i].clone(), args[i].clone());
        }
        let body = lambda.body.clone();
        EvalResult::push_in_scope(body, call_scope, |accum: ChildResults| {
            EvalResult::emit_many(accum.all().cloned().collect())
        })
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::String(s) => Value::string(s.clone()),
    }
}

fn outcome_to_eval_result(outcome: Outcome) -> EvalResult {
    match outcome {
        Outcome::Value(values) => EvalResult::Value { key: None, values },
        Outcome::Error(e) => EvalResult::error(e),
        Outcome::Async(_) => unreachable!("finish never receives Outcome::Async"),
    }
}

fn eval_result_to_outcome(result: EvalResult) -> Outcome {
    match result {
        EvalResult::Value { values, .. } => Outcome::Value(values),
        EvalResult::Error { error, .. } => Outcome::Error(error),
        EvalResult::Async { .. } => Outcome::Error(LospError::AsyncContractViolation),
        EvalResult::Push { .. } => Outcome::Error(LospError::Internal("a Push result reached the top level".into())),
    }
}
