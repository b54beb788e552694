//! Losp's host-facing facade: parse source text, build an [`Evaluator`],
//! and drive it — synchronously or as a [`Future`] — to a terminal
//! [`Outcome`].
//!
//! Everything a host needs lives behind this crate; `losp-core`,
//! `losp-syntax`, and `losp-eval` are the layers underneath it.
//!
//! ```
//! use losp::{eval_source, EvalLimits, Evaluator, Outcome, Value};
//!
//! let evaluator = Evaluator::new(EvalLimits::default());
//! match eval_source(&evaluator, "(+ 5 6)") {
//!     Outcome::Value(values) => assert_eq!(values, vec![Value::Int(11)]),
//!     _ => unreachable!(),
//! }
//! ```

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

pub use losp_core::LospError;
pub use losp_eval::{
    Clock, EvalLimits, EvalResult, Evaluator, Lambda, LambdaBacked, ObjectLiteral, Outcome,
    ReflectionBacked, Scope, Scriptable, Value,
};
pub use losp_eval::eval::OperatorFn;
pub use losp_syntax::{Literal, Node, NodeKind, NodeRef};

/// Parses `source` into the root node the evaluator walks.
pub fn parse(source: &str) -> Result<NodeRef, LospError> {
    losp_syntax::parse(source)
}

/// Parses and evaluates `source` against `evaluator`'s globals in one step.
/// A parse failure is reported as `Outcome::Error` with a null source node,
/// matching `eval(source)`'s contract for a host that never sees the AST.
pub fn eval_source(evaluator: &Rc<Evaluator>, source: &str) -> Outcome {
    match parse(source) {
        Ok(root) => evaluator.eval(root),
        Err(e) => Outcome::Error(e),
    }
}

struct Shared {
    result: Option<Result<Vec<Value>, LospError>>,
    waker: Option<Waker>,
}

/// A `Future` wrapping an [`Outcome`] — resolves immediately if the
/// evaluation was synchronous, or wakes its executor once the underlying
/// async proxy completes. No async runtime is required to construct or
/// poll one; only to schedule it alongside other work.
pub struct EvalFuture {
    shared: Rc<RefCell<Shared>>,
}

impl Future for EvalFuture {
    type Output = Result<Vec<Value>, LospError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.borrow_mut();
        match shared.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                shared.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

fn eval_result_to_future_output(result: EvalResult) -> Result<Vec<Value>, LospError> {
    match result {
        EvalResult::Value { values, .. } => Ok(values),
        EvalResult::Error { error, .. } => Err(error),
        _ => Err(LospError::Internal(
            "async proxy completed with a non-terminal result".into(),
        )),
    }
}

fn outcome_to_future(outcome: Outcome) -> EvalFuture {
    let shared = Rc::new(RefCell::new(Shared { result: None, waker: None }));
    match outcome {
        Outcome::Value(values) => shared.borrow_mut().result = Some(Ok(values)),
        Outcome::Error(e) => shared.borrow_mut().result = Some(Err(e)),
        Outcome::Async(proxy) => {
            let shared_for_cb = shared.clone();
            proxy.on_completed(move |inner| {
                let mut s = shared_for_cb.borrow_mut();
                s.result = Some(eval_result_to_future_output(inner));
                if let Some(waker) = s.waker.take() {
                    waker.wake();
                }
            });
        }
    }
    EvalFuture { shared }
}

/// `eval_async(node) → future<ValueOrError>`: resolves the `Async` case of
/// [`Evaluator::eval`] internally instead of handing the host a raw proxy.
pub fn eval_async(evaluator: &Rc<Evaluator>, root: NodeRef) -> EvalFuture {
    outcome_to_future(evaluator.eval(root))
}

/// `call_async` analogous to [`eval_async`], over [`Evaluator::call`].
pub fn call_async(evaluator: &Rc<Evaluator>, lambda: &Rc<Lambda>, args: Vec<Value>) -> EvalFuture {
    outcome_to_future(evaluator.call(lambda, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_surfaces_as_an_error_outcome() {
        let evaluator = Evaluator::new(EvalLimits::default());
        match eval_source(&evaluator, "(+ 1 2") {
            Outcome::Error(_) => {}
            _ => panic!("expected a syntax error"),
        }
    }

    #[test]
    fn eval_source_runs_parse_and_eval_together() {
        let evaluator = Evaluator::new(EvalLimits::default());
        match eval_source(&evaluator, "(+ 5 6)") {
            Outcome::Value(values) => assert_eq!(values, vec![Value::Int(11)]),
            _ => panic!("expected a value"),
        }
    }
}
