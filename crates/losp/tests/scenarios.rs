//! End-to-end scenarios and property-based invariants.

use std::rc::Rc;

use losp::{eval_source, EvalLimits, Evaluator, Outcome, Value};
use losp_eval::eval::AsyncProxy;
use losp_eval::result::EvalResult;
use proptest::prelude::*;

fn fresh() -> Rc<Evaluator> {
    Evaluator::new(EvalLimits::default())
}

fn eval_to_values(source: &str) -> Vec<Value> {
    let ev = fresh();
    match eval_source(&ev, source) {
        Outcome::Value(values) => values,
        Outcome::Error(e) => panic!("{source}: unexpected error: {e}"),
        Outcome::Async(_) => panic!("{source}: unexpected suspension"),
    }
}

#[test]
fn scenario_1_simple_addition() {
    assert_eq!(eval_to_values("(+ 5 6)"), vec![Value::Int(11)]);
}

#[test]
fn scenario_2_nested_arithmetic() {
    assert_eq!(eval_to_values("(+ (- 8 3) 6)"), vec![Value::Int(11)]);
}

#[test]
fn scenario_3_list_of_mixed_values() {
    assert_eq!(
        eval_to_values("[5 (+ 5 6) \"hello\"]"),
        vec![Value::list(vec![Value::Int(5), Value::Int(11), Value::string("hello")])]
    );
}

#[test]
fn scenario_4_assign_then_concat() {
    assert_eq!(
        eval_to_values("(LAST =(var 5) =(var2 (* var 11)) (CONCAT \"v=\" var2))"),
        vec![Value::string("v=55")]
    );
}

#[test]
fn scenario_5_if_true_and_false_branches() {
    assert_eq!(eval_to_values("IF((? true) \"yes\" \"no\")"), vec![Value::string("yes")]);
    assert_eq!(eval_to_values("IF((? false) \"yes\" \"no\")"), vec![Value::string("no")]);
}

#[test]
fn scenario_6_lambda_call_through_assign() {
    assert_eq!(
        eval_to_values("(LAST =(lm FN([name] (CONCAT \"hi \" name))) (lm \"x\"))"),
        vec![Value::string("hi x")]
    );
}

#[test]
fn scenario_7_expand_and_collapse() {
    assert_eq!(
        eval_to_values("[(EXPAND [1 2 3] 4)]"),
        vec![Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)])]
    );
    assert_eq!(
        eval_to_values("(COLLAPSE 1 2 3)"),
        vec![Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])]
    );
}

#[test]
fn scenario_8_fori_with_and_without_emit() {
    assert_eq!(
        eval_to_values("FORI({{ {from 0} {before 3} {idx i} {emit true} }} i)"),
        vec![Value::Int(0), Value::Int(1), Value::Int(2)]
    );
    assert_eq!(
        eval_to_values("FORI({{ {from 0} {before 3} {idx i} }} i)"),
        Vec::<Value>::new()
    );
}

#[test]
fn scope_lexicality_assign_inside_lambda_body_does_not_leak() {
    let ev = fresh();
    match eval_source(&ev, "(LAST =(lm FN([] =(local 1))) (lm))") {
        Outcome::Value(_) => {}
        Outcome::Error(e) => panic!("unexpected error: {e}"),
        Outcome::Async(_) => panic!("unexpected suspension"),
    }
    assert_eq!(ev.try_get_global("local"), None);
}

#[test]
fn async_proxy_completion_callback_fires_at_most_once() {
    use std::cell::RefCell;
    let proxy = AsyncProxy::new();
    let calls = Rc::new(RefCell::new(0));
    let calls_for_cb = calls.clone();
    proxy.on_completed(move |_| *calls_for_cb.borrow_mut() += 1);
    proxy.complete(EvalResult::emit(Value::Int(1)));
    proxy.complete(EvalResult::emit(Value::Int(2)));
    assert_eq!(*calls.borrow(), 1);
}

proptest! {
    #[test]
    fn arithmetic_promotion_stays_int_for_all_int_operands(xs in proptest::collection::vec(-1000i32..1000, 1..8)) {
        let source = format!("(+ {})", xs.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" "));
        let result = eval_to_values(&source);
        prop_assert_eq!(result.len(), 1);
        prop_assert!(matches!(result[0], Value::Int(_)));
    }

    #[test]
    fn truthiness_laws_hold(n in -1000i32..1000) {
        let strict = Value::Int(n).is_strictly_true();
        let truthy = Value::Int(n).is_truthy();
        prop_assert!(!strict || truthy);
        prop_assert_eq!(Value::Bool(true).is_truthy(), true);
        prop_assert_eq!(Value::Int(0).is_truthy(), false);
        prop_assert_eq!(Value::string("").is_truthy(), false);
    }

    #[test]
    fn deterministic_evaluation_for_identical_source(a in 0i32..500, b in 0i32..500) {
        let source = format!("(+ {a} {b})");
        let first = eval_to_values(&source);
        let second = eval_to_values(&source);
        prop_assert_eq!(first, second);
    }
}
