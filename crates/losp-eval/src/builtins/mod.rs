//! The built-in operator tables the evaluator is seeded with.

mod arithmetic;
mod collections;
mod comparison;
mod containers;
mod control;
mod merge;
mod misc;
mod property;
mod strings;
mod truthiness;

use std::collections::HashMap;

use crate::eval::OperatorFn;

/// Every standard (plain `Operator`-callable) built-in, keyed by name.
pub fn standard_operators() -> HashMap<String, OperatorFn> {
    let mut ops: HashMap<String, OperatorFn> = HashMap::new();

    ops.insert("+".into(), arithmetic::add());
    ops.insert("-".into(), arithmetic::sub());
    ops.insert("*".into(), arithmetic::mul());
    ops.insert("/".into(), arithmetic::div());
    ops.insert("%".into(), arithmetic::rem());
    ops.insert("^".into(), arithmetic::pow());

    ops.insert("==".into(), comparison::eq());
    ops.insert("!=".into(), comparison::ne());
    ops.insert("<".into(), comparison::lt());
    ops.insert("<=".into(), comparison::le());
    ops.insert(">".into(), comparison::gt());
    ops.insert(">=".into(), comparison::ge());

    ops.insert("1".into(), truthiness::strict());
    ops.insert("~1".into(), truthiness::truthy());
    ops.insert("0".into(), truthiness::not_strict());
    ops.insert("~0".into(), truthiness::not_truthy());
    ops.insert("!".into(), truthiness::not_strict());
    ops.insert("~!".into(), truthiness::not_truthy());

    ops.insert("ANY".into(), collections::any());
    ops.insert("ALL".into(), collections::all());
    ops.insert("IN".into(), collections::contains_value());
    ops.insert("COUNT".into(), collections::count());

    ops.insert(".".into(), property::property());
    ops.insert("MERGE".into(), merge::merge_op());

    ops.insert("CONCAT".into(), strings::concat());
    ops.insert("LINE".into(), strings::line());
    ops.insert("STR-INT".into(), strings::str_int());
    ops.insert("TO-STR".into(), strings::to_str());
    ops.insert("STARTS".into(), strings::starts());
    ops.insert("ENDS".into(), strings::ends());
    ops.insert("CONTAINS".into(), strings::contains_str());

    ops.insert("RUN".into(), containers::run());
    ops.insert("DO".into(), containers::run());
    ops.insert("MUTE".into(), containers::mute());
    ops.insert("LAST".into(), containers::last());
    ops.insert("EXPAND".into(), containers::expand());
    ops.insert("COLLAPSE".into(), containers::collapse());
    ops.insert("?".into(), containers::run());

    ops.insert("PI".into(), misc::pi());
    ops.insert("LOSP:TEST:DBLPUSH".into(), misc::dblpush());

    ops
}

/// Every built-in special operator's `run` handler, keyed by name — see
/// `losp_syntax::special_ops::BUILTIN_SPECIAL_OPERATORS`.
pub fn special_operators() -> HashMap<String, OperatorFn> {
    let mut ops: HashMap<String, OperatorFn> = HashMap::new();
    ops.insert("IF".into(), control::if_op());
    ops.insert("FOR".into(), control::for_op());
    ops.insert("FORI".into(), control::fori_op());
    ops.insert("++".into(), control::inc());
    ops.insert("--".into(), control::dec());
    ops.insert("=".into(), control::assign());
    ops.insert("WAIT".into(), control::wait());
    ops
}
