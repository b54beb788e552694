//! The static set of special-operator names.
//!
//! A bare symbol immediately followed by `(` is tokenized as a
//! `SpecialOperatorSymbol` (see [`crate::lexer`]) exactly when it names one
//! of these built-ins, or starts with `$` and is at least two characters
//! long (a host-registered special operator). This list is owned here
//! rather than by the evaluator crate because the lexer and the AST
//! builder's `Prepare` dispatch both need it and neither may depend on
//! `losp-eval` (layering runs the other way).

/// Built-in special operator names with a `Prepare` hook in
/// [`crate::prepare`].
pub const BUILTIN_SPECIAL_OPERATORS: &[&str] = &["IF", "FOR", "FORI", "++", "--", "=", "WAIT"];

pub fn is_builtin_special_operator(name: &str) -> bool {
    BUILTIN_SPECIAL_OPERATORS.contains(&name)
}

/// Whether `name` should be lexed as a `SpecialOperatorSymbol` when
/// immediately followed by `(`. Host-registered special operators must
/// start with `$` and be longer than one character (enforced again at
/// registration time in `losp-eval`).
pub fn is_special_operator_name(name: &str) -> bool {
    is_builtin_special_operator(name) || (name.len() > 1 && name.starts_with('$'))
}
