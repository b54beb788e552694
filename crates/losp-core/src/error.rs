//! The error taxonomy shared by the lexer, parser, and evaluator.
//!
//! One variant per category named in the language's error-handling design:
//! syntax errors at parse time, and name/arity/type/special-op/async/internal
//! errors at evaluation time. Each carries the data needed to reproduce the
//! message without re-deriving it from context.

use thiserror::Error;

/// Any error Losp can report to its host, short of a language-level
/// [`crate::token::Token`] (the offending token, when relevant, is
/// captured positionally — `LospError` itself never borrows the source).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LospError {
    /// Malformed source encountered during tokenizing, parsing, or a
    /// special operator's `Prepare` hook.
    #[error("syntax error at byte {pos}: {message} (near: {excerpt:?})")]
    Syntax {
        pos: usize,
        message: String,
        excerpt: String,
    },

    /// An identifier could not be resolved in the current scope chain.
    #[error("no variable named {name} was found")]
    Name { name: String },

    /// An operator was called with the wrong number of arguments.
    #[error("{operator}: {message}")]
    Arity { operator: String, message: String },

    /// An argument had the wrong runtime type.
    #[error("{operator}: argument {index} expected {expected}, got {got}")]
    Type {
        operator: String,
        index: usize,
        expected: String,
        got: String,
    },

    /// A `SpecialOperator`-only handler was invoked on a plain node, or a
    /// special operator's `Prepare` hook rejected its input.
    #[error("special operator misuse: {message}")]
    SpecialOpMisuse { message: String },

    /// An `Async` result's proxy was completed with another `Async`.
    #[error("async processes cannot emit another async result")]
    AsyncContractViolation,

    /// A node or result kind turned up where the evaluator's own invariants
    /// say it cannot; reaching this is a bug in the evaluator itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LospError {
    pub fn syntax(pos: usize, source: &str, message: impl Into<String>) -> Self {
        const EXCERPT_RADIUS: usize = 16;
        let start = pos.saturating_sub(EXCERPT_RADIUS);
        let end = (pos + EXCERPT_RADIUS).min(source.len());
        // `pos`/radius are byte offsets from the tokenizer, which only ever
        // splits on ASCII delimiters, so start/end land on char boundaries
        // for any source the tokenizer itself produced spans over.
        let excerpt = source.get(start..end).unwrap_or("").to_string();
        LospError::Syntax {
            pos,
            message: message.into(),
            excerpt,
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        LospError::Name { name: name.into() }
    }

    pub fn arity(operator: impl Into<String>, message: impl Into<String>) -> Self {
        LospError::Arity {
            operator: operator.into(),
            message: message.into(),
        }
    }

    pub fn wrong_type(
        operator: impl Into<String>,
        index: usize,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        LospError::Type {
            operator: operator.into(),
            index,
            expected: expected.into(),
            got: got.into(),
        }
    }
}
