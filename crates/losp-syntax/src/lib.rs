//! Tokenizing and AST construction for Losp.
//!
//! Layered on top of `losp-core`'s tokens and error type; produces the
//! `NodeRef` tree `losp-eval` walks. Carries no notion of runtime values.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod prepare;
pub mod special_ops;

pub use ast::{ChildCollection, ChildPolicy, Literal, Node, NodeKind, NodeRef};
pub use parser::parse;
