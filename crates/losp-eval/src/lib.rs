//! Losp's runtime: values, scopes, and the stack-based evaluator.
//!
//! Built on top of `losp-syntax`'s AST; knows nothing about tokenizing or
//! parsing source text.

pub mod builtins;
pub mod eval;
pub mod result;
pub mod scope;
pub mod scriptable;
pub mod value;

pub use eval::{Clock, EvalLimits, Evaluator, Outcome};
pub use result::{ChildResults, EvalResult};
pub use scope::Scope;
pub use scriptable::{LambdaBacked, ObjectLiteral, ReflectionBacked, Scriptable};
pub use value::{Lambda, Value};
