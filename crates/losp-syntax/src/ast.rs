//! AST node types and the child collection they are built from.
//!
//! Nodes are immutable once built (per the language's lifecycle rules) with
//! one deliberate exception: a chained [`Filter`](NodeKind::Filter)'s
//! `next` link is back-patched once the following filter in the chain is
//! parsed, which is why it is the one `RefCell` in the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use losp_core::{LospError, Token};

/// Reference-counted handle to a node. Cheap to clone; shared, never mutated
/// through (besides the `Filter::next` back-patch).
pub type NodeRef = Rc<Node>;

/// A pre-parsed literal value, as produced by the tokenizer's value
/// classification step. Converted into a runtime `Value` by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

/// Which children a node admits, enforced on [`ChildCollection::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Any child kind, including `KeyValue`.
    Any,
    /// Any child kind except `KeyValue` (`Operator`, `List`).
    NoKeyValue,
    /// Only `KeyValue` children, plus tags tracked separately
    /// (`ObjectLiteral`).
    KeyValueOnly,
}

/// An ordered sequence of child nodes, with a key index over any
/// `KeyValue` children for O(1) lookup by name.
#[derive(Debug)]
pub struct ChildCollection {
    policy: ChildPolicy,
    nodes: Vec<NodeRef>,
    key_index: HashMap<String, usize>,
}

impl ChildCollection {
    pub fn new(policy: ChildPolicy) -> Self {
        Self {
            policy,
            nodes: Vec::new(),
            key_index: HashMap::new(),
        }
    }

    pub fn policy(&self) -> ChildPolicy {
        self.policy
    }

    /// Appends `node`, enforcing the collection's admissibility policy.
    /// A `KeyValue` child's key replaces any earlier index for the same
    /// name — the old node stays in the ordered list, but only the newest
    /// index resolves through [`ChildCollection::get_by_key`].
    pub fn insert(&mut self, node: NodeRef) -> Result<(), LospError> {
        let is_kv = matches!(node.kind, NodeKind::KeyValue { .. });
        match self.policy {
            ChildPolicy::NoKeyValue if is_kv => {
                return Err(LospError::SpecialOpMisuse {
                    message: "KeyValue children are not allowed here".into(),
                });
            }
            ChildPolicy::KeyValueOnly if !is_kv => {
                return Err(LospError::SpecialOpMisuse {
                    message: "only KeyValue children are allowed here".into(),
                });
            }
            _ => {}
        }
        let index = self.nodes.len();
        if let NodeKind::KeyValue { id, .. } = &node.kind {
            self.key_index.insert(id.clone(), index);
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeRef> {
        self.nodes.get(index)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&NodeRef> {
        self.key_index.get(key).and_then(|&i| self.nodes.get(i))
    }
}

/// The sum of node kinds in the Losp AST. See `spec.md` §3 for the full
/// contract each variant upholds.
#[derive(Debug)]
pub enum NodeKind {
    /// `(op ...)` — a regular operator call.
    Operator { id: String },
    /// `Op(...)` — an operator whose `Prepare` hook has restructured its
    /// subtree into public (evaluated) and hidden (latent) children.
    SpecialOperator { id: String, hidden: ChildCollection },
    /// `#(...)` / `%(...)` — a filter, optionally chained to a following
    /// filter via `next`.
    Filter {
        id: String,
        chained: bool,
        next: RefCell<Option<NodeRef>>,
    },
    /// A bare name.
    Identifier { name: String },
    /// A literal value.
    Literal(Literal),
    /// `{key expr ...}` — a named value, usable as an operator argument or
    /// inside an object literal.
    KeyValue { id: String, tags: Vec<String> },
    /// `{{ ... }}` — a set of `KeyValue` children plus tags.
    ObjectLiteral { tags: Vec<String> },
    /// `[...]` — an ordered sequence.
    List,
    /// `FN([params] body...)`.
    Function { params: NodeRef },
}

/// An AST node: a [`NodeKind`] plus the attributes common to every kind —
/// an optional identifier sub-node, the source token it was built from, and
/// an optional child collection.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub id_node: Option<NodeRef>,
    pub token: Option<Token>,
    pub children: Option<ChildCollection>,
}

impl Node {
    pub fn new(kind: NodeKind, token: Option<Token>, children: Option<ChildCollection>) -> NodeRef {
        Rc::new(Node {
            kind,
            id_node: None,
            token,
            children,
        })
    }

    pub fn identifier(name: impl Into<String>, token: Token) -> NodeRef {
        Rc::new(Node {
            kind: NodeKind::Identifier { name: name.into() },
            id_node: None,
            token: Some(token),
            children: None,
        })
    }

    pub fn literal(value: Literal, token: Token) -> NodeRef {
        Rc::new(Node {
            kind: NodeKind::Literal(value),
            id_node: None,
            token: Some(token),
            children: None,
        })
    }

    /// The children the evaluator should enumerate and evaluate in order.
    /// A `Function` node's body is latent — it reports no children here,
    /// matching the spec's function-body enumeration rule — the body is
    /// driven only by a synthetic lambda-call frame when the lambda is
    /// actually invoked.
    pub fn eval_children(&self) -> &[NodeRef] {
        if matches!(self.kind, NodeKind::Function { .. }) {
            return &[];
        }
        self.children.as_ref().map(ChildCollection::nodes).unwrap_or(&[])
    }

    /// The body children of a `Function` node (its params list is stored
    /// separately in `NodeKind::Function::params`).
    pub fn function_body(&self) -> &[NodeRef] {
        self.children.as_ref().map(ChildCollection::nodes).unwrap_or(&[])
    }

    pub fn hidden_children(&self) -> &[NodeRef] {
        match &self.kind {
            NodeKind::SpecialOperator { hidden, .. } => hidden.nodes(),
            _ => &[],
        }
    }

    pub fn operator_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Operator { id } => Some(id),
            NodeKind::SpecialOperator { id, .. } => Some(id),
            NodeKind::Filter { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use losp_core::TokenKind;

    fn dummy_token() -> Token {
        Token::new(TokenKind::Symbol, 0, 0)
    }

    #[test]
    fn duplicate_key_replaces_index_but_keeps_both_nodes() {
        let mut coll = ChildCollection::new(ChildPolicy::KeyValueOnly);
        let kv1 = Node::new(
            NodeKind::KeyValue {
                id: "x".into(),
                tags: vec![],
            },
            Some(dummy_token()),
            Some(ChildCollection::new(ChildPolicy::Any)),
        );
        let kv2 = Node::new(
            NodeKind::KeyValue {
                id: "x".into(),
                tags: vec![],
            },
            Some(dummy_token()),
            Some(ChildCollection::new(ChildPolicy::Any)),
        );
        coll.insert(kv1).unwrap();
        coll.insert(kv2.clone()).unwrap();
        assert_eq!(coll.len(), 2);
        assert!(Rc::ptr_eq(coll.get_by_key("x").unwrap(), &kv2));
    }

    #[test]
    fn no_keyvalue_policy_rejects_keyvalue() {
        let mut coll = ChildCollection::new(ChildPolicy::NoKeyValue);
        let kv = Node::new(
            NodeKind::KeyValue {
                id: "x".into(),
                tags: vec![],
            },
            Some(dummy_token()),
            Some(ChildCollection::new(ChildPolicy::Any)),
        );
        assert!(coll.insert(kv).is_err());
    }

    #[test]
    fn function_hides_body_from_eval_children() {
        let params = Node::new(NodeKind::List, Some(dummy_token()), Some(ChildCollection::new(ChildPolicy::NoKeyValue)));
        let mut body = ChildCollection::new(ChildPolicy::Any);
        body.insert(Node::literal(Literal::Int(1), dummy_token())).unwrap();
        let func = Node::new(NodeKind::Function { params }, Some(dummy_token()), Some(body));
        assert!(func.eval_children().is_empty());
        assert_eq!(func.function_body().len(), 1);
    }
}
