//! Special-operator `Prepare` hooks.
//!
//! Each hook takes a freshly built `Operator` node and returns the
//! `SpecialOperator` node that replaces it in the tree, moving children
//! between the public collection (evaluated by the driving loop) and the
//! hidden collection (latent, read directly by the operator's `run`
//! handler). See `spec.md` §4.3.

use losp_core::{LospError, Token};

use crate::ast::{ChildCollection, ChildPolicy, Node, NodeKind, NodeRef};

fn syntax_err(node: &NodeRef, source: &str, message: impl Into<String>) -> LospError {
    let pos = node.token.map(|t| t.start).unwrap_or(0);
    LospError::syntax(pos, source, message)
}

/// Runs the `Prepare` hook for `id` against `node` (an `Operator` node),
/// returning the `SpecialOperator` replacement. `id` must be one of
/// [`crate::special_ops::BUILTIN_SPECIAL_OPERATORS`]; host-registered
/// (`$`-prefixed) special operators have no built-in `Prepare` hook and are
/// passed through with empty hidden children — a host installs its own
/// restructuring by registering an operator whose `run` inspects the
/// node's public children directly.
pub fn prepare(id: &str, node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    match id {
        "IF" => prepare_if(node, source),
        "FOR" => prepare_for(node, source),
        "FORI" => prepare_fori(node, source),
        "++" | "--" => prepare_incdec(id, node, source),
        "=" => prepare_assign(node, source),
        "WAIT" => prepare_wait(node, source),
        _ => prepare_passthrough(id, node),
    }
}

fn children_of(node: &NodeRef) -> &[NodeRef] {
    node.children.as_ref().map(ChildCollection::nodes).unwrap_or(&[])
}

fn token_of(node: &NodeRef) -> Option<Token> {
    node.token
}

fn special(id: &str, public: ChildCollection, hidden: ChildCollection, token: Option<Token>) -> NodeRef {
    Node::new(
        NodeKind::SpecialOperator {
            id: id.to_string(),
            hidden,
        },
        token,
        Some(public),
    )
}

fn prepare_passthrough(id: &str, node: NodeRef) -> Result<NodeRef, LospError> {
    let token = token_of(&node);
    let mut public = ChildCollection::new(ChildPolicy::Any);
    for child in children_of(&node) {
        public.insert(child.clone())?;
    }
    Ok(special(id, public, ChildCollection::new(ChildPolicy::Any), token))
}

fn prepare_if(node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    if children.len() < 2 || children.len() > 3 {
        return Err(syntax_err(
            &node,
            source,
            "IF requires a condition, a then-branch, and an optional else-branch",
        ));
    }
    let token = token_of(&node);
    let mut public = ChildCollection::new(ChildPolicy::Any);
    public.insert(children[0].clone())?;
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    hidden.insert(children[1].clone())?;
    if let Some(else_branch) = children.get(2) {
        hidden.insert(else_branch.clone())?;
    }
    Ok(special("IF", public, hidden, token))
}

fn prepare_for(node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    let do_kv = node
        .children
        .as_ref()
        .and_then(|c| c.get_by_key("do"))
        .cloned()
        .ok_or_else(|| syntax_err(&node, source, "FOR requires a `do` key-value child"))?;
    let condition = children
        .iter()
        .find(|c| matches!(&c.kind, NodeKind::Operator { id } if id == "?"))
        .cloned()
        .ok_or_else(|| syntax_err(&node, source, "FOR requires a `(? ...)` condition child"))?;
    let token = token_of(&node);
    let public = ChildCollection::new(ChildPolicy::Any);
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    hidden.insert(condition)?;
    hidden.insert(do_kv)?;
    Ok(special("FOR", public, hidden, token))
}

fn prepare_fori(node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    if children.len() != 2 {
        return Err(syntax_err(
            &node,
            source,
            "FORI requires an object literal and a body expression",
        ));
    }
    let obj = &children[0];
    let body = children[1].clone();
    let obj_children = match &obj.kind {
        NodeKind::ObjectLiteral { .. } => obj
            .children
            .as_ref()
            .ok_or_else(|| syntax_err(&node, source, "FORI's first argument must be an object literal"))?,
        _ => {
            return Err(syntax_err(
                &node,
                source,
                "FORI's first argument must be an object literal providing from/before/idx",
            ))
        }
    };
    let get = |key: &str| obj_children.get_by_key(key).cloned();
    let from = get("from")
        .ok_or_else(|| syntax_err(&node, source, "FORI requires a `from` key"))?;
    let before = get("before")
        .ok_or_else(|| syntax_err(&node, source, "FORI requires a `before` key"))?;
    let idx_kv = get("idx").ok_or_else(|| syntax_err(&node, source, "FORI requires an `idx` key"))?;
    let idx_ident = idx_kv
        .children
        .as_ref()
        .and_then(|c| c.get(0))
        .cloned()
        .filter(|n| matches!(n.kind, NodeKind::Identifier { .. }))
        .ok_or_else(|| syntax_err(&node, source, "FORI's `idx` value must be an identifier"))?;
    let emit = get("emit");

    let token = token_of(&node);
    let mut public = ChildCollection::new(ChildPolicy::Any);
    public.insert(from)?;
    public.insert(before)?;
    if let Some(emit) = emit {
        public.insert(emit)?;
    }
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    hidden.insert(idx_ident)?;
    hidden.insert(body)?;
    Ok(special("FORI", public, hidden, token))
}

fn prepare_incdec(id: &str, node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    if children.len() != 1 {
        return Err(syntax_err(&node, source, format!("{id} requires exactly one child")));
    }
    let token = token_of(&node);
    let mut public = ChildCollection::new(ChildPolicy::Any);
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    match &children[0].kind {
        NodeKind::Identifier { .. } => hidden.insert(children[0].clone())?,
        _ => public.insert(children[0].clone())?,
    }
    Ok(special(id, public, hidden, token))
}

fn prepare_assign(node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    if children.len() != 2 {
        return Err(syntax_err(&node, source, "= requires exactly two children"));
    }
    if !matches!(children[0].kind, NodeKind::Identifier { .. }) {
        return Err(syntax_err(&node, source, "='s first child must be an identifier"));
    }
    let token = token_of(&node);
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    hidden.insert(children[0].clone())?;
    let mut public = ChildCollection::new(ChildPolicy::Any);
    public.insert(children[1].clone())?;
    Ok(special("=", public, hidden, token))
}

fn prepare_wait(node: NodeRef, source: &str) -> Result<NodeRef, LospError> {
    let children = children_of(&node);
    if children.len() != 2 {
        return Err(syntax_err(&node, source, "WAIT requires exactly two children"));
    }
    let token = token_of(&node);
    let mut public = ChildCollection::new(ChildPolicy::Any);
    public.insert(children[0].clone())?;
    let mut hidden = ChildCollection::new(ChildPolicy::Any);
    hidden.insert(children[1].clone())?;
    Ok(special("WAIT", public, hidden, token))
}

/// Links `earlier`'s `next` slot to `later`, the one sanctioned mutation of
/// an already-built node. Returns an error if `earlier` is not a `Filter`.
pub fn link_filter_chain(earlier: &NodeRef, later: NodeRef) -> Result<(), LospError> {
    match &earlier.kind {
        NodeKind::Filter { next, .. } => {
            *next.borrow_mut() = Some(later);
            Ok(())
        }
        _ => Err(LospError::Internal(
            "link_filter_chain called on a non-Filter node".into(),
        )),
    }
}
