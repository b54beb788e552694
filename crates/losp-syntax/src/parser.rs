//! The AST builder: a small pushdown parser over the token stream.
//!
//! Each bracketed construct is parsed by its own recursive function rather
//! than a literal (prev, curr) transition table — the table's job (reject
//! a malformed token sequence with a pointer at the offending character) is
//! done here by `expect`/arity checks at each recursive call instead.
//!
//! The whole input is parsed as if wrapped in a synthetic outer `[...]`, so
//! a program may contain more than one top-level expression; if that outer
//! list ends up with exactly one child, that child alone is returned.

use std::cell::RefCell;
use std::rc::Rc;

use losp_core::{LospError, Token, TokenKind};

use crate::ast::{ChildCollection, ChildPolicy, Literal, Node, NodeKind, NodeRef};
use crate::lexer::tokenize;
use crate::prepare::{self, link_filter_chain};

pub fn parse(source: &str) -> Result<NodeRef, LospError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
    };
    let mut outer = ChildCollection::new(ChildPolicy::NoKeyValue);
    while parser.peek_kind().is_some() {
        let child = parser.parse_child(&outer)?;
        outer.insert(child)?;
    }
    if outer.len() == 1 {
        Ok(outer.nodes()[0].clone())
    } else {
        Ok(Node::new(NodeKind::List, None, Some(outer)))
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos];
        self.pos += 1;
        t
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, LospError> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) => Err(self.syntax_err(t.start, format!("expected {kind:?}, found {:?}", t.kind))),
            None => self.eof_err(),
        }
    }

    fn eof_err(&self) -> Result<Token, LospError> {
        let pos = self.source.len();
        Err(LospError::syntax(pos, self.source, "unbalanced brackets"))
    }

    fn syntax_err(&self, pos: usize, message: impl Into<String>) -> LospError {
        LospError::syntax(pos, self.source, message)
    }

    /// Parses children of the current frame into a collection until
    /// `terminator` is seen (and consumed).
    fn parse_children_until(
        &mut self,
        policy: ChildPolicy,
        terminator: TokenKind,
    ) -> Result<ChildCollection, LospError> {
        let mut coll = ChildCollection::new(policy);
        loop {
            match self.peek_kind() {
                Some(k) if k == terminator => {
                    self.advance();
                    break;
                }
                None => {
                    self.eof_err()?;
                    unreachable!()
                }
                _ => {
                    let child = self.parse_child(&coll)?;
                    coll.insert(child)?;
                }
            }
        }
        Ok(coll)
    }

    /// Parses one child, aware of `coll`'s last-inserted sibling so a
    /// leading `#(` can be recognised as a chained filter.
    fn parse_child(&mut self, coll: &ChildCollection) -> Result<NodeRef, LospError> {
        match self.peek_kind() {
            Some(TokenKind::LeftInitFilter) | Some(TokenKind::LeftChainFilter) => {
                self.parse_filter(coll.nodes().last())
            }
            _ => self.parse_node(),
        }
    }

    fn parse_node(&mut self) -> Result<NodeRef, LospError> {
        match self.peek_kind() {
            Some(TokenKind::LParen) => self.parse_operator(),
            Some(TokenKind::SpecialOperatorSymbol) => self.parse_special_operator(),
            Some(TokenKind::LeftInitFilter) | Some(TokenKind::LeftChainFilter) => {
                self.parse_filter(None)
            }
            Some(TokenKind::LBracket) => self.parse_list(),
            Some(TokenKind::DblLCurly) => self.parse_object_literal(),
            Some(TokenKind::LCurly) => self.parse_keyvalue(),
            Some(TokenKind::LeftInitFunc) => self.parse_function(),
            Some(TokenKind::Symbol) => {
                let t = self.advance();
                Ok(Node::identifier(t.text(self.source).to_string(), t))
            }
            Some(TokenKind::String) => {
                let t = self.advance();
                Ok(Node::literal(Literal::String(unescape_string(t.text(self.source))), t))
            }
            Some(TokenKind::Int) => {
                let t = self.advance();
                let n: i32 = t.text(self.source).parse().map_err(|_| {
                    self.syntax_err(t.start, "invalid int literal")
                })?;
                Ok(Node::literal(Literal::Int(n), t))
            }
            Some(TokenKind::Float) => {
                let t = self.advance();
                let f: f32 = t.text(self.source).parse().map_err(|_| {
                    self.syntax_err(t.start, "invalid float literal")
                })?;
                Ok(Node::literal(Literal::Float(f), t))
            }
            Some(TokenKind::Bool) => {
                let t = self.advance();
                Ok(Node::literal(Literal::Bool(t.text(self.source) == "true"), t))
            }
            Some(TokenKind::Null) => {
                let t = self.advance();
                Ok(Node::literal(Literal::Null, t))
            }
            Some(TokenKind::Tag) => {
                let t = self.peek().unwrap();
                Err(self.syntax_err(t.start, "a tag is only valid inside an object literal or key-value"))
            }
            Some(other) => {
                let t = self.peek().unwrap();
                Err(self.syntax_err(t.start, format!("unexpected token {other:?}")))
            }
            None => self.eof_err().map(|_| unreachable!()),
        }
    }

    fn parse_operator(&mut self) -> Result<NodeRef, LospError> {
        let open = self.advance(); // LParen
        let id_tok = self.expect(TokenKind::Symbol)?;
        let id = id_tok.text(self.source).to_string();
        let id_node = Node::identifier(id.clone(), id_tok);
        let children = self.parse_children_until(ChildPolicy::Any, TokenKind::RParen)?;
        Ok(Rc::new(Node {
            kind: NodeKind::Operator { id },
            id_node: Some(id_node),
            token: Some(open),
            children: Some(children),
        }))
    }

    fn parse_special_operator(&mut self) -> Result<NodeRef, LospError> {
        let sym_tok = self.advance(); // SpecialOperatorSymbol
        let id = sym_tok.text(self.source).to_string();
        self.expect(TokenKind::LParen)?;
        let children = self.parse_children_until(ChildPolicy::Any, TokenKind::RParen)?;
        let raw = Rc::new(Node {
            kind: NodeKind::Operator { id: id.clone() },
            id_node: Some(Node::identifier(id.clone(), sym_tok)),
            token: Some(sym_tok),
            children: Some(children),
        });
        prepare::prepare(&id, raw, self.source)
    }

    fn parse_filter(&mut self, prev_sibling: Option<&NodeRef>) -> Result<NodeRef, LospError> {
        let open_tok = self.advance(); // LeftInitFilter or LeftChainFilter
        let is_chain_token = open_tok.kind == TokenKind::LeftChainFilter;
        self.expect(TokenKind::LParen)?;
        let id_tok = self.expect(TokenKind::Symbol)?;
        let id = id_tok.text(self.source).to_string();
        let id_node = Node::identifier(id.clone(), id_tok);
        let children = self.parse_children_until(ChildPolicy::Any, TokenKind::RParen)?;

        let prev_is_filter = matches!(
            prev_sibling.map(|n| &n.kind),
            Some(NodeKind::Filter { .. })
        );
        if is_chain_token && !prev_is_filter {
            return Err(self.syntax_err(open_tok.start, "%( must immediately follow another filter"));
        }
        let chained = is_chain_token || prev_is_filter;

        let node: NodeRef = Rc::new(Node {
            kind: NodeKind::Filter {
                id,
                chained,
                next: RefCell::new(None),
            },
            id_node: Some(id_node),
            token: Some(open_tok),
            children: Some(children),
        });
        if chained {
            if let Some(prev) = prev_sibling {
                link_filter_chain(prev, node.clone())?;
            }
        }
        Ok(node)
    }

    fn parse_list(&mut self) -> Result<NodeRef, LospError> {
        let open = self.advance(); // LBracket
        let children = self.parse_children_until(ChildPolicy::NoKeyValue, TokenKind::RBracket)?;
        Ok(Node::new(NodeKind::List, Some(open), Some(children)))
    }

    fn parse_object_literal(&mut self) -> Result<NodeRef, LospError> {
        let open = self.advance(); // DblLCurly
        let tags = self.parse_leading_tags();
        let children = self.parse_children_until(ChildPolicy::KeyValueOnly, TokenKind::DblRCurly)?;
        Ok(Node::new(NodeKind::ObjectLiteral { tags }, Some(open), Some(children)))
    }

    fn parse_keyvalue(&mut self) -> Result<NodeRef, LospError> {
        let open = self.advance(); // LCurly
        let tags = self.parse_leading_tags();
        let key_tok = self.expect(TokenKind::Symbol)?;
        let id = key_tok.text(self.source).to_string();
        let children = self.parse_children_until(ChildPolicy::Any, TokenKind::RCurly)?;
        Ok(Node::new(NodeKind::KeyValue { id, tags }, Some(open), Some(children)))
    }

    fn parse_leading_tags(&mut self) -> Vec<String> {
        let mut tags = Vec::new();
        while let Some(TokenKind::Tag) = self.peek_kind() {
            let t = self.advance();
            tags.push(t.text(self.source).trim_start_matches('#').to_string());
        }
        tags
    }

    fn parse_function(&mut self) -> Result<NodeRef, LospError> {
        let open = self.advance(); // LeftInitFunc ("FN(")
        self.expect(TokenKind::LBracket)?;
        let mut params = ChildCollection::new(ChildPolicy::NoKeyValue);
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBracket) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Symbol) => {
                    let t = self.advance();
                    params.insert(Node::identifier(t.text(self.source).to_string(), t))?;
                }
                Some(other) => {
                    let t = self.peek().unwrap();
                    return Err(self.syntax_err(
                        t.start,
                        format!("function parameters must be bare symbols, found {other:?}"),
                    ));
                }
                None => {
                    self.eof_err()?;
                    unreachable!()
                }
            }
        }
        let params_node = Node::new(NodeKind::List, Some(open), Some(params));
        let body = self.parse_children_until(ChildPolicy::Any, TokenKind::RParen)?;
        Ok(Node::new(
            NodeKind::Function { params: params_node },
            Some(open),
            Some(body),
        ))
    }
}

fn unescape_string(raw: &str) -> String {
    // `raw` spans the opening and closing quote characters.
    let inner = &raw[1..raw.len() - 1];
    let quote = raw.as_bytes()[0] as char;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&quote) {
            out.push(quote);
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_id(node: &NodeRef) -> &str {
        node.operator_id().expect("operator node")
    }

    #[test]
    fn parses_single_top_level_call_as_root() {
        let ast = parse("(+ 5 6)").unwrap();
        assert_eq!(op_id(&ast), "+");
        assert_eq!(ast.eval_children().len(), 2);
    }

    #[test]
    fn multiple_top_level_forms_wrap_in_a_list() {
        let ast = parse("1 2 3").unwrap();
        assert!(matches!(ast.kind, NodeKind::List));
        assert_eq!(ast.eval_children().len(), 3);
    }

    #[test]
    fn if_prepare_splits_public_and_hidden() {
        let ast = parse("IF((? true) \"yes\" \"no\")").unwrap();
        match &ast.kind {
            NodeKind::SpecialOperator { id, hidden } => {
                assert_eq!(id, "IF");
                assert_eq!(ast.eval_children().len(), 1);
                assert_eq!(hidden.len(), 2);
            }
            _ => panic!("expected SpecialOperator"),
        }
    }

    #[test]
    fn assign_moves_identifier_to_hidden() {
        let ast = parse("=(x 5)").unwrap();
        match &ast.kind {
            NodeKind::SpecialOperator { id, hidden } => {
                assert_eq!(id, "=");
                assert_eq!(hidden.len(), 1);
                assert!(matches!(hidden.get(0).unwrap().kind, NodeKind::Identifier { .. }));
                assert_eq!(ast.eval_children().len(), 1);
            }
            _ => panic!("expected SpecialOperator"),
        }
    }

    #[test]
    fn object_literal_and_keyvalue() {
        let ast = parse("{{ {from 0} {before 3} }}").unwrap();
        match &ast.kind {
            NodeKind::ObjectLiteral { .. } => {
                let children = ast.children.as_ref().unwrap();
                assert!(children.get_by_key("from").is_some());
                assert!(children.get_by_key("before").is_some());
            }
            _ => panic!("expected ObjectLiteral"),
        }
    }

    #[test]
    fn keyvalue_with_tag_and_no_value_children() {
        let ast = parse("{#flag ready}").unwrap();
        match &ast.kind {
            NodeKind::KeyValue { id, tags } => {
                assert_eq!(id, "ready");
                assert_eq!(tags, &vec!["flag".to_string()]);
                assert!(ast.eval_children().is_empty());
            }
            _ => panic!("expected KeyValue"),
        }
    }

    #[test]
    fn chained_filter_links_via_preceding_sibling() {
        let ast = parse("[#(a) #(b)]").unwrap();
        let children = ast.children.as_ref().unwrap();
        let first = children.get(0).unwrap();
        let second = children.get(1).unwrap();
        match &first.kind {
            NodeKind::Filter { chained, next, .. } => {
                assert!(!chained);
                assert!(Rc::ptr_eq(next.borrow().as_ref().unwrap(), second));
            }
            _ => panic!("expected Filter"),
        }
        match &second.kind {
            NodeKind::Filter { chained, .. } => assert!(chained),
            _ => panic!("expected Filter"),
        }
    }

    #[test]
    fn explicit_chain_filter_without_predecessor_is_an_error() {
        assert!(parse("%(a)").is_err());
    }

    #[test]
    fn function_hides_params_from_body() {
        let ast = parse("FN([x y] x)").unwrap();
        match &ast.kind {
            NodeKind::Function { params } => {
                assert_eq!(params.eval_children().len(), 2);
            }
            _ => panic!("expected Function"),
        }
        assert_eq!(ast.function_body().len(), 1);
    }

    #[test]
    fn unbalanced_brackets_is_fatal() {
        assert!(parse("(+ 1 2").is_err());
        assert!(parse("[1 2").is_err());
    }

    #[test]
    fn string_unescaping() {
        let ast = parse(r#""a\"b""#).unwrap();
        match &ast.kind {
            NodeKind::Literal(Literal::String(s)) => assert_eq!(s, "a\"b"),
            _ => panic!("expected string literal"),
        }
    }
}
