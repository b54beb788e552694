//! The tokenizer: character stream to token vector.
//!
//! Modeled after the grounding teacher's indentation-aware lexer
//! (`lumen-compiler/src/compiler/lexer.rs`) minus the indentation tracking
//! Losp has no use for — a hand-rolled scanner over `Vec<char>` with a
//! `thiserror` error enum, one variant per malformed-input shape.

use losp_core::{LospError, Token, TokenKind};

use crate::special_ops::is_special_operator_name;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    /// Byte offset of each char in `chars`, plus one trailing entry for the
    /// end-of-source offset — lets us recover byte spans cheaply.
    byte_offsets: Vec<usize>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut byte_offsets = Vec::new();
        let mut offset = 0;
        let chars: Vec<char> = source
            .chars()
            .map(|c| {
                byte_offsets.push(offset);
                offset += c.len_utf8();
                c
            })
            .collect();
        byte_offsets.push(offset);
        Self {
            source,
            chars,
            byte_offsets,
            pos: 0,
        }
    }

    fn byte_at(&self, char_pos: usize) -> usize {
        self.byte_offsets[char_pos]
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        let want: Vec<char> = s.chars().collect();
        if self.pos + want.len() > self.chars.len() {
            return false;
        }
        self.chars[self.pos..self.pos + want.len()] == want[..]
    }

    fn is_delimiter(c: char) -> bool {
        c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}')
    }

    /// The extent of a bare value/symbol starting at `pos`, without
    /// consuming it: runs until whitespace, a bracket, or the start of a
    /// `//` comment.
    fn scan_value_extent(&self, start: usize) -> usize {
        let mut i = start;
        while let Some(c) = self.chars.get(i).copied() {
            if Self::is_delimiter(c) {
                break;
            }
            if c == '/' && self.chars.get(i + 1).copied() == Some('/') {
                break;
            }
            i += 1;
        }
        i
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn syntax_err(&self, at: usize, message: impl Into<String>) -> LospError {
        LospError::syntax(self.byte_at(at), self.source, message)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LospError> {
        let mut tokens = Vec::new();
        loop {
            // Skip whitespace and `//` comments.
            loop {
                match self.current() {
                    Some(c) if c.is_whitespace() => {
                        self.pos += 1;
                    }
                    Some('/') if self.peek_at(1) == Some('/') => {
                        while let Some(c) = self.current() {
                            if c == '\n' {
                                break;
                            }
                            self.pos += 1;
                        }
                    }
                    _ => break,
                }
            }
            let Some(c) = self.current() else { break };
            let start = self.pos;

            macro_rules! single {
                ($kind:expr) => {{
                    self.pos += 1;
                    tokens.push(Token::new($kind, self.byte_at(start), self.byte_at(self.pos)));
                    continue;
                }};
            }

            match c {
                '(' => single!(TokenKind::LParen),
                ')' => single!(TokenKind::RParen),
                '[' => single!(TokenKind::LBracket),
                ']' => single!(TokenKind::RBracket),
                '{' if self.peek_at(1) == Some('{') => {
                    self.pos += 2;
                    tokens.push(Token::new(
                        TokenKind::DblLCurly,
                        self.byte_at(start),
                        self.byte_at(self.pos),
                    ));
                    continue;
                }
                '}' if self.peek_at(1) == Some('}') => {
                    self.pos += 2;
                    tokens.push(Token::new(
                        TokenKind::DblRCurly,
                        self.byte_at(start),
                        self.byte_at(self.pos),
                    ));
                    continue;
                }
                '{' => single!(TokenKind::LCurly),
                '}' => single!(TokenKind::RCurly),
                '%' if self.peek_at(1) == Some('(') => {
                    self.pos += 1;
                    tokens.push(Token::new(
                        TokenKind::LeftChainFilter,
                        self.byte_at(start),
                        self.byte_at(self.pos),
                    ));
                    continue;
                }
                '"' | '`' => {
                    let quote = c;
                    self.pos += 1;
                    loop {
                        match self.current() {
                            None => {
                                return Err(self.syntax_err(start, "unterminated string"));
                            }
                            Some(ch) if ch == quote => {
                                // An escaping backslash must be the char
                                // immediately preceding the quote.
                                let escaped = self.pos > start + 1
                                    && self.chars[self.pos - 1] == '\\';
                                self.pos += 1;
                                if escaped {
                                    continue;
                                }
                                break;
                            }
                            Some(_) => {
                                self.pos += 1;
                            }
                        }
                    }
                    tokens.push(Token::new(
                        TokenKind::String,
                        self.byte_at(start),
                        self.byte_at(self.pos),
                    ));
                    continue;
                }
                _ if self.starts_with("FN(") => {
                    self.pos += 3;
                    tokens.push(Token::new(
                        TokenKind::LeftInitFunc,
                        self.byte_at(start),
                        self.byte_at(self.pos),
                    ));
                    continue;
                }
                _ => {
                    let end = self.scan_value_extent(start);
                    let text = self.text_between(start, end);
                    let followed_by_paren = self.chars.get(end).copied() == Some('(');
                    if followed_by_paren && text == "#" {
                        self.pos = end;
                        tokens.push(Token::new(
                            TokenKind::LeftInitFilter,
                            self.byte_at(start),
                            self.byte_at(self.pos),
                        ));
                        continue;
                    }
                    if followed_by_paren && is_special_operator_name(&text) {
                        self.pos = end;
                        tokens.push(Token::new(
                            TokenKind::SpecialOperatorSymbol,
                            self.byte_at(start),
                            self.byte_at(self.pos),
                        ));
                        continue;
                    }
                    if end == start {
                        return Err(self.syntax_err(start, format!("unexpected character '{c}'")));
                    }
                    self.pos = end;
                    let kind = classify_value(&text);
                    tokens.push(Token::new(kind, self.byte_at(start), self.byte_at(self.pos)));
                    continue;
                }
            }
        }
        Ok(tokens)
    }
}

fn classify_value(text: &str) -> TokenKind {
    if text == "null" {
        TokenKind::Null
    } else if let Some(rest) = text.strip_prefix('#') {
        let _ = rest;
        TokenKind::Tag
    } else if text == "true" || text == "false" {
        TokenKind::Bool
    } else if text.parse::<i32>().is_ok() {
        TokenKind::Int
    } else if text.parse::<f32>().is_ok() {
        TokenKind::Float
    } else {
        TokenKind::Symbol
    }
}

/// Convenience wrapper: tokenizes `source` in one call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LospError> {
    Lexer::new(source).tokenize()
}
