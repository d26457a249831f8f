//! One-token-lookahead cursor over the token stream.

use crate::parser::error::SyntaxError;
use crate::parser::lexer::{Span, Symbol, Token, TokenKind};

/// Position-aware cursor with single-token peek and explicit advance.
#[derive(Debug)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
    end: Span,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens
            .last()
            .map(|t| Span {
                offset: t.span.offset + t.span.len,
                len: 0,
                line: t.span.line,
                column: t.span.column + t.span.len as u32,
            })
            .unwrap_or_default();
        Self { tokens, pos: 0, end }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// The current token's span, or the end-of-input position.
    pub fn span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(self.end)
    }

    pub fn peek_symbol(&self) -> Option<Symbol> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Reserved(symbol),
                ..
            }) => Some(*symbol),
            _ => None,
        }
    }

    pub fn at_symbol(&self, symbol: Symbol) -> bool {
        self.peek_symbol() == Some(symbol)
    }

    /// Consume the current token if it is `symbol`.
    pub fn eat_symbol(&mut self, symbol: Symbol) -> bool {
        if self.at_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume `symbol` or fail with a descriptive error.
    pub fn expect_symbol(&mut self, symbol: Symbol) -> Result<(), SyntaxError> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{symbol}'")))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.expected("an identifier")),
        }
    }

    /// An `ExpectedToken` (or end-of-input) error at the current position.
    pub fn expected(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::ExpectedToken {
                expected: expected.to_string(),
                found: token.kind.to_string(),
                span: token.span,
            },
            None => SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                span: self.end,
            },
        }
    }

    /// An `UnexpectedToken` error at the current position.
    pub fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::UnexpectedToken {
                found: token.kind.to_string(),
                span: token.span,
            },
            None => SyntaxError::UnexpectedEof {
                expected: "a token".to_string(),
                span: self.end,
            },
        }
    }
}
