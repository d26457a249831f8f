//! Tokenizer for the surface language.
//!
//! Classifies source text into reserved symbols, identifiers, and typed
//! literal values, each carrying its line, column, and byte span. `//` line
//! comments are skipped.

use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use lazy_static::lazy_static;

use crate::parser::error::SyntaxError;

/// A source position: byte offset plus 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Reserved symbols: keywords and punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    KwBool,
    KwChar,
    KwInt,
    KwFloat,
    KwDouble,
    KwString,
    KwVoid,
    KwSecret,
    KwPublic,
    KwIf,
    KwElse,
    KwFor,
    KwWhile,
    KwReturn,
    KwRotate,
    KwTranspose,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Pipe,
    Caret,
    LogicalAnd,
    LogicalOr,
    Bang,
    Tilde,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Assign,
    Increment,
    Decrement,
    ShiftLeft,
    ShiftRight,
    Semicolon,
    Comma,
    OpenParen,
    CloseParen,
    OpenSquare,
    CloseSquare,
    OpenCurly,
    CloseCurly,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::KwBool => "bool",
            Symbol::KwChar => "char",
            Symbol::KwInt => "int",
            Symbol::KwFloat => "float",
            Symbol::KwDouble => "double",
            Symbol::KwString => "string",
            Symbol::KwVoid => "void",
            Symbol::KwSecret => "secret",
            Symbol::KwPublic => "public",
            Symbol::KwIf => "if",
            Symbol::KwElse => "else",
            Symbol::KwFor => "for",
            Symbol::KwWhile => "while",
            Symbol::KwReturn => "return",
            Symbol::KwRotate => "rotate",
            Symbol::KwTranspose => "transpose",
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::Percent => "%",
            Symbol::Ampersand => "&",
            Symbol::Pipe => "|",
            Symbol::Caret => "^",
            Symbol::LogicalAnd => "&&",
            Symbol::LogicalOr => "||",
            Symbol::Bang => "!",
            Symbol::Tilde => "~",
            Symbol::Equal => "==",
            Symbol::NotEqual => "!=",
            Symbol::Less => "<",
            Symbol::Greater => ">",
            Symbol::LessEqual => "<=",
            Symbol::GreaterEqual => ">=",
            Symbol::Assign => "=",
            Symbol::Increment => "++",
            Symbol::Decrement => "--",
            Symbol::ShiftLeft => "<<",
            Symbol::ShiftRight => ">>",
            Symbol::Semicolon => ";",
            Symbol::Comma => ",",
            Symbol::OpenParen => "(",
            Symbol::CloseParen => ")",
            Symbol::OpenSquare => "[",
            Symbol::CloseSquare => "]",
            Symbol::OpenCurly => "{",
            Symbol::CloseCurly => "}",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Symbol> = {
        let mut map = HashMap::new();
        for symbol in [
            Symbol::KwBool,
            Symbol::KwChar,
            Symbol::KwInt,
            Symbol::KwFloat,
            Symbol::KwDouble,
            Symbol::KwString,
            Symbol::KwVoid,
            Symbol::KwSecret,
            Symbol::KwPublic,
            Symbol::KwIf,
            Symbol::KwElse,
            Symbol::KwFor,
            Symbol::KwWhile,
            Symbol::KwReturn,
            Symbol::KwRotate,
            Symbol::KwTranspose,
        ] {
            map.insert(symbol.as_str(), symbol);
        }
        map
    };
}

/// Classification of one token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Reserved(Symbol),
    Ident(String),
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Reserved(symbol) => write!(f, "'{symbol}'"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Bool(v) => write!(f, "boolean literal {v}"),
            TokenKind::Int(v) => write!(f, "integer literal {v}"),
            TokenKind::Float(v) => write!(f, "float literal {v}"),
            TokenKind::Double(v) => write!(f, "double literal {v}"),
            TokenKind::Char(v) => write!(f, "character literal '{v}'"),
            TokenKind::Str(v) => write!(f, "string literal \"{v}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Tokenize a complete source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    chars: Peekable<CharIndices<'s>>,
    source_len: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            source_len: source.len(),
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.source_len)
    }

    fn start_span(&mut self) -> Span {
        Span {
            offset: self.offset(),
            len: 0,
            line: self.line,
            column: self.column,
        }
    }

    fn finish_span(&mut self, mut span: Span) -> Span {
        span.len = self.offset().saturating_sub(span.offset);
        span
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        let span = self.finish_span(span);
        self.tokens.push(Token { kind, span });
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
                continue;
            }
            let span = self.start_span();
            if c == '/' {
                self.bump();
                if self.peek() == Some('/') {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                } else {
                    self.push(TokenKind::Reserved(Symbol::Slash), span);
                }
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.word(span);
            } else if c.is_ascii_digit() {
                self.number(span)?;
            } else if c == '\'' {
                self.char_literal(span)?;
            } else if c == '"' {
                self.string_literal(span)?;
            } else {
                self.punctuation(span)?;
            }
        }
        Ok(self.tokens)
    }

    fn word(&mut self, span: Span) {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = match word.as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => match KEYWORDS.get(word.as_str()) {
                Some(&symbol) => TokenKind::Reserved(symbol),
                None => TokenKind::Ident(word),
            },
        };
        self.push(kind, span);
    }

    fn number(&mut self, span: Span) -> Result<(), SyntaxError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let mut is_fractional = false;
        if self.peek() == Some('.') {
            is_fractional = true;
            digits.push('.');
            self.bump();
            let mut any = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    digits.push(c);
                    self.bump();
                    any = true;
                } else {
                    break;
                }
            }
            if !any {
                return Err(SyntaxError::InvalidLiteral {
                    what: "number",
                    span: self.finish_span(span),
                });
            }
        }
        // a trailing `f` marks a single-precision literal
        let single_precision = if self.peek() == Some('f') {
            self.bump();
            true
        } else {
            false
        };
        let kind = if single_precision {
            let value = digits.parse::<f32>().map_err(|_| SyntaxError::InvalidLiteral {
                what: "float",
                span: self.finish_span(span),
            })?;
            TokenKind::Float(value)
        } else if is_fractional {
            let value = digits.parse::<f64>().map_err(|_| SyntaxError::InvalidLiteral {
                what: "double",
                span: self.finish_span(span),
            })?;
            TokenKind::Double(value)
        } else {
            let value = digits.parse::<i64>().map_err(|_| SyntaxError::InvalidLiteral {
                what: "integer",
                span: self.finish_span(span),
            })?;
            TokenKind::Int(value)
        };
        self.push(kind, span);
        Ok(())
    }

    fn escape(&mut self, span: Span, what: &'static str) -> Result<char, SyntaxError> {
        match self.bump().map(|(_, c)| c) {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            _ => Err(SyntaxError::InvalidLiteral {
                what,
                span: self.finish_span(span),
            }),
        }
    }

    fn char_literal(&mut self, span: Span) -> Result<(), SyntaxError> {
        self.bump(); // opening quote
        let value = match self.bump().map(|(_, c)| c) {
            Some('\\') => self.escape(span, "character")?,
            Some('\'') | None => {
                return Err(SyntaxError::UnterminatedLiteral {
                    what: "character",
                    span: self.finish_span(span),
                });
            }
            Some(c) => c,
        };
        if self.bump().map(|(_, c)| c) != Some('\'') {
            return Err(SyntaxError::UnterminatedLiteral {
                what: "character",
                span: self.finish_span(span),
            });
        }
        self.push(TokenKind::Char(value), span);
        Ok(())
    }

    fn string_literal(&mut self, span: Span) -> Result<(), SyntaxError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump().map(|(_, c)| c) {
                Some('"') => break,
                Some('\\') => value.push(self.escape(span, "string")?),
                Some(c) => value.push(c),
                None => {
                    return Err(SyntaxError::UnterminatedLiteral {
                        what: "string",
                        span: self.finish_span(span),
                    });
                }
            }
        }
        self.push(TokenKind::Str(value), span);
        Ok(())
    }

    /// Longest-match punctuation: two-character operators win over their
    /// one-character prefixes.
    fn punctuation(&mut self, span: Span) -> Result<(), SyntaxError> {
        let Some((_, c)) = self.bump() else {
            return Ok(());
        };
        let symbol = match c {
            '+' => self.two(Symbol::Plus, '+', Symbol::Increment),
            '-' => self.two(Symbol::Minus, '-', Symbol::Decrement),
            '*' => Symbol::Star,
            '%' => Symbol::Percent,
            '&' => self.two(Symbol::Ampersand, '&', Symbol::LogicalAnd),
            '|' => self.two(Symbol::Pipe, '|', Symbol::LogicalOr),
            '^' => Symbol::Caret,
            '!' => self.two(Symbol::Bang, '=', Symbol::NotEqual),
            '~' => Symbol::Tilde,
            '=' => self.two(Symbol::Assign, '=', Symbol::Equal),
            '<' => match self.peek() {
                Some('=') => {
                    self.bump();
                    Symbol::LessEqual
                }
                Some('<') => {
                    self.bump();
                    Symbol::ShiftLeft
                }
                _ => Symbol::Less,
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.bump();
                    Symbol::GreaterEqual
                }
                Some('>') => {
                    self.bump();
                    Symbol::ShiftRight
                }
                _ => Symbol::Greater,
            },
            ';' => Symbol::Semicolon,
            ',' => Symbol::Comma,
            '(' => Symbol::OpenParen,
            ')' => Symbol::CloseParen,
            '[' => Symbol::OpenSquare,
            ']' => Symbol::CloseSquare,
            '{' => Symbol::OpenCurly,
            '}' => Symbol::CloseCurly,
            _ => {
                return Err(SyntaxError::UnknownCharacter {
                    ch: c,
                    span: self.finish_span(span),
                });
            }
        };
        self.push(TokenKind::Reserved(symbol), span);
        Ok(())
    }

    fn two(&mut self, single: Symbol, next: char, double: Symbol) -> Symbol {
        if self.peek() == Some(next) {
            self.bump();
            double
        } else {
            single
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("secret int x"),
            vec![
                TokenKind::Reserved(Symbol::KwSecret),
                TokenKind::Reserved(Symbol::KwInt),
                TokenKind::Ident("x".to_string()),
            ]
        );
        assert_eq!(kinds("rotated"), vec![TokenKind::Ident("rotated".to_string())]);
    }

    #[test]
    fn test_number_kinds() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42)]);
        assert_eq!(kinds("1.5"), vec![TokenKind::Double(1.5)]);
        assert_eq!(kinds("1.5f"), vec![TokenKind::Float(1.5)]);
        assert_eq!(kinds("true false"), vec![TokenKind::Bool(true), TokenKind::Bool(false)]);
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== = <= << && ++"),
            vec![
                TokenKind::Reserved(Symbol::Equal),
                TokenKind::Reserved(Symbol::Assign),
                TokenKind::Reserved(Symbol::LessEqual),
                TokenKind::Reserved(Symbol::ShiftLeft),
                TokenKind::Reserved(Symbol::LogicalAnd),
                TokenKind::Reserved(Symbol::Increment),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // trailing comment\n2"),
            vec![TokenKind::Int(1), TokenKind::Int(2)]
        );
    }

    #[test]
    fn test_string_and_char_literals() {
        assert_eq!(
            kinds("\"hi\\n\" 'a'"),
            vec![TokenKind::Str("hi\n".to_string()), TokenKind::Char('a')]
        );
    }

    #[test]
    fn test_spans_track_lines_and_columns() {
        let tokens = tokenize("int x;\nx = 1;").unwrap();
        let x_assign = &tokens[3];
        assert_eq!(x_assign.kind, TokenKind::Ident("x".to_string()));
        assert_eq!(x_assign.span.line, 2);
        assert_eq!(x_assign.span.column, 1);
    }

    #[test]
    fn test_unknown_character() {
        assert!(matches!(
            tokenize("int @"),
            Err(SyntaxError::UnknownCharacter { ch: '@', .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("\"oops"),
            Err(SyntaxError::UnterminatedLiteral { what: "string", .. })
        ));
    }
}
