//! Lexer for rearrangement patterns using logos
//!
//! Supports lexemes like:
//! - Axis names: h, w, batch_size
//! - Numbers: 1, 2, 16
//! - Ellipsis: ...
//! - Punctuation: (, )
//!
//! The `->` separator is split off before lexing, so it never reaches here.

use logos::Logos;

/// Lexemes of one pattern half
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Lexeme {
    // Digit runs glued to letters (`2a`) or with a leading zero (`01`) are lex errors
    #[regex(r"[0-9][A-Za-z0-9_]*", |lex| parse_number(lex.slice()))]
    Number(usize),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("...")]
    Ellipsis,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

fn parse_number(digits: &str) -> Option<usize> {
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lexeme::Number(n) => write!(f, "{}", n),
            Lexeme::Ident(s) => write!(f, "{}", s),
            Lexeme::Ellipsis => write!(f, "..."),
            Lexeme::LParen => write!(f, "("),
            Lexeme::RParen => write!(f, ")"),
        }
    }
}

/// Lexer wrapper that provides a stream of lexemes
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Lexeme>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Lexeme::lexer(source),
        }
    }

    /// Get current position in source
    pub fn span(&self) -> std::ops::Range<usize> {
        self.inner.span()
    }

    /// Text of the most recently produced lexeme
    pub fn slice(&self) -> &'source str {
        self.inner.slice()
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<Lexeme, ()>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
