//! Token types produced by the lexer.

use std::fmt;

/// Byte range in a source file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    #[allow(clippy::cast_possible_truncation, reason = "sources are far below 4 GiB")]
    pub fn new(range: std::ops::Range<usize>) -> Self {
        Span {
            start: range.start as u32,
            end: range.end as u32,
        }
    }
}

/// Kind of a significant token.
///
/// Comments and newlines never appear here: comments are collected on the
/// side and newlines turn into [`TokenKind::Semi`] where Go's automatic
/// semicolon rule applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Imag,
    Char,
    /// Interpreted string literal; `text` holds the quoted source form.
    String,
    /// Raw string literal; `text` holds the backquoted source form.
    RawString,

    // Keywords
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // Punctuation the parser inspects
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Dot,
    Colon,
    Ellipsis,
    Star,
    Amp,
    Arrow,
    Tilde,
    Pipe,
    Assign,
    Define,
    Inc,
    Dec,
    /// Any other operator; the exact spelling is in `text`.
    Op,

    Eof,
}

impl TokenKind {
    /// Whether a newline after this token inserts a semicolon.
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::RawString
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBrack
                | TokenKind::RBrace
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::RawString
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Int | TokenKind::Float | TokenKind::Imag => "number",
            TokenKind::Char => "rune literal",
            TokenKind::String | TokenKind::RawString => "string literal",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Chan => "chan",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Defer => "defer",
            TokenKind::Else => "else",
            TokenKind::Fallthrough => "fallthrough",
            TokenKind::For => "for",
            TokenKind::Func => "func",
            TokenKind::Go => "go",
            TokenKind::Goto => "goto",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::Interface => "interface",
            TokenKind::Map => "map",
            TokenKind::Package => "package",
            TokenKind::Range => "range",
            TokenKind::Return => "return",
            TokenKind::Select => "select",
            TokenKind::Struct => "struct",
            TokenKind::Switch => "switch",
            TokenKind::Type => "type",
            TokenKind::Var => "var",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrack => "[",
            TokenKind::RBrack => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Ellipsis => "...",
            TokenKind::Star => "*",
            TokenKind::Amp => "&",
            TokenKind::Arrow => "<-",
            TokenKind::Tilde => "~",
            TokenKind::Pipe => "|",
            TokenKind::Assign => "=",
            TokenKind::Define => ":=",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::Op => "operator",
            TokenKind::Eof => "end of file",
        };
        f.write_str(s)
    }
}

/// A significant token with its source text and 1-based line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Box<str>,
    pub span: Span,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, span: Span, line: u32) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
            line,
        }
    }

    /// Whether this token is the identifier `name`.
    #[inline]
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && &*self.text == name
    }
}

/// A comment with its line extent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Source text including the `//` or `/* */` delimiters.
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
    /// Whether nothing but whitespace precedes the comment on its line.
    pub own_line: bool,
}

impl Comment {
    /// Comment body lines with delimiters and one leading space removed.
    pub fn lines(&self) -> Vec<String> {
        if let Some(body) = self.text.strip_prefix("//") {
            return vec![strip_one_space(body).trim_end().to_string()];
        }
        let body = self
            .text
            .strip_prefix("/*")
            .and_then(|b| b.strip_suffix("*/"))
            .unwrap_or(&self.text);
        body.lines()
            .map(|l| {
                let l = l.trim_start();
                let l = l.strip_prefix('*').map_or(l, strip_one_space);
                l.trim_end().to_string()
            })
            .collect()
    }
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}
