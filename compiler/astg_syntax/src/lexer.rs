//! Lexer for Go sources using logos.
//!
//! Produces significant tokens with Go's automatic semicolons already
//! inserted, plus the comments of the file on the side.

use logos::Logos;

use crate::error::{Result, SyntaxError};
use crate::token::{Comment, Span, Token, TokenKind};

/// Raw token from logos (before semicolon insertion).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]
enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[token("\n")]
    Newline,

    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    #[regex(r"[_\p{L}][_\p{L}\p{N}]*")]
    Ident,

    #[regex(r"[0-9][0-9a-zA-Z_]*")]
    Int,

    #[regex(r"[0-9][0-9a-zA-Z_]*\.[0-9a-zA-Z_]*|\.[0-9][0-9a-zA-Z_]*")]
    Float,

    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Char,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    #[regex(r"`[^`]*`")]
    RawString,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("...")]
    Ellipsis,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,
    #[token("<-")]
    Arrow,
    #[token("~")]
    Tilde,
    #[token("|")]
    Pipe,
    #[token("=")]
    Assign,
    #[token(":=")]
    Define,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,

    #[token("+")]
    #[token("-")]
    #[token("/")]
    #[token("%")]
    #[token("^")]
    #[token("<<")]
    #[token(">>")]
    #[token("&^")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&^=")]
    #[token("&&")]
    #[token("||")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token(">")]
    #[token("<=")]
    #[token(">=")]
    #[token("!")]
    Op,
}

/// Consume a block comment body through its closing `*/`.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl RawToken {
    fn kind(self, text: &str) -> Option<TokenKind> {
        let kind = match self {
            RawToken::LineComment | RawToken::BlockComment | RawToken::Newline => return None,
            RawToken::Break => TokenKind::Break,
            RawToken::Case => TokenKind::Case,
            RawToken::Chan => TokenKind::Chan,
            RawToken::Const => TokenKind::Const,
            RawToken::Continue => TokenKind::Continue,
            RawToken::Default => TokenKind::Default,
            RawToken::Defer => TokenKind::Defer,
            RawToken::Else => TokenKind::Else,
            RawToken::Fallthrough => TokenKind::Fallthrough,
            RawToken::For => TokenKind::For,
            RawToken::Func => TokenKind::Func,
            RawToken::Go => TokenKind::Go,
            RawToken::Goto => TokenKind::Goto,
            RawToken::If => TokenKind::If,
            RawToken::Import => TokenKind::Import,
            RawToken::Interface => TokenKind::Interface,
            RawToken::Map => TokenKind::Map,
            RawToken::Package => TokenKind::Package,
            RawToken::Range => TokenKind::Range,
            RawToken::Return => TokenKind::Return,
            RawToken::Select => TokenKind::Select,
            RawToken::Struct => TokenKind::Struct,
            RawToken::Switch => TokenKind::Switch,
            RawToken::Type => TokenKind::Type,
            RawToken::Var => TokenKind::Var,
            RawToken::Ident => TokenKind::Ident,
            RawToken::Int if text.ends_with('i') => TokenKind::Imag,
            RawToken::Int => TokenKind::Int,
            RawToken::Float if text.ends_with('i') => TokenKind::Imag,
            RawToken::Float => TokenKind::Float,
            RawToken::Char => TokenKind::Char,
            RawToken::String => TokenKind::String,
            RawToken::RawString => TokenKind::RawString,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrack => TokenKind::LBrack,
            RawToken::RBrack => TokenKind::RBrack,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semi => TokenKind::Semi,
            RawToken::Dot => TokenKind::Dot,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Ellipsis => TokenKind::Ellipsis,
            RawToken::Star => TokenKind::Star,
            RawToken::Amp => TokenKind::Amp,
            RawToken::Arrow => TokenKind::Arrow,
            RawToken::Tilde => TokenKind::Tilde,
            RawToken::Pipe => TokenKind::Pipe,
            RawToken::Assign => TokenKind::Assign,
            RawToken::Define => TokenKind::Define,
            RawToken::Inc => TokenKind::Inc,
            RawToken::Dec => TokenKind::Dec,
            RawToken::Op => TokenKind::Op,
        };
        Some(kind)
    }
}

/// Lexed file: tokens ending in [`TokenKind::Eof`] and all comments.
#[derive(Clone, Debug, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    #[allow(clippy::cast_possible_truncation, reason = "line counts fit in u32")]
    fn line(&self, offset: usize) -> u32 {
        self.starts.partition_point(|&s| s <= offset) as u32
    }
}

/// Lex a Go source file.
pub fn lex(source: &str) -> Result<LexOutput> {
    let index = LineIndex::new(source);
    let mut out = LexOutput::default();
    let mut last: Option<TokenKind> = None;
    let mut last_line = 0u32;

    let mut lexer = RawToken::lexer(source);
    while let Some(raw) = lexer.next() {
        let range = lexer.span();
        let text = lexer.slice();
        let line = index.line(range.start);

        let Ok(raw) = raw else {
            if text.starts_with("/*") {
                return Err(SyntaxError::UnterminatedComment { line });
            }
            return Err(SyntaxError::UnexpectedChar {
                line,
                text: text.to_string(),
            });
        };

        match raw {
            RawToken::Newline => {
                insert_semi(&mut out.tokens, &mut last, range.start, line);
            }
            RawToken::LineComment | RawToken::BlockComment => {
                let end_line = index.line(range.end.saturating_sub(1));
                out.comments.push(Comment {
                    text: text.to_string(),
                    start_line: line,
                    end_line,
                    own_line: last.is_none() || last_line != line,
                });
                if end_line > line {
                    insert_semi(&mut out.tokens, &mut last, range.start, line);
                }
            }
            _ => {
                if let Some(kind) = raw.kind(text) {
                    out.tokens.push(Token::new(kind, text, Span::new(range), line));
                    last = Some(kind);
                    last_line = line;
                }
            }
        }
    }

    let end = source.len();
    let end_line = index.line(end);
    insert_semi(&mut out.tokens, &mut last, end, end_line);
    out.tokens.push(Token::new(
        TokenKind::Eof,
        "",
        Span::new(end..end),
        end_line,
    ));
    Ok(out)
}

fn insert_semi(tokens: &mut Vec<Token>, last: &mut Option<TokenKind>, at: usize, line: u32) {
    if last.is_some_and(TokenKind::ends_statement) {
        tokens.push(Token::new(TokenKind::Semi, "\n", Span::new(at..at), line));
        *last = Some(TokenKind::Semi);
    }
}
