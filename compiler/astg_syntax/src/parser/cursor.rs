//! Token cursor for navigating the token stream.

use crate::error::{Result, SyntaxError};
use crate::token::{Token, TokenKind};

/// Cursor over a token slice that always ends in [`TokenKind::Eof`].
pub(crate) struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must end in Eof"
        );
        Cursor { tokens, pos: 0 }
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.current().kind
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.current().line
    }

    /// Kind of the token `n` positions ahead, `Eof` past the end.
    #[inline]
    pub fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Line of the most recently consumed token.
    pub fn previous_line(&self) -> u32 {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.line)
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    #[inline]
    pub fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> Result<&'a Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(kind.to_string()))
        }
    }

    pub fn expect_ident(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Ident)?.text.to_string())
    }

    /// Error describing what was expected at the current token.
    #[cold]
    pub fn error(&self, expected: impl Into<String>) -> SyntaxError {
        let tok = self.current();
        let found = match tok.kind {
            TokenKind::Ident | TokenKind::Op => format!("{:?}", &*tok.text),
            TokenKind::Semi if &*tok.text == "\n" => "newline".to_string(),
            kind => kind.to_string(),
        };
        SyntaxError::expected(tok.line, expected, found)
    }

    pub fn skip_semis(&mut self) {
        while self.eat(TokenKind::Semi) {}
    }

    /// Index of the token closing the bracket at `open_at`.
    ///
    /// Counts every bracket kind, so `[` `(` `{` nest freely.
    pub fn matching_close(&self, open_at: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open_at) {
            match tok.kind {
                TokenKind::LParen | TokenKind::LBrack | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBrack | TokenKind::RBrace => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Kind of the token after the bracket group opening `n` tokens ahead.
    pub fn kind_after_group(&self, n: usize) -> TokenKind {
        self.matching_close(self.pos + n)
            .and_then(|close| self.tokens.get(close + 1))
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    /// Consume a bracketed group starting at the current token and return
    /// the tokens strictly inside it.
    pub fn take_group(&mut self) -> Result<&'a [Token]> {
        let open = self.current();
        let close = self.matching_close(self.pos).ok_or_else(|| {
            SyntaxError::expected(open.line, "closing bracket", "end of file")
        })?;
        let inner = &self.tokens[self.pos + 1..close];
        self.pos = close + 1;
        Ok(inner)
    }

    /// Skip tokens up to a semicolon at bracket depth zero, or the closing
    /// bracket of the enclosing group. The terminator is not consumed.
    pub fn skip_statement(&mut self) -> Result<()> {
        loop {
            match self.kind() {
                TokenKind::Semi | TokenKind::Eof => return Ok(()),
                TokenKind::RParen | TokenKind::RBrack | TokenKind::RBrace => return Ok(()),
                TokenKind::LParen | TokenKind::LBrack | TokenKind::LBrace => {
                    self.take_group()?;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}
