//! Recursive descent parser for the declaration level of Go files.
//!
//! Comments are not part of the token stream; the parser looks them up by
//! line through [`CommentMap`] to attach doc groups and trailing comments.

mod cursor;
mod decls;
mod types;

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::ast::SourceFile;
use crate::constraint;
use crate::error::{Result, SyntaxError};
use crate::lexer::lex;
use crate::token::{Comment, Token, TokenKind};
use cursor::Cursor;

/// Comments of a file indexed by line.
#[derive(Default)]
pub(crate) struct CommentMap {
    /// Own-line comment groups keyed by the line the group ends on.
    groups: FxHashMap<u32, Vec<String>>,
    /// First trailing comment of each line.
    trailing: FxHashMap<u32, String>,
}

impl CommentMap {
    fn new(comments: &[Comment]) -> Self {
        let mut map = CommentMap::default();
        let mut group: Vec<String> = Vec::new();
        let mut group_end: Option<u32> = None;

        for comment in comments {
            if !comment.own_line {
                map.trailing
                    .entry(comment.start_line)
                    .or_insert_with(|| comment.lines().join(" ").trim().to_string());
                continue;
            }
            if group_end.is_some_and(|end| comment.start_line != end + 1) {
                if let Some(end) = group_end.take() {
                    map.groups.insert(end, std::mem::take(&mut group));
                }
            }
            if !is_directive(&comment.text) {
                group.extend(comment.lines());
            }
            group_end = Some(comment.end_line);
        }
        if let Some(end) = group_end {
            map.groups.insert(end, group);
        }
        map
    }

    /// Doc group ending on the line just above `line`.
    pub fn docs_before(&self, line: u32) -> Vec<String> {
        line.checked_sub(1)
            .and_then(|l| self.groups.get(&l))
            .map(|lines| trim_blank_edges(lines))
            .unwrap_or_default()
    }

    pub fn trailing(&self, line: u32) -> Option<String> {
        self.trailing.get(&line).cloned()
    }
}

/// `//go:` and `//line` directives never belong to documentation.
fn is_directive(text: &str) -> bool {
    text.starts_with("//go:") || text.starts_with("//line ") || text.starts_with("//nolint")
}

fn trim_blank_edges(lines: &[String]) -> Vec<String> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    comments: CommentMap,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token], comments: &[Comment]) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            comments: CommentMap::new(comments),
        }
    }

    /// Parse the whole file after the header comments were inspected.
    fn parse_file(&mut self, file: &mut SourceFile) -> Result<()> {
        self.cursor.skip_semis();
        if !self.cursor.check(TokenKind::Package) {
            return Err(SyntaxError::MissingPackage);
        }
        let package_line = self.cursor.line();
        file.package_docs = self.comments.docs_before(package_line);
        self.cursor.advance();
        file.package = self.cursor.expect_ident()?;
        self.expect_semi()?;

        self.cursor.skip_semis();
        while self.cursor.check(TokenKind::Import) {
            self.parse_import_decl(&mut file.imports)?;
            self.expect_semi()?;
            self.cursor.skip_semis();
        }

        while !self.cursor.is_at_end() {
            match self.cursor.kind() {
                TokenKind::Semi => {
                    self.cursor.advance();
                }
                TokenKind::Type => self.parse_type_decl(&mut file.decls)?,
                TokenKind::Func => {
                    let func = self.parse_func_decl()?;
                    file.decls.push(crate::ast::Decl::Func(func));
                }
                TokenKind::Var | TokenKind::Const => self.skip_value_decl()?,
                TokenKind::Import => self.parse_import_decl(&mut file.imports)?,
                _ => return Err(self.cursor.error("declaration")),
            }
        }
        Ok(())
    }

    /// Statement terminator: an explicit or inserted `;`, or a closing
    /// bracket that ends the enclosing list.
    fn expect_semi(&mut self) -> Result<()> {
        match self.cursor.kind() {
            TokenKind::Semi => {
                self.cursor.advance();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.cursor.error("';' or newline")),
        }
    }
}

/// Parse a Go source file into its declaration-level syntax tree.
pub fn parse_file(path: &Path, source: &str) -> Result<SourceFile> {
    let lexed = lex(source)?;
    let mut file = SourceFile {
        path: path.to_path_buf(),
        ..SourceFile::default()
    };

    let package_line = lexed
        .tokens
        .iter()
        .find(|t| t.kind == TokenKind::Package)
        .map_or(u32::MAX, |t| t.line);
    let header: Vec<&Comment> = lexed
        .comments
        .iter()
        .take_while(|c| c.start_line < package_line)
        .collect();
    file.generated = header.iter().any(|c| is_generated_header(&c.text));
    file.build_constraint = constraint::from_header(header.iter().map(|c| c.text.as_str()));

    let mut parser = Parser::new(&lexed.tokens, &lexed.comments);
    parser.parse_file(&mut file)?;
    tracing::trace!(
        path = %path.display(),
        package = %file.package,
        decls = file.decls.len(),
        "parsed file"
    );
    Ok(file)
}

fn is_generated_header(text: &str) -> bool {
    text.strip_prefix("// Code generated ")
        .is_some_and(|rest| rest.trim_end().ends_with("DO NOT EDIT."))
}

/// Decode a string literal token's source text.
///
/// Raw strings lose their backquotes; interpreted strings have the common
/// escapes resolved and anything else kept verbatim.
pub fn unquote(text: &str) -> String {
    if let Some(raw) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        return raw.replace('\r', "");
    }
    let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) else {
        return text.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests;
