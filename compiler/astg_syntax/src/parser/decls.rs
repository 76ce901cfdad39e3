//! Top-level declarations: imports, types, functions and skipped values.

use std::sync::Arc;

use super::{unquote, Parser};
use crate::ast::{Decl, FuncDecl, ImportSpec, Receiver, TypeSpec};
use crate::error::Result;
use crate::token::TokenKind;

impl Parser<'_> {
    /// `import "p"` or `import ( ... )`.
    pub(super) fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Result<()> {
        self.cursor.expect(TokenKind::Import)?;
        if self.cursor.eat(TokenKind::LParen) {
            self.cursor.skip_semis();
            while !self.cursor.check(TokenKind::RParen) {
                imports.push(self.parse_import_spec()?);
                self.expect_semi()?;
                self.cursor.skip_semis();
            }
            self.cursor.expect(TokenKind::RParen)?;
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec> {
        let line = self.cursor.line();
        let name = match self.cursor.kind() {
            TokenKind::Ident => Some(self.cursor.advance().text.to_string()),
            TokenKind::Dot => {
                self.cursor.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = match self.cursor.kind() {
            TokenKind::String | TokenKind::RawString => unquote(&self.cursor.advance().text),
            _ => return Err(self.cursor.error("import path")),
        };
        Ok(ImportSpec { name, path, line })
    }

    /// `type Spec` or `type ( Spec; ... )`.
    pub(super) fn parse_type_decl(&mut self, decls: &mut Vec<Decl>) -> Result<()> {
        let decl_line = self.cursor.line();
        self.cursor.expect(TokenKind::Type)?;
        if self.cursor.eat(TokenKind::LParen) {
            let group_docs = self.comments.docs_before(decl_line);
            let mut specs = Vec::new();
            self.cursor.skip_semis();
            while !self.cursor.check(TokenKind::RParen) {
                specs.push(self.parse_type_spec()?);
                self.expect_semi()?;
                self.cursor.skip_semis();
            }
            self.cursor.expect(TokenKind::RParen)?;
            if let [only] = specs.as_mut_slice() {
                if only.docs.is_empty() {
                    only.docs = group_docs;
                }
            }
            decls.extend(specs.into_iter().map(Decl::Type));
        } else {
            let mut spec = self.parse_type_spec()?;
            if spec.docs.is_empty() {
                spec.docs = self.comments.docs_before(decl_line);
            }
            decls.push(Decl::Type(spec));
        }
        Ok(())
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let line = self.cursor.line();
        let docs = self.comments.docs_before(line);
        let name = self.cursor.expect_ident()?;

        // `type A [N]T` declares an array; `type A[T any] ...` is generic.
        let generic = self.cursor.check(TokenKind::LBrack)
            && self.cursor.peek_kind(1) == TokenKind::Ident
            && self.cursor.peek_kind(2) != TokenKind::RBrack;
        let type_params = if generic {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        let is_alias = self.cursor.eat(TokenKind::Assign);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            type_params,
            is_alias,
            ty,
            docs,
            line,
        })
    }

    /// `func [recv] Name[TypeParams](params) results [body]`.
    pub(super) fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        let line = self.cursor.line();
        let docs = self.comments.docs_before(line);
        self.cursor.expect(TokenKind::Func)?;

        let recv = if self.cursor.check(TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name = self.cursor.expect_ident()?;
        let type_params = if self.cursor.check(TokenKind::LBrack) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;

        let body = if self.cursor.check(TokenKind::LBrace) {
            let tokens = self.cursor.take_group()?;
            Some(Arc::from(tokens))
        } else {
            None
        };
        self.expect_semi()?;

        Ok(FuncDecl {
            name,
            recv,
            type_params,
            sig,
            body,
            docs,
            line,
        })
    }

    fn parse_receiver(&mut self) -> Result<Receiver> {
        self.cursor.expect(TokenKind::LParen)?;
        let named = self.cursor.check(TokenKind::Ident)
            && matches!(
                self.cursor.peek_kind(1),
                TokenKind::Ident | TokenKind::Star | TokenKind::LParen
            );
        let name = if named {
            Some(self.cursor.expect_ident()?)
        } else {
            None
        };

        // `(s *(T))` is legal if odd; strip redundant parens.
        let mut parens = 0;
        while self.cursor.eat(TokenKind::LParen) {
            parens += 1;
        }
        let pointer = self.cursor.eat(TokenKind::Star);
        let type_name = self.cursor.expect_ident()?;

        let mut type_args = Vec::new();
        if self.cursor.eat(TokenKind::LBrack) {
            while !self.cursor.check(TokenKind::RBrack) {
                type_args.push(self.cursor.expect_ident()?);
                if !self.cursor.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.cursor.expect(TokenKind::RBrack)?;
        }
        for _ in 0..parens {
            self.cursor.expect(TokenKind::RParen)?;
        }
        self.cursor.eat(TokenKind::Comma);
        self.cursor.expect(TokenKind::RParen)?;

        Ok(Receiver {
            name,
            type_name,
            pointer,
            type_args,
        })
    }

    /// Skip a `var` or `const` declaration.
    pub(super) fn skip_value_decl(&mut self) -> Result<()> {
        self.cursor.advance();
        if self.cursor.check(TokenKind::LParen) {
            self.cursor.take_group()?;
        } else {
            self.cursor.skip_statement()?;
        }
        self.expect_semi()
    }
}
