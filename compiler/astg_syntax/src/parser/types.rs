//! Type expressions, signatures, struct and interface bodies.

use super::{unquote, Parser};
use crate::ast::{
    ArrayLen, ChanDir, FieldDecl, FuncType, InterfaceElem, MethodSpec, Param, TypeExpr, TypeParam,
};
use crate::error::Result;
use crate::token::TokenKind;

/// Whether a token can begin a type expression.
fn starts_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Star
            | TokenKind::LBrack
            | TokenKind::LParen
            | TokenKind::Func
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Arrow
    )
}

/// Tokens that may follow a complete type inside a list or declaration.
fn ends_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Comma
            | TokenKind::RParen
            | TokenKind::RBrack
            | TokenKind::RBrace
            | TokenKind::Semi
            | TokenKind::String
            | TokenKind::RawString
            | TokenKind::Pipe
            | TokenKind::Eof
    )
}

/// One entry of a parameter list before names and types are settled.
struct ParamEntry {
    name: Option<String>,
    ty: Option<TypeExpr>,
    variadic: bool,
    line: u32,
}

impl Parser<'_> {
    pub(super) fn parse_type(&mut self) -> Result<TypeExpr> {
        match self.cursor.kind() {
            TokenKind::Ident => self.parse_type_name(),
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_type()?;
                self.cursor.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Star => {
                self.cursor.advance();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            TokenKind::LBrack => self.parse_array_or_slice(),
            TokenKind::Map => {
                self.cursor.advance();
                self.cursor.expect(TokenKind::LBrack)?;
                let key = self.parse_type()?;
                self.cursor.expect(TokenKind::RBrack)?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            TokenKind::Chan => {
                self.cursor.advance();
                let dir = if self.cursor.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(elem),
                })
            }
            TokenKind::Arrow => {
                self.cursor.advance();
                self.cursor.expect(TokenKind::Chan)?;
                let elem = self.parse_type()?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                })
            }
            TokenKind::Func => {
                self.cursor.advance();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            _ => Err(self.cursor.error("type")),
        }
    }

    /// `Name`, `pkg.Name`, optionally instantiated with `[Args]`.
    fn parse_type_name(&mut self) -> Result<TypeExpr> {
        let first = self.cursor.expect_ident()?;
        let base = if self.cursor.eat(TokenKind::Dot) {
            TypeExpr::Qualified {
                pkg: first,
                name: self.cursor.expect_ident()?,
            }
        } else {
            TypeExpr::Ident(first)
        };
        if !self.cursor.check(TokenKind::LBrack) || self.cursor.peek_kind(1) == TokenKind::RBrack {
            return Ok(base);
        }
        self.cursor.advance();
        let args = self.parse_type_list(TokenKind::RBrack)?;
        Ok(TypeExpr::Generic {
            base: Box::new(base),
            args,
        })
    }

    fn parse_type_list(&mut self, close: TokenKind) -> Result<Vec<TypeExpr>> {
        let mut items = Vec::new();
        while !self.cursor.check(close) {
            items.push(self.parse_type()?);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(close)?;
        Ok(items)
    }

    fn parse_array_or_slice(&mut self) -> Result<TypeExpr> {
        self.cursor.expect(TokenKind::LBrack)?;
        if self.cursor.eat(TokenKind::RBrack) {
            return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
        }
        let len = if self.cursor.check(TokenKind::Ellipsis)
            && self.cursor.peek_kind(1) == TokenKind::RBrack
        {
            self.cursor.advance();
            ArrayLen::Inferred
        } else if self.cursor.check(TokenKind::Int)
            && self.cursor.peek_kind(1) == TokenKind::RBrack
        {
            let text = self.cursor.advance().text.replace('_', "");
            parse_int_literal(&text).map_or(ArrayLen::Expr(text), ArrayLen::Literal)
        } else {
            let mut text = String::new();
            let mut depth = 0usize;
            loop {
                match self.cursor.kind() {
                    TokenKind::RBrack if depth == 0 => break,
                    TokenKind::Eof => return Err(self.cursor.error("]")),
                    TokenKind::LBrack | TokenKind::LParen => depth += 1,
                    TokenKind::RBrack | TokenKind::RParen => depth = depth.saturating_sub(1),
                    _ => {}
                }
                text.push_str(&self.cursor.advance().text);
            }
            ArrayLen::Expr(text)
        };
        self.cursor.expect(TokenKind::RBrack)?;
        let elem = self.parse_type()?;
        Ok(TypeExpr::Array {
            len,
            elem: Box::new(elem),
        })
    }

    /// `[T any, K comparable]` or `[K, V any]`.
    pub(super) fn parse_type_params(&mut self) -> Result<Vec<TypeParam>> {
        self.cursor.expect(TokenKind::LBrack)?;
        let mut params = Vec::new();
        let mut pending = Vec::new();
        while !self.cursor.check(TokenKind::RBrack) {
            pending.push(self.cursor.expect_ident()?);
            if !matches!(self.cursor.kind(), TokenKind::Comma | TokenKind::RBrack) {
                let constraint = self.parse_constraint()?;
                params.push(TypeParam {
                    names: std::mem::take(&mut pending),
                    constraint,
                });
            }
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
        }
        self.cursor.expect(TokenKind::RBrack)?;
        if !pending.is_empty() {
            return Err(self.cursor.error("type constraint"));
        }
        Ok(params)
    }

    /// Constraint or embedded interface element: `~int | string`.
    fn parse_constraint(&mut self) -> Result<TypeExpr> {
        let mut terms = vec![self.parse_constraint_term()?];
        while self.cursor.eat(TokenKind::Pipe) {
            terms.push(self.parse_constraint_term()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            TypeExpr::Union(terms)
        })
    }

    fn parse_constraint_term(&mut self) -> Result<TypeExpr> {
        if self.cursor.eat(TokenKind::Tilde) {
            Ok(TypeExpr::Tilde(Box::new(self.parse_type()?)))
        } else {
            self.parse_type()
        }
    }

    /// `(params) results` after `func` or a method name.
    pub(super) fn parse_signature(&mut self) -> Result<FuncType> {
        let params = self.parse_param_list()?;
        let results = match self.cursor.kind() {
            TokenKind::LParen => self.parse_param_list()?,
            kind if starts_type(kind) => vec![Param {
                name: None,
                ty: self.parse_type()?,
                variadic: false,
                docs: Vec::new(),
            }],
            _ => Vec::new(),
        };
        Ok(FuncType { params, results })
    }

    /// Parenthesized parameter list.
    ///
    /// Go only knows whether identifiers are names or types after seeing
    /// the whole list: if any entry is `name Type`, bare identifiers are
    /// names sharing the next type; otherwise they are types.
    fn parse_param_list(&mut self) -> Result<Vec<Param>> {
        let open_line = self.cursor.line();
        self.cursor.expect(TokenKind::LParen)?;
        let mut entries = Vec::new();
        self.cursor.skip_semis();
        while !self.cursor.check(TokenKind::RParen) {
            entries.push(self.parse_param_entry()?);
            if !self.cursor.eat(TokenKind::Comma) {
                break;
            }
            self.cursor.skip_semis();
        }
        self.cursor.skip_semis();
        self.cursor.expect(TokenKind::RParen)?;

        let named = entries.iter().any(|e| e.name.is_some() && e.ty.is_some());
        let mut params = Vec::with_capacity(entries.len());
        if named {
            let mut pending: Vec<ParamEntry> = Vec::new();
            for entry in entries {
                match entry.ty {
                    None => pending.push(entry),
                    Some(ty) => {
                        for bare in pending.drain(..) {
                            let param =
                                self.make_param(bare.name, ty.clone(), false, bare.line, open_line);
                            params.push(param);
                        }
                        let param =
                            self.make_param(entry.name, ty, entry.variadic, entry.line, open_line);
                        params.push(param);
                    }
                }
            }
            if !pending.is_empty() {
                return Err(self.cursor.error("parameter type"));
            }
        } else {
            for entry in entries {
                let ty = match (entry.ty, entry.name) {
                    (Some(ty), _) => ty,
                    (None, Some(name)) => TypeExpr::Ident(name),
                    (None, None) => continue,
                };
                params.push(self.make_param(None, ty, entry.variadic, entry.line, open_line));
            }
        }
        Ok(params)
    }

    fn make_param(
        &self,
        name: Option<String>,
        ty: TypeExpr,
        variadic: bool,
        line: u32,
        open_line: u32,
    ) -> Param {
        // Only parameters on their own line below `(` carry doc comments.
        let docs = if line > open_line {
            self.comments.docs_before(line)
        } else {
            Vec::new()
        };
        Param {
            name,
            ty,
            variadic,
            docs,
        }
    }

    fn parse_param_entry(&mut self) -> Result<ParamEntry> {
        let line = self.cursor.line();
        if self.cursor.check(TokenKind::Ident) {
            let next = self.cursor.peek_kind(1);
            let bare = matches!(next, TokenKind::Comma | TokenKind::RParen);
            let named = match next {
                TokenKind::Dot => false,
                TokenKind::LBrack => {
                    // `a []T` and `a [N]T` name a parameter; `List[T]` is a type.
                    self.cursor.peek_kind(2) == TokenKind::RBrack
                        || !ends_type(self.cursor.kind_after_group(1))
                }
                TokenKind::Ellipsis => true,
                kind => starts_type(kind),
            };
            if bare {
                let name = self.cursor.expect_ident()?;
                return Ok(ParamEntry {
                    name: Some(name),
                    ty: None,
                    variadic: false,
                    line,
                });
            }
            if named {
                let name = self.cursor.expect_ident()?;
                let variadic = self.cursor.eat(TokenKind::Ellipsis);
                let ty = self.parse_type()?;
                return Ok(ParamEntry {
                    name: Some(name),
                    ty: Some(ty),
                    variadic,
                    line,
                });
            }
        }
        let variadic = self.cursor.eat(TokenKind::Ellipsis);
        let ty = self.parse_type()?;
        Ok(ParamEntry {
            name: None,
            ty: Some(ty),
            variadic,
            line,
        })
    }

    fn parse_struct_type(&mut self) -> Result<TypeExpr> {
        self.cursor.expect(TokenKind::Struct)?;
        self.cursor.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        self.cursor.skip_semis();
        while !self.cursor.check(TokenKind::RBrace) {
            fields.push(self.parse_field_decl()?);
            self.expect_semi()?;
            self.cursor.skip_semis();
        }
        self.cursor.expect(TokenKind::RBrace)?;
        Ok(TypeExpr::Struct(fields))
    }

    fn parse_field_decl(&mut self) -> Result<FieldDecl> {
        let line = self.cursor.line();
        let docs = self.comments.docs_before(line);

        let embedded = match self.cursor.kind() {
            TokenKind::Star => true,
            TokenKind::Ident => match self.cursor.peek_kind(1) {
                TokenKind::Dot => true,
                TokenKind::LBrack => {
                    self.cursor.peek_kind(2) != TokenKind::RBrack
                        && ends_type(self.cursor.kind_after_group(1))
                }
                kind => ends_type(kind) && kind != TokenKind::Comma,
            },
            _ => return Err(self.cursor.error("field name or embedded type")),
        };

        let (names, ty) = if embedded {
            (Vec::new(), self.parse_type()?)
        } else {
            let mut names = vec![self.cursor.expect_ident()?];
            while self.cursor.eat(TokenKind::Comma) {
                names.push(self.cursor.expect_ident()?);
            }
            (names, self.parse_type()?)
        };

        let tag = match self.cursor.kind() {
            TokenKind::String | TokenKind::RawString => Some(unquote(&self.cursor.advance().text)),
            _ => None,
        };
        let comment = self.comments.trailing(self.cursor.previous_line());

        Ok(FieldDecl {
            names,
            ty,
            tag,
            docs,
            comment,
        })
    }

    fn parse_interface_type(&mut self) -> Result<TypeExpr> {
        self.cursor.expect(TokenKind::Interface)?;
        self.cursor.expect(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        self.cursor.skip_semis();
        while !self.cursor.check(TokenKind::RBrace) {
            let line = self.cursor.line();
            if self.cursor.check(TokenKind::Ident) && self.cursor.peek_kind(1) == TokenKind::LParen {
                let docs = self.comments.docs_before(line);
                let name = self.cursor.expect_ident()?;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method(MethodSpec {
                    name,
                    sig,
                    docs,
                    line,
                }));
            } else {
                elems.push(InterfaceElem::Embed(self.parse_constraint()?));
            }
            self.expect_semi()?;
            self.cursor.skip_semis();
        }
        self.cursor.expect(TokenKind::RBrace)?;
        Ok(TypeExpr::Interface(elems))
    }
}

fn parse_int_literal(text: &str) -> Option<u64> {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        u64::from_str_radix(oct, 8).ok()
    } else if lower.len() > 1 && lower.starts_with('0') {
        u64::from_str_radix(&lower[1..], 8).ok()
    } else {
        lower.parse().ok()
    }
}
