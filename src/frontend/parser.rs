//! Parser for Axenlang
//!
//! Recursive descent for declarations and statements, precedence climbing for
//! expressions. The parser is single-pass and purely syntactic: an identifier
//! is classified as a class reference or a variable reference by the position
//! it appears in, never by symbol-table lookup. Syntax errors are reported to
//! the diagnostics collector and parsing resumes at the next statement or
//! declaration boundary.

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, Diagnostics};
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The outcome of a parse: a (possibly partial) AST plus every diagnostic
/// collected along the way, in source order. Nothing here is fatal; the
/// caller decides what is build-blocking.
#[derive(Debug)]
pub struct ParseResult {
    pub file: SourceFile,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse one source unit. One lexer+parser pair per call; no state survives.
pub fn parse(source: &str) -> ParseResult {
    Parser::new(Lexer::new(source)).parse_source_file()
}

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Diagnostics,
}

impl Parser {
    /// Create a new parser from a lexer, adopting its lex diagnostics
    pub fn new(mut lexer: Lexer) -> Self {
        let tokens = lexer.tokenize();
        let mut diags = Diagnostics::new();
        for error in lexer.take_diagnostics() {
            diags.report(&error);
        }
        Self { tokens, pos: 0, diags }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("tokens should not be empty")
        })
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Span of the most recently consumed token
    fn end_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(Error::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current_kind().to_string(),
                span: self.current().span,
            })
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident { name, span: token.span })
            }
            _ => Err(Error::ExpectedIdent {
                found: token.kind.to_string(),
                span: token.span,
            }),
        }
    }

    // ==================== Error Recovery ====================

    /// Panic-mode recovery inside a block: discard tokens until a `;`
    /// (consumed), the balancing `}` (left for the block close), or the end
    /// of a nested braced block.
    fn recover_stmt(&mut self) {
        log::debug!("recovering to statement boundary at token {}", self.pos);
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Panic-mode recovery at the top level: discard tokens until a `;` or
    /// the end of a braced body.
    fn recover_decl(&mut self) {
        log::debug!("recovering to declaration boundary at token {}", self.pos);
        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ==================== Declarations ====================

    /// Parse the whole source unit, collecting declarations and diagnostics
    pub fn parse_source_file(mut self) -> ParseResult {
        log::debug!("parsing source unit ({} tokens)", self.tokens.len());
        let mut decls = Vec::new();

        while !self.is_at_end() {
            match self.parse_decl() {
                Ok(decl) => decls.push(decl),
                Err(error) => {
                    self.diags.report(&error);
                    self.recover_decl();
                }
            }
        }

        ParseResult {
            file: SourceFile { decls },
            diagnostics: self.diags.finish(),
        }
    }

    fn parse_decl(&mut self) -> Result<Decl> {
        let kind = self.current_kind().clone();
        match kind {
            TokenKind::Import => Ok(Decl::Import(self.parse_import()?)),
            TokenKind::Typedef => Ok(Decl::Typedef(self.parse_typedef()?)),
            TokenKind::Intdef => Ok(Decl::Intdef(self.parse_intdef()?)),
            TokenKind::Class => Ok(Decl::Class(self.parse_class()?)),
            k if k.is_primitive_type() => Ok(Decl::Function(self.parse_function()?)),
            TokenKind::Ident(_) => Ok(Decl::Function(self.parse_function()?)),
            other => Err(Error::UnexpectedToken {
                expected: "a declaration (import, typedef, intdef, class, or function)"
                    .to_string(),
                found: other.to_string(),
                span: self.current().span,
            }),
        }
    }

    fn parse_import(&mut self) -> Result<ImportDecl> {
        let start = self.current().span;
        self.expect(TokenKind::Import)?;

        let token = self.current().clone();
        let path = match token.kind {
            TokenKind::StringLit(path) => {
                self.advance();
                path
            }
            _ => {
                return Err(Error::UnexpectedToken {
                    expected: "string literal".to_string(),
                    found: token.kind.to_string(),
                    span: token.span,
                })
            }
        };

        self.expect(TokenKind::Semicolon)?;
        Ok(ImportDecl {
            path,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_typedef(&mut self) -> Result<TypedefDecl> {
        let start = self.current().span;
        self.expect(TokenKind::Typedef)?;

        let alias = self.parse_ident()?;
        let target = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(TypedefDecl {
            alias,
            target,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_intdef(&mut self) -> Result<IntdefDecl> {
        let start = self.current().span;
        self.expect(TokenKind::Intdef)?;

        let alias = self.parse_ident()?;
        let value = self.parse_int_lit()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(IntdefDecl {
            alias,
            value,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_class(&mut self) -> Result<ClassDecl> {
        let start = self.current().span;
        self.expect(TokenKind::Class)?;

        let name = self.parse_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_member() {
                Ok(member) => members.push(member),
                Err(error) => {
                    self.diags.report(&error);
                    self.recover_stmt();
                }
            }
        }

        self.expect(TokenKind::RBrace)?;

        Ok(ClassDecl {
            name,
            members,
            span: start.merge(&self.end_span()),
        })
    }

    /// Fields and methods both start `type identifier`; the next token
    /// decides which one this is.
    fn parse_member(&mut self) -> Result<Member> {
        let start = self.current().span;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        if self.consume(&TokenKind::LParen) {
            let params = self.parse_params()?;
            self.expect(TokenKind::RParen)?;
            let body = self.parse_callable_body()?;
            Ok(Member::Method(MethodDecl {
                ret_type: ty,
                name,
                params,
                body,
                span: start.merge(&self.end_span()),
            }))
        } else if self.consume(&TokenKind::Semicolon) {
            Ok(Member::Field(FieldDecl {
                ty,
                name,
                span: start.merge(&self.end_span()),
            }))
        } else {
            Err(Error::UnexpectedToken {
                expected: "`;` or `(`".to_string(),
                found: self.current_kind().to_string(),
                span: self.current().span,
            })
        }
    }

    fn parse_function(&mut self) -> Result<FunctionDecl> {
        let start = self.current().span;
        let ret_type = self.parse_type()?;
        let name = self.parse_ident()?;

        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        let body = self.parse_callable_body()?;

        Ok(FunctionDecl {
            ret_type,
            name,
            params,
            body,
            span: start.merge(&self.end_span()),
        })
    }

    /// After a signature, `;` makes a prototype and a block makes a
    /// definition.
    fn parse_callable_body(&mut self) -> Result<Option<Block>> {
        if self.consume(&TokenKind::Semicolon) {
            Ok(None)
        } else if self.check(&TokenKind::LBrace) {
            Ok(Some(self.parse_block()?))
        } else {
            Err(Error::UnexpectedToken {
                expected: "`;` or `{`".to_string(),
                found: self.current_kind().to_string(),
                span: self.current().span,
            })
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            params.push(self.parse_param()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let start = self.current().span;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        Ok(Param {
            ty,
            name,
            span: start.merge(&self.end_span()),
        })
    }

    // ==================== Types ====================

    /// Parse a type. The `[n]` suffix composes left-to-right over the base
    /// type already parsed, so `ptr int[4]` is an array of four pointers.
    fn parse_type(&mut self) -> Result<Type> {
        let start = self.current().span;
        let mut ty = self.parse_type_core()?;

        while self.consume(&TokenKind::LBracket) {
            let len = self.parse_int_lit()?;
            self.expect(TokenKind::RBracket)?;
            ty = Type::Array {
                elem: Box::new(ty),
                len,
                span: start.merge(&self.end_span()),
            };
        }

        Ok(ty)
    }

    fn parse_type_core(&mut self) -> Result<Type> {
        let token = self.current().clone();

        if let Some(kind) = primitive_kind(&token.kind) {
            self.advance();
            return Ok(Type::Primitive(kind, token.span));
        }

        match token.kind {
            // `ptr` only means pointer in type position
            TokenKind::Ident(name) if name == "ptr" => {
                self.advance();
                let target = self.parse_type_core()?;

                // A parameter list after the target makes this a function
                // pointer with the target as return type.
                if self.consume(&TokenKind::LParen) {
                    let mut params = Vec::new();
                    while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                        params.push(self.parse_type()?);
                        if !self.consume(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Type::FunctionPointer {
                        ret: Box::new(target),
                        params,
                        span: token.span.merge(&self.end_span()),
                    })
                } else {
                    let span = token.span.merge(&target.span());
                    Ok(Type::Pointer(Box::new(target), span))
                }
            }
            // Any other identifier in type position is a class reference
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Type::ClassRef(Ident { name, span: token.span }))
            }
            _ => Err(Error::ExpectedType {
                found: token.kind.to_string(),
                span: token.span,
            }),
        }
    }

    fn parse_int_lit(&mut self) -> Result<IntLit> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::IntLit { value, unsigned } => {
                self.advance();
                Ok(IntLit {
                    value,
                    unsigned,
                    span: token.span,
                })
            }
            _ => Err(Error::UnexpectedToken {
                expected: "integer literal".to_string(),
                found: token.kind.to_string(),
                span: token.span,
            }),
        }
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> Result<Block> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.diags.report(&error);
                    self.recover_stmt();
                }
            }
        }

        self.expect(TokenKind::RBrace)?;

        Ok(Block {
            stmts,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let kind = self.current_kind().clone();
        match kind {
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            k if k.is_primitive_type() => self.parse_var_decl(),
            TokenKind::Ident(_) if self.looks_like_var_decl() => self.parse_var_decl(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    /// A statement starting with an identifier is either a declaration with
    /// a class-reference (or `ptr`) type, or an expression. Speculatively
    /// scan a type and see whether an identifier follows; the position is
    /// restored either way and nothing is reported during the scan.
    fn looks_like_var_decl(&mut self) -> bool {
        let saved = self.pos;
        let is_decl =
            self.parse_type().is_ok() && matches!(self.current_kind(), TokenKind::Ident(_));
        self.pos = saved;
        is_decl
    }

    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        let init = if self.consume(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::VarDecl {
            ty,
            name,
            init,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };

        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt::Return {
            value,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::If)?;

        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let then_block = self.parse_block()?;

        // The else arm is always a block; there is no `else if` chaining.
        let else_block = if self.consume(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span: start.merge(&self.end_span()),
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        self.expect(TokenKind::While)?;

        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;

        Ok(Stmt::While {
            cond,
            body,
            span: start.merge(&self.end_span()),
        })
    }

    /// Parse a general expression first, then classify. A root `=` whose
    /// left side is an lvalue becomes an assignment statement; a root `=`
    /// over anything else is an invalid assignment target; everything else
    /// is a bare expression statement.
    fn parse_expr_or_assign_stmt(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;

        let stmt = match expr {
            Expr::Binary {
                op: BinOp::Assign,
                left,
                right,
                span,
            } => {
                if left.is_lvalue() {
                    Stmt::Assign {
                        target: *left,
                        value: *right,
                        span,
                    }
                } else {
                    return Err(Error::InvalidAssignTarget { span: left.span() });
                }
            }
            expr => Stmt::Expr(expr),
        };

        self.expect(TokenKind::Semicolon)?;
        Ok(stmt)
    }

    // ==================== Expressions ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Precedence climbing. Every operator, including `=`, is
    /// left-associative, so the next level always climbs with `bp + 1`.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_operand()?;

        loop {
            let kind = self.current_kind().clone();
            let Some(bp) = kind.binary_precedence() else {
                break;
            };
            if bp < min_bp {
                break;
            }
            let Some(op) = token_to_binop(&kind) else {
                break;
            };
            self.advance();

            let right = self.parse_expr_bp(bp + 1)?;
            let span = left.span().merge(&right.span());

            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    /// One binary operand: prefix operators bind tighter than the postfix
    /// `.`/`[ ]` chain, so `$a[0]` indexes the dereference.
    fn parse_operand(&mut self) -> Result<Expr> {
        let expr = self.parse_prefix()?;
        self.parse_postfix(expr)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Dollar => {
                self.advance();
                let operand = self.parse_prefix()?;
                let span = token.span.merge(&operand.span());
                Ok(Expr::Deref {
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::Amp => {
                self.advance();
                let operand = self.parse_prefix()?;
                let span = token.span.merge(&operand.span());
                Ok(Expr::AddressOf {
                    operand: Box::new(operand),
                    span,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.consume(&TokenKind::Dot) {
                let field = self.parse_ident()?;
                expr = Expr::Field {
                    span: expr.span().merge(&field.span),
                    object: Box::new(expr),
                    field,
                };
            } else if self.consume(&TokenKind::LBracket) {
                // One Index node whether the base is an array or a pointer;
                // the semantic pass owns that distinction.
                let index = self.parse_expr()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Index {
                    span: expr.span().merge(&self.end_span()),
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::IntLit { value, unsigned } => {
                self.advance();
                Ok(Expr::Int(IntLit {
                    value,
                    unsigned,
                    span: token.span,
                }))
            }
            TokenKind::FloatLit { value, unsigned } => {
                self.advance();
                Ok(Expr::Float {
                    value,
                    unsigned,
                    span: token.span,
                })
            }
            TokenKind::StringLit(value) => {
                self.advance();
                Ok(Expr::Str {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Nullptr => {
                self.advance();
                Ok(Expr::Nullptr { span: token.span })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Grouped {
                    inner: Box::new(inner),
                    span: token.span.merge(&self.end_span()),
                })
            }
            // An identifier in expression position is a variable reference,
            // or a call when a parenthesized argument list follows. The
            // callee is a bare identifier only.
            TokenKind::Ident(name) => {
                self.advance();
                let ident = Ident { name, span: token.span };

                if self.consume(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                        args.push(self.parse_expr()?);
                        if !self.consume(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call {
                        callee: ident,
                        args,
                        span: token.span.merge(&self.end_span()),
                    })
                } else {
                    Ok(Expr::Var(ident))
                }
            }
            _ => Err(Error::ExpectedExpr {
                found: token.kind.to_string(),
                span: token.span,
            }),
        }
    }
}

fn primitive_kind(kind: &TokenKind) -> Option<PrimitiveKind> {
    match kind {
        TokenKind::Void => Some(PrimitiveKind::Void),
        TokenKind::Bool => Some(PrimitiveKind::Bool),
        TokenKind::Char => Some(PrimitiveKind::Char),
        TokenKind::Uchar => Some(PrimitiveKind::Uchar),
        TokenKind::Short => Some(PrimitiveKind::Short),
        TokenKind::Ushort => Some(PrimitiveKind::Ushort),
        TokenKind::Int => Some(PrimitiveKind::Int),
        TokenKind::Uint => Some(PrimitiveKind::Uint),
        TokenKind::Long => Some(PrimitiveKind::Long),
        TokenKind::Ulong => Some(PrimitiveKind::Ulong),
        TokenKind::Half => Some(PrimitiveKind::Half),
        TokenKind::Float => Some(PrimitiveKind::Float),
        TokenKind::Double => Some(PrimitiveKind::Double),
        TokenKind::Quad => Some(PrimitiveKind::Quad),
        _ => None,
    }
}

fn token_to_binop(kind: &TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Eq => Some(BinOp::Assign),
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Mod),
        _ => None,
    }
}
