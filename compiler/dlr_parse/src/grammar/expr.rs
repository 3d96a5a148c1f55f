//! Expression grammar.
//!
//! Binary operators use precedence climbing over [`BinaryOp::precedence`];
//! unary `-`/`!` bind tighter than any binary operator, and postfix forms
//! (`.attr`, `.method(...)`, `[...]`, `(k = v)`) bind tightest.

use dlr_diagnostic::Diagnostic;
use dlr_ir::{
    BinaryOp, Binding, Comprehension, ComprehensionKind, Expr, ExprKind, KwArg, Literal,
    MapEntry, Span, TokenKind, UnaryOp,
};
use tracing::trace;

use crate::Parser;

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_op(self.cursor.current_kind()) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.cursor.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.cursor.current_span();
        let op = match self.cursor.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.cursor.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = expr.span;
            expr = match self.cursor.current_kind() {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let name = self.expect_ident("attribute name after `.`")?;
                    if self.cursor.eat(&TokenKind::LParen) {
                        let args = self.parse_args(&TokenKind::RParen)?;
                        ExprKind::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                        }
                    } else {
                        ExprKind::GetAttr {
                            receiver: Box::new(expr),
                            attr: name,
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let args = self.parse_args(&TokenKind::RBracket)?;
                    if args.is_empty() {
                        return Err(self.error("index requires at least one argument"));
                    }
                    ExprKind::Index {
                        receiver: Box::new(expr),
                        args,
                    }
                }
                TokenKind::LParen => {
                    self.cursor.advance();
                    let args = self.parse_kwargs()?;
                    ExprKind::NodeCall {
                        target: Box::new(expr),
                        args,
                    }
                }
                _ => return Ok(expr),
            }
            .with_span(start.merge(self.cursor.previous_span()));
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.cursor.current_span();
        let kind = match self.cursor.current_kind() {
            TokenKind::Int(v) => ExprKind::Literal(Literal::Int(*v)),
            TokenKind::Float(v) => ExprKind::Literal(Literal::Float(*v)),
            TokenKind::Str(s) => ExprKind::Literal(Literal::Str(s.clone())),
            TokenKind::Nil => ExprKind::Literal(Literal::Nil),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Ident(name) => ExprKind::Ident(name.clone()),
            TokenKind::Underscore => ExprKind::SelfRef,
            TokenKind::Const(_) => {
                let path = self.parse_node_path()?;
                return Ok(ExprKind::NodeRef(path).with_span(start.merge(self.cursor.previous_span())));
            }
            TokenKind::If => return self.parse_if(),
            TokenKind::Err => {
                self.cursor.advance();
                if !self.cursor.eat(&TokenKind::LParen) {
                    return Err(self.expected("`(` after ERR"));
                }
                let args = self.parse_args(&TokenKind::RParen)?;
                return Ok(ExprKind::Raise(args).with_span(start.merge(self.cursor.previous_span())));
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                if !self.cursor.eat(&TokenKind::RParen) {
                    return Err(self.expected("`)`"));
                }
                return Ok(Expr::new(inner.kind, start.merge(self.cursor.previous_span())));
            }
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::LBrace => return self.parse_brace(),
            _ => return Err(self.expected("an expression")),
        };
        self.cursor.advance();
        Ok(Expr::new(kind, start))
    }

    fn parse_if(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let cond = self.parse_expr()?;
        if !self.cursor.eat(&TokenKind::Then) {
            return Err(self.expected("`then`"));
        }
        let then_branch = self.parse_expr()?;
        if !self.cursor.eat(&TokenKind::Else) {
            return Err(self.expected("`else`"));
        }
        let else_branch = self.parse_expr()?;
        let span = start.merge(else_branch.span);
        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }

    /// Comma separated expressions up to and including `close`.
    fn parse_args(&mut self, close: &TokenKind) -> Result<Vec<Expr>, Diagnostic> {
        let mut args = Vec::new();
        while !self.cursor.eat(close) {
            args.push(self.parse_expr()?);
            if !self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.eat(close) {
                    break;
                }
                return Err(self.expected(&format!("`,` or `{close}`")));
            }
        }
        Ok(args)
    }

    /// `name = expr` and `**expr` arguments of a node call, through `)`.
    fn parse_kwargs(&mut self) -> Result<Vec<KwArg>, Diagnostic> {
        let mut args = Vec::new();
        while !self.cursor.eat(&TokenKind::RParen) {
            if self.cursor.eat(&TokenKind::DoubleStar) {
                args.push(KwArg::Spread(self.parse_expr()?));
            } else if matches!(self.cursor.current_kind(), TokenKind::Ident(_))
                && self.cursor.peek_kind(1) == &TokenKind::Assign
            {
                let name = self.expect_ident("parameter name")?;
                self.cursor.advance();
                let value = self.parse_expr()?;
                args.push(KwArg::Named { name, value });
            } else {
                return Err(self.error("node calls take keyword arguments only"));
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.eat(&TokenKind::RParen) {
                    break;
                }
                return Err(self.expected("`,` or `)`"));
            }
        }
        Ok(args)
    }

    /// `[]`, `[a, b]`, `[e for x in xs if c]`
    fn parse_list(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        if self.cursor.eat(&TokenKind::RBracket) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), start.merge(self.cursor.previous_span())));
        }
        let first = self.parse_expr()?;
        if self.cursor.check(&TokenKind::For) {
            let comp = self.parse_comprehension_tail(ComprehensionKind::List(first), &TokenKind::RBracket)?;
            return Ok(comp.with_span(start.merge(self.cursor.previous_span())));
        }
        let mut items = vec![first];
        if self.cursor.eat(&TokenKind::Comma) {
            items.extend(self.parse_args(&TokenKind::RBracket)?);
        } else if !self.cursor.eat(&TokenKind::RBracket) {
            return Err(self.expected("`,` or `]`"));
        }
        Ok(ExprKind::List(items).with_span(start.merge(self.cursor.previous_span())))
    }

    /// Map, set, and their comprehensions. `{}` is the empty map.
    fn parse_brace(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        if self.cursor.eat(&TokenKind::RBrace) {
            return Ok(ExprKind::Map(Vec::new()).with_span(start.merge(self.cursor.previous_span())));
        }
        if self.cursor.check(&TokenKind::DoubleStar) {
            let entries = self.parse_map_entries(Vec::new())?;
            return Ok(ExprKind::Map(entries).with_span(start.merge(self.cursor.previous_span())));
        }

        let first = self.parse_expr()?;
        let kind = if self.cursor.eat(&TokenKind::Colon) {
            let value = self.parse_expr()?;
            if self.cursor.check(&TokenKind::For) {
                self.parse_comprehension_tail(
                    ComprehensionKind::Map { key: first, value },
                    &TokenKind::RBrace,
                )?
            } else {
                let pair = MapEntry::Pair { key: first, value };
                if self.cursor.eat(&TokenKind::RBrace) {
                    ExprKind::Map(vec![pair])
                } else if self.cursor.eat(&TokenKind::Comma) {
                    ExprKind::Map(self.parse_map_entries(vec![pair])?)
                } else {
                    return Err(self.expected("`,` or `}`"));
                }
            }
        } else if self.cursor.check(&TokenKind::For) {
            self.parse_comprehension_tail(ComprehensionKind::Set(first), &TokenKind::RBrace)?
        } else {
            let mut items = vec![first];
            if self.cursor.eat(&TokenKind::Comma) {
                items.extend(self.parse_args(&TokenKind::RBrace)?);
            } else if !self.cursor.eat(&TokenKind::RBrace) {
                return Err(self.expected("`,` or `}`"));
            }
            ExprKind::Set(items)
        };
        Ok(kind.with_span(start.merge(self.cursor.previous_span())))
    }

    /// Remaining `key: value` / `**expr` entries of a map literal, through `}`.
    fn parse_map_entries(&mut self, mut entries: Vec<MapEntry>) -> Result<Vec<MapEntry>, Diagnostic> {
        while !self.cursor.eat(&TokenKind::RBrace) {
            if self.cursor.eat(&TokenKind::DoubleStar) {
                entries.push(MapEntry::Spread(self.parse_expr()?));
            } else {
                let key = self.parse_expr()?;
                if !self.cursor.eat(&TokenKind::Colon) {
                    return Err(self.expected("`:` in map literal"));
                }
                let value = self.parse_expr()?;
                entries.push(MapEntry::Pair { key, value });
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.eat(&TokenKind::RBrace) {
                    break;
                }
                return Err(self.expected("`,` or `}`"));
            }
        }
        Ok(entries)
    }

    /// `for x in source [if filter]` followed by `close`.
    fn parse_comprehension_tail(
        &mut self,
        kind: ComprehensionKind,
        close: &TokenKind,
    ) -> Result<ExprKind, Diagnostic> {
        self.cursor.advance();
        let first = self.expect_ident("comprehension variable")?;
        let binding = if self.cursor.eat(&TokenKind::Comma) {
            Binding::Pair(first, self.expect_ident("second comprehension variable")?)
        } else {
            Binding::Single(first)
        };
        if !self.cursor.eat(&TokenKind::In) {
            return Err(self.expected("`in`"));
        }
        let source = self.parse_expr()?;
        let filter = if self.cursor.eat(&TokenKind::If) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        if !self.cursor.eat(close) {
            return Err(self.expected(&format!("`{close}`")));
        }
        trace!(?binding, "parsed comprehension");
        Ok(ExprKind::Comprehension(Box::new(Comprehension {
            kind,
            binding,
            source,
            filter,
        })))
    }
}

/// Attach a span to a freshly built expression kind.
trait WithSpan {
    fn with_span(self, span: Span) -> Expr;
}

impl WithSpan for ExprKind {
    fn with_span(self, span: Span) -> Expr {
        Expr::new(self, span)
    }
}
