//! Expression parsing.
//!
//! One function per precedence level, lowest binding first:
//!
//! ```text
//! assignment → logic_or → logic_and → equality → comparison
//!            → term → factor → unary → call → primary
//! ```
//!
//! Each binary level loops on its own operators, so every operator in the
//! chain is left-associative; assignment alone recurses on itself and is
//! right-associative.

use loxi_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Entry point: parses a full expression.
    pub fn expression(&mut self) -> Option<Expr> {
        self.assignment()
    }

    /// assignment → ( call "." )? IDENT "=" assignment | logic_or
    ///
    /// The left-hand side is parsed as an ordinary expression first; if an
    /// `=` follows, the parsed node is converted into an assignment target.
    /// An invalid target is reported but parsing continues with the
    /// expression unchanged.
    fn assignment(&mut self) -> Option<Expr> {
        let expr = self.logic_or()?;

        if self.match_kind(TokenKind::Eq) {
            let equals = self.previous();
            let value = self.assignment()?;

            return Some(match expr {
                Expr::Variable(var) => Expr::Assign(AssignExpr {
                    id: self.next_id(),
                    name: var.name,
                    value: Box::new(value),
                    span: var.span,
                }),
                Expr::Get(get) => Expr::Set(SetExpr {
                    id: self.next_id(),
                    object: get.object,
                    name: get.name,
                    value: Box::new(value),
                    span: get.span,
                }),
                other => {
                    self.error_at(equals, "Invalid assignment target.");
                    other
                }
            });
        }

        Some(expr)
    }

    /// logic_or → logic_and ( "or" logic_and )*
    fn logic_or(&mut self) -> Option<Expr> {
        let mut expr = self.logic_and()?;

        while self.check(TokenKind::Or) {
            let span = self.advance().span;
            let right = self.logic_and()?;
            expr = Expr::Logical(LogicalExpr {
                id: self.next_id(),
                left: Box::new(expr),
                op: LogicalOp::Or,
                right: Box::new(right),
                span,
            });
        }

        Some(expr)
    }

    /// logic_and → equality ( "and" equality )*
    fn logic_and(&mut self) -> Option<Expr> {
        let mut expr = self.equality()?;

        while self.check(TokenKind::And) {
            let span = self.advance().span;
            let right = self.equality()?;
            expr = Expr::Logical(LogicalExpr {
                id: self.next_id(),
                left: Box::new(expr),
                op: LogicalOp::And,
                right: Box::new(right),
                span,
            });
        }

        Some(expr)
    }

    /// equality → comparison ( ( "!=" | "==" ) comparison )*
    fn equality(&mut self) -> Option<Expr> {
        let mut expr = self.comparison()?;

        loop {
            let op = match self.current().kind {
                TokenKind::NotEq => BinOp::Ne,
                TokenKind::EqEq => BinOp::Eq,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.comparison()?;
            expr = self.binary(expr, op, right, span);
        }

        Some(expr)
    }

    /// comparison → term ( ( ">" | ">=" | "<" | "<=" ) term )*
    fn comparison(&mut self) -> Option<Expr> {
        let mut expr = self.term()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.term()?;
            expr = self.binary(expr, op, right, span);
        }

        Some(expr)
    }

    /// term → factor ( ( "-" | "+" ) factor )*
    fn term(&mut self) -> Option<Expr> {
        let mut expr = self.factor()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Plus => BinOp::Add,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.factor()?;
            expr = self.binary(expr, op, right, span);
        }

        Some(expr)
    }

    /// factor → unary ( ( "/" | "*" ) unary )*
    fn factor(&mut self) -> Option<Expr> {
        let mut expr = self.unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Slash => BinOp::Div,
                TokenKind::Star => BinOp::Mul,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.unary()?;
            expr = self.binary(expr, op, right, span);
        }

        Some(expr)
    }

    /// unary → ( "!" | "-" ) unary | call
    fn unary(&mut self) -> Option<Expr> {
        let op = match self.current().kind {
            TokenKind::Not => UnOp::Not,
            TokenKind::Minus => UnOp::Neg,
            _ => return self.call(),
        };
        let span = self.advance().span;
        let operand = self.unary()?;

        Some(Expr::Unary(UnaryExpr {
            id: self.next_id(),
            op,
            operand: Box::new(operand),
            span,
        }))
    }

    /// call → primary ( "(" args? ")" | "." IDENT )*
    fn call(&mut self) -> Option<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(TokenKind::LParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::Dot) {
                let (name, span) = self.expect_ident("Expect property name after '.'.")?;
                expr = Expr::Get(GetExpr {
                    id: self.next_id(),
                    object: Box::new(expr),
                    name,
                    span,
                });
            } else {
                break;
            }
        }

        Some(expr)
    }

    /// Parses the argument list and closing parenthesis of a call.
    ///
    /// More than 255 arguments is reported but does not abort parsing.
    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args = Vec::new();

        if !self.check(TokenKind::RParen) {
            loop {
                if args.len() >= 255 {
                    self.error_at_current("Can't have more than 255 arguments.");
                }
                args.push(self.expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }

        let paren = self.expect(TokenKind::RParen, "Expect ')' after arguments.")?;

        Some(Expr::Call(CallExpr {
            id: self.next_id(),
            callee: Box::new(callee),
            args,
            span: paren.span,
        }))
    }

    /// primary → NUMBER | STRING | "true" | "false" | "nil" | "this"
    ///         | IDENT | "(" expression ")" | "super" "." IDENT
    fn primary(&mut self) -> Option<Expr> {
        let token = self.current();

        let expr = match token.kind {
            TokenKind::False => {
                self.advance();
                self.literal(LiteralValue::Bool(false), token.span)
            }
            TokenKind::True => {
                self.advance();
                self.literal(LiteralValue::Bool(true), token.span)
            }
            TokenKind::Nil => {
                self.advance();
                self.literal(LiteralValue::Nil, token.span)
            }
            TokenKind::Number(value) => {
                self.advance();
                self.literal(LiteralValue::Number(value), token.span)
            }
            TokenKind::Str(content) => {
                self.advance();
                self.literal(LiteralValue::Str(content), token.span)
            }
            TokenKind::This => {
                self.advance();
                Expr::This(ThisExpr {
                    id: self.next_id(),
                    span: token.span,
                })
            }
            TokenKind::Super => {
                self.advance();
                self.expect(TokenKind::Dot, "Expect '.' after 'super'.")?;
                let (method, _) = self.expect_ident("Expect superclass method name.")?;
                Expr::Super(SuperExpr {
                    id: self.next_id(),
                    method,
                    span: token.span,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                Expr::Variable(VariableExpr {
                    id: self.next_id(),
                    name,
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "Expect ')' after expression.")?;
                Expr::Grouping(GroupingExpr {
                    id: self.next_id(),
                    inner: Box::new(inner),
                    span: token.span,
                })
            }
            _ => {
                self.error_at_current("Expect expression.");
                return None;
            }
        };

        Some(expr)
    }

    fn literal(&self, value: LiteralValue, span: loxi_util::Span) -> Expr {
        Expr::Literal(LiteralExpr {
            id: self.next_id(),
            value,
            span,
        })
    }

    fn binary(&self, left: Expr, op: BinOp, right: Expr, span: loxi_util::Span) -> Expr {
        Expr::Binary(BinaryExpr {
            id: self.next_id(),
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        })
    }
}
