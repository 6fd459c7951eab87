//! Statement and declaration parsing, including the parse-time `for`
//! desugaring.

use std::rc::Rc;

use loxi_lex::TokenKind;

use crate::ast::*;
use crate::Parser;

impl<'a> Parser<'a> {
    /// declaration → classDecl | funDecl | varDecl | statement
    pub fn declaration(&mut self) -> Option<Stmt> {
        if self.match_kind(TokenKind::Class) {
            self.class_declaration()
        } else if self.match_kind(TokenKind::Fun) {
            self.function("function").map(Stmt::Function)
        } else if self.match_kind(TokenKind::Var) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    /// classDecl → "class" IDENT ( "<" IDENT )? "{" function* "}"
    fn class_declaration(&mut self) -> Option<Stmt> {
        let (name, span) = self.expect_ident("Expect class name.")?;

        let superclass = if self.match_kind(TokenKind::Lt) {
            let (super_name, super_span) = self.expect_ident("Expect superclass name.")?;
            Some(VariableExpr {
                id: self.next_id(),
                name: super_name,
                span: super_span,
            })
        } else {
            None
        };

        self.expect(TokenKind::LBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.expect(TokenKind::RBrace, "Expect '}' after class body.")?;

        Some(Stmt::Class(ClassStmt {
            name,
            span,
            superclass,
            methods,
        }))
    }

    /// function → IDENT "(" params? ")" block
    ///
    /// `kind` is "function" or "method", used only in error messages.
    fn function(&mut self, kind: &str) -> Option<Rc<FunctionDecl>> {
        let (name, span) = self.expect_ident(&format!("Expect {} name.", kind))?;
        self.expect(
            TokenKind::LParen,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                if params.len() >= 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                }
                let (param_name, param_span) = self.expect_ident("Expect parameter name.")?;
                params.push(Param {
                    name: param_name,
                    span: param_span,
                });
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "Expect ')' after parameters.")?;

        self.expect(
            TokenKind::LBrace,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body = self.block()?;

        Some(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span,
        }))
    }

    /// varDecl → "var" IDENT ( "=" expression )? ";"
    fn var_declaration(&mut self) -> Option<Stmt> {
        let (name, span) = self.expect_ident("Expect variable name.")?;

        let initializer = if self.match_kind(TokenKind::Eq) {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;

        Some(Stmt::Var(VarStmt {
            name,
            initializer,
            span,
        }))
    }

    /// statement → exprStmt | printStmt | block | ifStmt | whileStmt
    ///           | forStmt | returnStmt
    fn statement(&mut self) -> Option<Stmt> {
        if self.match_kind(TokenKind::For) {
            self.for_statement()
        } else if self.match_kind(TokenKind::If) {
            self.if_statement()
        } else if self.match_kind(TokenKind::Print) {
            self.print_statement()
        } else if self.match_kind(TokenKind::Return) {
            self.return_statement()
        } else if self.match_kind(TokenKind::While) {
            self.while_statement()
        } else if self.match_kind(TokenKind::LBrace) {
            Some(Stmt::Block(BlockStmt {
                statements: self.block()?,
            }))
        } else {
            self.expression_statement()
        }
    }

    /// forStmt → "for" "(" ( varDecl | exprStmt | ";" )
    ///                     expression? ";" expression? ")" statement
    ///
    /// Desugared at parse time:
    /// `for (init; cond; inc) body` becomes
    /// `{ init; while (cond) { body; inc; } }`, with a literal `true`
    /// condition when omitted.
    fn for_statement(&mut self) -> Option<Stmt> {
        let for_span = self.previous().span;
        self.expect(TokenKind::LParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_kind(TokenKind::Semicolon) {
            None
        } else if self.match_kind(TokenKind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(TokenKind::RParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::RParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockStmt {
                statements: vec![body, Stmt::Expr(ExprStmt { expr: increment })],
            });
        }

        let condition = condition.unwrap_or_else(|| {
            Expr::Literal(LiteralExpr {
                id: self.next_id(),
                value: LiteralValue::Bool(true),
                span: for_span,
            })
        });
        body = Stmt::While(WhileStmt {
            condition,
            body: Box::new(body),
        });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockStmt {
                statements: vec![initializer, body],
            });
        }

        Some(body)
    }

    /// ifStmt → "if" "(" expression ")" statement ( "else" statement )?
    fn if_statement(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
        }))
    }

    /// printStmt → "print" expression ";"
    fn print_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
        Some(Stmt::Print(PrintStmt { expr }))
    }

    /// returnStmt → "return" expression? ";"
    fn return_statement(&mut self) -> Option<Stmt> {
        let span = self.previous().span;
        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return(ReturnStmt { value, span }))
    }

    /// whileStmt → "while" "(" expression ")" statement
    fn while_statement(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::LParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.expect(TokenKind::RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Some(Stmt::While(WhileStmt { condition, body }))
    }

    /// block → "{" declaration* "}"
    ///
    /// The opening brace has already been consumed. Recovers inside the
    /// block so one bad statement does not swallow the rest.
    pub(crate) fn block(&mut self) -> Option<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.declaration() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }

        self.expect(TokenKind::RBrace, "Expect '}' after block.")?;
        Some(statements)
    }

    /// exprStmt → expression ";"
    fn expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expr(ExprStmt { expr }))
    }
}
