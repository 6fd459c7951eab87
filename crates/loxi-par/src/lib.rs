//! loxi-par - Recursive-descent parser for Lox.
//!
//! Consumes the token stream from `loxi-lex` and produces the statement
//! list defined in [`ast`]. The parser is predictive with one token of
//! lookahead, mirroring the grammar:
//!
//! ```text
//! program        → declaration* EOF
//! declaration    → classDecl | funDecl | varDecl | statement
//! statement      → exprStmt | printStmt | block | ifStmt
//!                | whileStmt | forStmt | returnStmt
//! expression     → assignment
//! assignment     → ( call "." )? IDENT "=" assignment | logic_or
//! ...
//! ```
//!
//! Errors are reported to the diagnostic handler and recovery
//! synchronises to the next statement boundary, so one run reports as
//! many syntax errors as possible and parsing never unwinds past the
//! top-level loop.

mod ast;
mod expr;
mod stmt;

pub use ast::*;

use loxi_lex::{Token, TokenKind};
use loxi_util::{Handler, NodeId, NodeIdGenerator, Span};

/// The Lox parser.
pub struct Parser<'a> {
    /// Token stream, always terminated by `Eof`.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,

    /// Error sink.
    handler: &'a Handler,

    /// Source of expression node identities.
    ids: &'a NodeIdGenerator,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens`.
    ///
    /// The stream is expected to end with an `Eof` token (as produced by
    /// [`loxi_lex::tokenize`]); one is appended if missing so lookahead
    /// never runs off the end.
    pub fn new(mut tokens: Vec<Token>, handler: &'a Handler, ids: &'a NodeIdGenerator) -> Self {
        let needs_eof = !matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        );
        if needs_eof {
            let span = tokens
                .last()
                .map(|t| Span::point(t.span.end, t.span.line, t.span.column))
                .unwrap_or(Span::new(0, 0, 1, 1));
            tokens.push(Token::new(TokenKind::Eof, span));
        }

        Self {
            tokens,
            position: 0,
            handler,
            ids,
        }
    }

    /// Parses a complete program.
    ///
    /// On a syntax error the parser reports it, discards tokens up to the
    /// next statement boundary, and continues with the following
    /// declaration.
    pub fn parse(&mut self) -> Ast {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }

        statements
    }

    // =========================================================================
    // Token stream helpers
    // =========================================================================

    /// The token at the current position.
    pub(crate) fn current(&self) -> Token {
        self.tokens[self.position]
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> Token {
        self.tokens[self.position.saturating_sub(1)]
    }

    /// Whether the current token is `Eof`.
    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind.is_eof()
    }

    /// Consumes and returns the current token. Does not move past `Eof`.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    /// Whether the current token has the given kind.
    ///
    /// Only meaningful for payload-free kinds; literal tokens are matched
    /// by pattern where they are consumed.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or reports `message` at the
    /// current token.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            return Some(self.advance());
        }
        self.error_at_current(message);
        None
    }

    /// Consumes an identifier token or reports `message`.
    pub(crate) fn expect_ident(&mut self, message: &str) -> Option<(loxi_util::Symbol, Span)> {
        if let TokenKind::Ident(name) = self.current().kind {
            let span = self.current().span;
            self.advance();
            return Some((name, span));
        }
        self.error_at_current(message);
        None
    }

    /// Fresh identity for the node being built.
    pub(crate) fn next_id(&self) -> NodeId {
        self.ids.next_id()
    }

    // =========================================================================
    // Error reporting and recovery
    // =========================================================================

    /// Reports an error at the current token.
    pub(crate) fn error_at_current(&self, message: &str) {
        self.error_at(self.current(), message);
    }

    /// Reports an error at a specific token, using " at end" for `Eof`
    /// and " at '<lexeme>'" otherwise.
    pub(crate) fn error_at(&self, token: Token, message: &str) {
        let at = if token.kind.is_eof() {
            "end".to_owned()
        } else {
            format!("'{}'", token.kind.lexeme())
        };
        self.handler.error_at(at, message, token.span);
    }

    /// Discards tokens until a likely statement boundary: just past a
    /// `;`, or in front of a keyword that starts a statement.
    pub(crate) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenKind::Semicolon) {
                return;
            }

            match self.current().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
