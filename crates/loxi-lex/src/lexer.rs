//! The Lox scanner.
//!
//! Produces tokens on demand via [`Lexer::next_token`], or lazily through
//! the `Iterator` impl, which yields every token including the final
//! [`TokenKind::Eof`] and then fuses.

use loxi_util::{Handler, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// The lexer for Lox source code.
///
/// Errors (unexpected characters, unterminated strings) are reported to
/// the handler and scanning continues with the next character, so a single
/// pass surfaces every lexical problem in the input.
pub struct Lexer<'a> {
    /// Character cursor over the source.
    cursor: Cursor<'a>,

    /// Diagnostic sink.
    handler: &'a Handler,

    /// Start byte offset of the token being scanned.
    token_start: usize,

    /// Line where the current token starts (1-based).
    token_start_line: u32,

    /// Column where the current token starts (1-based).
    token_start_column: u32,

    /// Whether the Eof token has been handed out by the iterator.
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source` reporting errors to `handler`.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            emitted_eof: false,
        }
    }

    /// Scans and returns the next token.
    ///
    /// Whitespace and `//` comments are skipped. At end of input this
    /// returns an [`TokenKind::Eof`] token whose span is the empty range
    /// after the last character; callers may keep calling and will keep
    /// receiving `Eof`.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace_and_comments();

            self.token_start = self.cursor.position();
            self.token_start_line = self.cursor.line();
            self.token_start_column = self.cursor.column();

            if self.cursor.is_at_end() {
                return Token::new(TokenKind::Eof, self.token_span());
            }

            let kind = match self.cursor.current_char() {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                '-' => self.single(TokenKind::Minus),
                '+' => self.single(TokenKind::Plus),
                ';' => self.single(TokenKind::Semicolon),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '!' => self.one_or_two(TokenKind::Not, TokenKind::NotEq),
                '=' => self.one_or_two(TokenKind::Eq, TokenKind::EqEq),
                '<' => self.one_or_two(TokenKind::Lt, TokenKind::LtEq),
                '>' => self.one_or_two(TokenKind::Gt, TokenKind::GtEq),
                '"' => self.lex_string(),
                c if c.is_ascii_digit() => self.lex_number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(),
                _ => {
                    self.report_here("Unexpected character.");
                    self.cursor.advance();
                    continue;
                }
            };

            return Token::new(kind, self.token_span());
        }
    }

    /// Consumes one character and returns `kind`.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.cursor.advance();
        kind
    }

    /// Consumes the current character, then `=` if present, picking the
    /// two-character kind on a match.
    fn one_or_two(&mut self, short: TokenKind, long: TokenKind) -> TokenKind {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            long
        } else {
            short
        }
    }

    /// Lexes a string literal.
    ///
    /// Lox strings may span lines and have no escape sequences; the token
    /// payload is the text between the quotes, verbatim.
    fn lex_string(&mut self) -> TokenKind {
        self.cursor.advance(); // opening quote
        let content_start = self.cursor.position();

        loop {
            if self.cursor.is_at_end() {
                self.report_here("Unterminated string.");
                let content = self.cursor.slice_from(content_start);
                return TokenKind::Str(Symbol::intern(content));
            }
            if self.cursor.current_char() == '"' {
                let content = self.cursor.slice_from(content_start);
                let symbol = Symbol::intern(content);
                self.cursor.advance(); // closing quote
                return TokenKind::Str(symbol);
            }
            self.cursor.advance();
        }
    }

    /// Lexes a number literal: digits, optionally followed by `.` and more
    /// digits. A trailing `.` without a digit after it is left for the
    /// next token.
    fn lex_number(&mut self) -> TokenKind {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && self.cursor.char_at(1).is_ascii_digit() {
            self.cursor.advance(); // '.'
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let text = self.cursor.slice_from(self.token_start);
        // A run of digits with at most one interior dot always parses.
        let value = text.parse::<f64>().unwrap_or(0.0);
        TokenKind::Number(value)
    }

    /// Lexes an identifier or keyword.
    fn lex_identifier(&mut self) -> TokenKind {
        while {
            let c = self.cursor.current_char();
            c.is_ascii_alphanumeric() || c == '_'
        } {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);
        keyword_from_ident(text).unwrap_or_else(|| TokenKind::Ident(Symbol::intern(text)))
    }

    /// Skips whitespace and `//` line comments. Newlines advance the line
    /// counter inside the cursor.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' | '\n' => self.cursor.advance(),
                '/' if self.cursor.char_at(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Span of the token currently being scanned.
    fn token_span(&self) -> Span {
        Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Reports an error at the cursor's current location.
    fn report_here(&mut self, message: &str) {
        let span = Span::point(
            self.cursor.position(),
            self.cursor.line(),
            self.cursor.column(),
        );
        self.handler.error(message, span);
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind.is_eof() {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Lexes an entire source buffer, returning every token including the
/// trailing `Eof`.
pub fn tokenize(source: &str, handler: &Handler) -> Vec<Token> {
    Lexer::new(source, handler).collect()
}
