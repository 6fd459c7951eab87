//! loxi-lex - Lexical analysis for Lox source code.
//!
//! Transforms source text into a stream of [`Token`]s. The lexer works
//! with one character of lookahead (two for numeric fractions), skips
//! whitespace and `//` line comments, and reports bad input through the
//! shared diagnostic [`Handler`](loxi_util::Handler) without stopping.
//!
//! The token stream always terminates with a single [`TokenKind::Eof`]
//! token whose span is the empty range after the last character.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::{tokenize, Lexer};
pub use token::{keyword_from_ident, Token, TokenKind};
