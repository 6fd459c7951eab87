//! Token definitions for the Lox language.

use loxi_util::{Span, Symbol};

/// The kind of a lexical token, with any literal payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind {
    // Single-character tokens
    /// "("
    LParen,
    /// ")"
    RParen,
    /// "{"
    LBrace,
    /// "}"
    RBrace,
    /// ","
    Comma,
    /// "."
    Dot,
    /// "-"
    Minus,
    /// "+"
    Plus,
    /// ";"
    Semicolon,
    /// "/"
    Slash,
    /// "*"
    Star,

    // One or two character tokens
    /// "!"
    Not,
    /// "!="
    NotEq,
    /// "="
    Eq,
    /// "=="
    EqEq,
    /// ">"
    Gt,
    /// ">="
    GtEq,
    /// "<"
    Lt,
    /// "<="
    LtEq,

    // Literals
    /// Identifier (variable, function, class, or property name)
    Ident(Symbol),
    /// String literal; the payload is the decoded content without quotes
    Str(Symbol),
    /// Number literal, always an IEEE-754 double
    Number(f64),

    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    /// End of input
    Eof,
}

impl TokenKind {
    /// The canonical source text of this token, used in `at '<lexeme>'`
    /// error context. String literals are re-quoted; numbers are formatted
    /// from their value.
    pub fn lexeme(&self) -> String {
        match self {
            TokenKind::LParen => "(".to_owned(),
            TokenKind::RParen => ")".to_owned(),
            TokenKind::LBrace => "{".to_owned(),
            TokenKind::RBrace => "}".to_owned(),
            TokenKind::Comma => ",".to_owned(),
            TokenKind::Dot => ".".to_owned(),
            TokenKind::Minus => "-".to_owned(),
            TokenKind::Plus => "+".to_owned(),
            TokenKind::Semicolon => ";".to_owned(),
            TokenKind::Slash => "/".to_owned(),
            TokenKind::Star => "*".to_owned(),
            TokenKind::Not => "!".to_owned(),
            TokenKind::NotEq => "!=".to_owned(),
            TokenKind::Eq => "=".to_owned(),
            TokenKind::EqEq => "==".to_owned(),
            TokenKind::Gt => ">".to_owned(),
            TokenKind::GtEq => ">=".to_owned(),
            TokenKind::Lt => "<".to_owned(),
            TokenKind::LtEq => "<=".to_owned(),
            TokenKind::Ident(name) => name.as_str().to_owned(),
            TokenKind::Str(content) => format!("\"{}\"", content),
            TokenKind::Number(value) => format!("{}", value),
            TokenKind::And => "and".to_owned(),
            TokenKind::Class => "class".to_owned(),
            TokenKind::Else => "else".to_owned(),
            TokenKind::False => "false".to_owned(),
            TokenKind::Fun => "fun".to_owned(),
            TokenKind::For => "for".to_owned(),
            TokenKind::If => "if".to_owned(),
            TokenKind::Nil => "nil".to_owned(),
            TokenKind::Or => "or".to_owned(),
            TokenKind::Print => "print".to_owned(),
            TokenKind::Return => "return".to_owned(),
            TokenKind::Super => "super".to_owned(),
            TokenKind::This => "this".to_owned(),
            TokenKind::True => "true".to_owned(),
            TokenKind::Var => "var".to_owned(),
            TokenKind::While => "while".to_owned(),
            TokenKind::Eof => String::new(),
        }
    }

    /// Whether this is the end-of-input marker.
    pub fn is_eof(&self) -> bool {
        matches!(self, TokenKind::Eof)
    }
}

/// Maps identifier text to a keyword token, if it is one.
pub fn keyword_from_ident(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "fun" => TokenKind::Fun,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

/// A token together with its source location.
///
/// The raw lexeme of any token is `&source[token.span.start..token.span.end]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
