use std::fmt::Display;

/// Byte offset into the original source, used for diagnostics.
pub type Position = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TokenKind {
    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Assign,
    // arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    // comparison
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // logical
    And,
    Or,
    Not,
    // keywords
    If,
    Elif,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Def,
    Boolean,
    // literals
    Identifier,
    Number,
    Float,
    String,
    // framing
    Newline,
    Indent,
    Dedent,
    Eof,
    // error markers
    IllegalCharacter,
    InvalidIdentifier,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<String>,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: Option<String>, pos: Position) -> Self {
        Self { kind, literal, pos }
    }

    pub fn text(&self) -> &str {
        self.literal.as_deref().unwrap_or("")
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.literal {
            Some(lit) => write!(f, "{:?}({lit})", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}
