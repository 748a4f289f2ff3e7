use std::collections::HashMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,

    Identifier,
    Number,
    String,

    // Keywords
    Var,
    Const,
    Let,
    True,
    False,
    Return,
    For,
    While,
    If,
    Else,
    Function,
    Null,
    Undefined,
    Throw,
    New,
    This,
    Super,

    // Operators
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    Equal,
    NotEqual,
    StrictEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Punctuation
    Comma,
    Colon,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("var", TokenKind::Var);
    m.insert("const", TokenKind::Const);
    m.insert("let", TokenKind::Let);
    m.insert("true", TokenKind::True);
    m.insert("false", TokenKind::False);
    m.insert("return", TokenKind::Return);
    m.insert("for", TokenKind::For);
    m.insert("while", TokenKind::While);
    m.insert("if", TokenKind::If);
    m.insert("else", TokenKind::Else);
    m.insert("function", TokenKind::Function);
    m.insert("null", TokenKind::Null);
    m.insert("undefined", TokenKind::Undefined);
    m.insert("throw", TokenKind::Throw);
    m.insert("new", TokenKind::New);
    m.insert("this", TokenKind::This);
    m.insert("super", TokenKind::Super);
    m
});

/// Maps an identifier literal to its keyword kind, if it is one.
pub fn lookup_keyword(literal: &str) -> Option<TokenKind> {
    KEYWORDS.get(literal).copied()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: u32,
    pub col: u32,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: u32, col: u32) -> Self {
        Token {
            kind,
            literal: literal.into(),
            line,
            col,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
