use std::fmt;

use crate::diag::Position;
use crate::value;

/// Kinds of "words" produced by the lexer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // Operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Ident,
    String,
    Number,

    // Keywords
    And,
    Class,
    Else,
    Elif,
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

    Eof,
}

impl TokenKind {
    /// Upper-case name used by the token listing.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::LeftBrace => "LBRACE",
            TokenKind::RightBrace => "RBRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Minus => "MINUS",
            TokenKind::Plus => "PLUS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Slash => "SLASH",
            TokenKind::Star => "STAR",
            TokenKind::Bang => "NOT",
            TokenKind::BangEqual => "NOTEQ",
            TokenKind::Equal => "ASSIGN",
            TokenKind::EqualEqual => "EQ",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GEQ",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LEQ",
            TokenKind::Ident => "IDENT",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::And => "AND",
            TokenKind::Class => "CLASS",
            TokenKind::Else => "ELSE",
            TokenKind::Elif => "ELIF",
            TokenKind::False => "FALSE",
            TokenKind::Fun => "FN",
            TokenKind::For => "FOR",
            TokenKind::If => "IF",
            TokenKind::Nil => "NIL",
            TokenKind::Or => "OR",
            TokenKind::Print => "PRINT",
            TokenKind::Return => "RETURN",
            TokenKind::Super => "SUPER",
            TokenKind::This => "THIS",
            TokenKind::True => "TRUE",
            TokenKind::Var => "VAR",
            TokenKind::While => "WHILE",
            TokenKind::Eof => "EOF",
        }
    }

    /// Whether a token of this kind usually begins a statement.
    ///
    /// The parser resynchronises on these after an error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value attached to `NUMBER` and `STRING` tokens.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => f.write_str(&value::format_number(*n)),
            Literal::Str(s) => f.write_str(s),
        }
    }
}

/// A lexeme tagged with its kind and line.
///
/// The line is the one the lexeme ends on, so a multi-line string reports its closing line.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, literal: Option<Literal>, line: Position) -> Token {
        Token {
            kind,
            lexeme: lexeme.to_owned(),
            literal,
            line,
        }
    }

    pub fn eof(line: Position) -> Token {
        Token::new(TokenKind::Eof, "", None, line)
    }
}

/// Formats the token the way the driver lists it: `KIND LEXEME LITERAL`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(lit) => write!(f, "{} {} {}", self.kind, self.lexeme, lit),
            None => write!(f, "{} {} null", self.kind, self.lexeme),
        }
    }
}

const KEYWORDS: [(&str, TokenKind); 17] = [
    ("and", TokenKind::And),
    ("class", TokenKind::Class),
    ("else", TokenKind::Else),
    ("elif", TokenKind::Elif),
    ("false", TokenKind::False),
    ("for", TokenKind::For),
    ("fun", TokenKind::Fun),
    ("if", TokenKind::If),
    ("nil", TokenKind::Nil),
    ("or", TokenKind::Or),
    ("print", TokenKind::Print),
    ("return", TokenKind::Return),
    ("super", TokenKind::Super),
    ("this", TokenKind::This),
    ("true", TokenKind::True),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
];

/// Return the kind of the reserved word spelled `lexeme`, if any.
pub fn keyword(lexeme: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(name, _)| *name == lexeme)
        .map(|(_, kind)| *kind)
}
