//! Token definitions
//!
//! Tokens are produced by the lexer and carried through the parser into the
//! semantic core, where they anchor declarations and diagnostics.

use serde::{Deserialize, Serialize};

use crate::utils::Position;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    /// Token for a pre-registered declaration
    pub fn builtin(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self::new(kind, lexeme, 0, 0)
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // ============ Keywords ============
    /// struct
    Struct,
    /// impl
    Impl,
    /// fn
    Fn,
    /// start
    Start,
    /// st (static)
    St,
    /// pri (private)
    Pri,
    /// self
    SelfValue,
    /// new
    New,
    /// if
    If,
    /// else
    Else,
    /// while
    While,
    /// ret
    Ret,
    /// true
    True,
    /// false
    False,
    /// nil
    Nil,

    // ============ Type names ============
    /// Int
    IntType,
    /// Str
    StrType,
    /// Char
    CharType,
    /// Bool
    BoolType,
    /// Array
    ArrayType,
    /// void
    VoidType,

    // ============ Identifiers and Literals ============
    /// Struct identifier (starts with an uppercase letter)
    StructId,
    /// Object identifier (variables, attributes, methods)
    ObjectId,
    /// Integer literal
    IntLit,
    /// String literal
    StrLit,
    /// Character literal
    CharLit,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// !
    Not,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// ==
    EqEq,
    /// !=
    Ne,
    /// <
    Lt,
    /// <=
    Le,
    /// >
    Gt,
    /// >=
    Ge,
    /// =
    Assign,

    // ============ Delimiters ============
    /// . (also introduces a constructor declaration)
    Dot,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,
    /// ->
    Arrow,
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
}

impl TokenKind {
    /// Try to convert an identifier to a built-in type name
    pub fn type_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "Int" => Some(TokenKind::IntType),
            "Str" => Some(TokenKind::StrType),
            "Char" => Some(TokenKind::CharType),
            "Bool" => Some(TokenKind::BoolType),
            "Array" => Some(TokenKind::ArrayType),
            _ => None,
        }
    }
}
