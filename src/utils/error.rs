//! Error handling for the semantic core

use crate::utils::Position;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Semantic error. Every check fails fast, so a compilation unit reports at
/// most one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ==================== Declaration Errors ====================

    #[error("Undefined type: '{name}' is never declared")]
    UndefinedType { name: String, position: Position },

    #[error("Cyclic inheritance: struct '{name}' is its own ancestor")]
    CyclicInheritance { name: String, position: Position },

    #[error("Invalid parent: struct '{name}' cannot inherit from '{parent}'")]
    InvalidParent {
        name: String,
        parent: String,
        position: Position,
    },

    #[error("Duplicate declaration: {what} '{name}' is declared more than once")]
    DuplicateDeclaration {
        what: &'static str,
        name: String,
        position: Position,
    },

    #[error("Invalid override of method '{method}': {reason}")]
    InvalidOverride {
        method: String,
        reason: String,
        position: Position,
    },

    #[error("Struct '{name}' is missing its {form}")]
    MissingDeclarationForm {
        name: String,
        form: &'static str,
        position: Position,
    },

    // ==================== Type Errors ====================

    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String, position: Position },

    #[error("Invalid access: {message}")]
    InvalidAccess { message: String, position: Position },

    #[error("Undefined symbol: {name}")]
    UndefinedSymbol { name: String, position: Position },
}

impl Error {
    /// Get the position of the token that triggered this error
    pub fn position(&self) -> Position {
        match self {
            Self::UndefinedType { position, .. }
            | Self::CyclicInheritance { position, .. }
            | Self::InvalidParent { position, .. }
            | Self::DuplicateDeclaration { position, .. }
            | Self::InvalidOverride { position, .. }
            | Self::MissingDeclarationForm { position, .. }
            | Self::TypeMismatch { position, .. }
            | Self::InvalidAccess { position, .. }
            | Self::UndefinedSymbol { position, .. } => *position,
        }
    }

    /// Stable error code used in structured reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::UndefinedType { .. } => "E0001",
            Self::CyclicInheritance { .. } => "E0002",
            Self::InvalidParent { .. } => "E0003",
            Self::DuplicateDeclaration { .. } => "E0004",
            Self::InvalidOverride { .. } => "E0005",
            Self::MissingDeclarationForm { .. } => "E0006",
            Self::TypeMismatch { .. } => "E0007",
            Self::InvalidAccess { .. } => "E0008",
            Self::UndefinedSymbol { .. } => "E0009",
        }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>, position: Position) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn invalid_access(message: impl Into<String>, position: Position) -> Self {
        Self::InvalidAccess {
            message: message.into(),
            position,
        }
    }
}
