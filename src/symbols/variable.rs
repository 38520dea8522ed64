//! Attribute, local variable and parameter records

use crate::frontend::token::Token;
use crate::types::Type;

/// An attribute of a struct or a local variable of a method
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub(crate) token: Token,
    /// Declaring struct, or `Struct.method` / `start` for locals
    pub(crate) owner: String,
    pub(crate) ty: Type,
    pub(crate) private: bool,
    pub(crate) position: usize,
    pub(crate) inherited: bool,
}

impl Variable {
    pub fn new(token: Token, owner: impl Into<String>, ty: Type, private: bool, position: usize) -> Self {
        Self {
            token,
            owner: owner.into(),
            ty,
            private,
            position,
            inherited: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.token.lexeme
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Slot index
    pub fn position(&self) -> usize {
        self.position
    }

    /// True when the slot was propagated from an ancestor
    pub fn is_inherited(&self) -> bool {
        self.inherited
    }
}

/// A formal parameter. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    token: Token,
    ty: Type,
    position: usize,
}

impl Param {
    pub fn new(token: Token, ty: Type, position: usize) -> Self {
        Self { token, ty, position }
    }

    pub fn name(&self) -> &str {
        &self.token.lexeme
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
