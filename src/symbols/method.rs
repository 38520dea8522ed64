//! Method records

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::frontend::token::Token;
use crate::symbols::variable::{Param, Variable};
use crate::types::Type;
use crate::utils::{Error, Result};

/// How a method was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// The program entry method
    Start,
    /// The single constructor of a struct
    Constructor,
    #[default]
    Instance,
    Static,
}

/// A method, constructor or the entry method
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub(crate) token: Token,
    pub(crate) owner: Option<String>,
    pub(crate) kind: MethodKind,
    pub(crate) params: Vec<Param>,
    pub(crate) return_type: Type,
    pub(crate) position: usize,
    pub(crate) locals: HashMap<String, Variable>,
}

impl Method {
    pub fn new(token: Token, owner: Option<String>, kind: MethodKind, return_type: Type, position: usize) -> Self {
        Self {
            token,
            owner,
            kind,
            params: Vec::new(),
            return_type,
            position,
            locals: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.token.lexeme
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Declaring struct; `None` for the entry method
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    /// `start` has no receiver either, so it counts as static
    pub fn is_static(&self) -> bool {
        matches!(self.kind, MethodKind::Static | MethodKind::Start)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    /// Dispatch slot
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn local(&self, name: &str) -> Option<&Variable> {
        self.locals.get(name)
    }

    /// Locals ordered by slot
    pub fn locals(&self) -> Vec<&Variable> {
        let mut locals: Vec<&Variable> = self.locals.values().collect();
        locals.sort_by_key(|v| v.position);
        locals
    }

    /// Ordered parameter types
    pub fn signature(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty().clone()).collect()
    }

    /// Scope name used as the owner of locals
    pub fn scope_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}.{}", owner, self.name()),
            None => self.name().to_string(),
        }
    }

    pub(crate) fn add_param(&mut self, token: Token, ty: Type) -> Result<()> {
        if self.param(&token.lexeme).is_some() {
            return Err(Error::DuplicateDeclaration {
                what: "parameter",
                name: token.lexeme.clone(),
                position: token.position(),
            });
        }
        let position = self.params.len();
        self.params.push(Param::new(token, ty, position));
        Ok(())
    }

    pub(crate) fn add_local(&mut self, token: Token, ty: Type) -> Result<()> {
        if self.locals.contains_key(&token.lexeme) || self.param(&token.lexeme).is_some() {
            return Err(Error::DuplicateDeclaration {
                what: "local variable",
                name: token.lexeme.clone(),
                position: token.position(),
            });
        }
        let owner = self.scope_name();
        let position = self.locals.len();
        self.locals
            .insert(token.lexeme.clone(), Variable::new(token, owner, ty, false, position));
        Ok(())
    }
}
