//! Type checking of method bodies
//!
//! Runs after consolidation, one method body at a time. Every expression
//! node gets its result type stored; the first violation aborts.

use std::collections::BTreeSet;

use log::trace;

use crate::frontend::ast::*;
use crate::frontend::token::{Token, TokenKind};
use crate::stdlib::builtins::ROOT;
use crate::symbols::method::Method;
use crate::symbols::structure::{AttributeLookup, Struct};
use crate::symbols::table::SymbolTable;
use crate::types::{PrimitiveType, Type};
use crate::utils::{Error, Result};

/// Value a chain link hands to the next link
#[derive(Debug, Clone, PartialEq)]
enum Receiver {
    Instance(Type),
    /// A struct name used for static calls
    Static(String),
}

impl Receiver {
    fn ty(&self) -> Type {
        match self {
            Receiver::Instance(ty) => ty.clone(),
            Receiver::Static(name) => Type::Struct(name.clone()),
        }
    }
}

/// Checks the bodies of one method against a consolidated table
pub struct TypeChecker<'a> {
    table: &'a SymbolTable,
    current_struct: Option<&'a Struct>,
    method: &'a Method,
    instantiated: BTreeSet<String>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(table: &'a SymbolTable, method: &'a Method) -> Self {
        Self {
            table,
            current_struct: method.owner().and_then(|owner| table.get_struct(owner)),
            method,
            instantiated: BTreeSet::new(),
        }
    }

    /// Structs created by `new` in the checked bodies
    pub fn into_instantiated(self) -> BTreeSet<String> {
        self.instantiated
    }

    pub fn check_block(&mut self, block: &mut Block) -> Result<()> {
        for sentence in &mut block.sentences {
            self.check_sentence(sentence)?;
        }
        Ok(())
    }

    pub fn check_sentence(&mut self, sentence: &mut Sentence) -> Result<()> {
        match sentence {
            Sentence::Block(block) => self.check_block(block),
            Sentence::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition)?;
                self.check_sentence(then_branch)?;
                match else_branch {
                    Some(otherwise) => self.check_sentence(otherwise),
                    None => Ok(()),
                }
            }
            Sentence::Loop { condition, body, .. } => {
                self.check_condition(condition)?;
                self.check_sentence(body)
            }
            Sentence::Assignment { target, token, value } => self.check_assignment(target, token, value),
            Sentence::Return { token, value } => self.check_return(token, value.as_mut()),
            Sentence::Expression(expression) => self.check_expression(expression).map(|_| ()),
        }
    }

    fn check_condition(&mut self, condition: &mut Expression) -> Result<()> {
        let ty = self.check_expression(condition)?;
        if !ty.is_bool() {
            return Err(Error::type_mismatch(
                format!("condition not boolean, found {}", ty),
                condition.position(),
            ));
        }
        Ok(())
    }

    fn check_assignment(&mut self, target: &mut Primary, token: &Token, value: &mut Expression) -> Result<()> {
        let last = target.last_link();
        let assignable = match last.kind {
            PrimaryKind::SimpleAccess => last.token.kind == TokenKind::ObjectId,
            PrimaryKind::ArrayAccess { .. } => true,
            _ => false,
        };
        if !assignable {
            return Err(Error::invalid_access(
                format!("'{}' cannot be assigned to", last.token.lexeme),
                last.token.position(),
            ));
        }

        let target_type = self.check_primary(target, None)?;
        let value_type = self.check_expression(value)?;
        if !self.table.is_assignable(&value_type, &target_type) {
            return Err(Error::type_mismatch(
                format!("cannot assign {} to {}", value_type, target_type),
                token.position(),
            ));
        }
        Ok(())
    }

    fn check_return(&mut self, token: &Token, value: Option<&mut Expression>) -> Result<()> {
        let expected = self.method.return_type();
        match (value, expected) {
            (None, Type::Void) => Ok(()),
            (Some(_), Type::Void) => Err(Error::type_mismatch(
                format!("'{}' returns void but a value is returned", self.method.name()),
                token.position(),
            )),
            (None, expected) => Err(Error::type_mismatch(
                format!("'{}' must return a value of type {}", self.method.name(), expected),
                token.position(),
            )),
            (Some(value), expected) => {
                let found = self.check_expression(value)?;
                if !self.table.is_assignable(&found, expected) {
                    return Err(Error::type_mismatch(
                        format!("returned {} where {} is expected", found, expected),
                        value.position(),
                    ));
                }
                Ok(())
            }
        }
    }

    // ==================== Expressions ====================

    pub fn check_expression(&mut self, expression: &mut Expression) -> Result<Type> {
        match expression {
            Expression::Primary(primary) => self.check_primary(primary, None),
            Expression::Unary(unary) => self.check_unary(unary),
            Expression::Binary(binary) => self.check_binary(binary),
        }
    }

    fn check_unary(&mut self, unary: &mut UnaryExpression) -> Result<Type> {
        let position = unary.operator.position();
        let symbol = unary.operator.lexeme.clone();
        let op = UnaryOperator::from_kind(unary.operator.kind)
            .ok_or_else(|| Error::type_mismatch(format!("'{}' is not a unary operator", symbol), position))?;

        let operand = &mut unary.operand;
        if !matches!(operand.kind, PrimaryKind::SimpleAccess) || operand.chain.is_some() {
            return Err(Error::type_mismatch(
                format!("operand of '{}' must be a simple access", symbol),
                position,
            ));
        }
        let ty = self.check_primary(operand, None)?;
        if ty.is_array() {
            return Err(Error::type_mismatch(
                format!("operand of '{}' cannot be an array", symbol),
                position,
            ));
        }

        let result = match op {
            UnaryOperator::Increment | UnaryOperator::Decrement => {
                if ty.is_literal() {
                    return Err(Error::type_mismatch(
                        format!("'{}' cannot be applied to a literal", symbol),
                        position,
                    ));
                }
                if !ty.is_int() {
                    return Err(Error::type_mismatch(format!("'{}' expects Int, found {}", symbol, ty), position));
                }
                Type::INT
            }
            UnaryOperator::Not => {
                if !ty.is_bool() {
                    return Err(Error::type_mismatch(format!("'!' expects Bool, found {}", ty), position));
                }
                Type::BOOL
            }
            UnaryOperator::Plus | UnaryOperator::Minus => {
                if !ty.is_int() {
                    return Err(Error::type_mismatch(format!("'{}' expects Int, found {}", symbol, ty), position));
                }
                ty
            }
        };
        trace!("unary '{}' at {} : {}", symbol, position, result);
        unary.result_type = Some(result.clone());
        Ok(result)
    }

    fn check_binary(&mut self, binary: &mut BinaryExpression) -> Result<Type> {
        let position = binary.operator.position();
        let symbol = binary.operator.lexeme.clone();
        let op = BinaryOperator::from_kind(binary.operator.kind)
            .ok_or_else(|| Error::type_mismatch(format!("'{}' is not a binary operator", symbol), position))?;

        let left = self.check_expression(&mut binary.left)?;
        let right = self.check_expression(&mut binary.right)?;
        let mismatch = || {
            Error::type_mismatch(
                format!("'{}' cannot be applied to {} and {}", symbol, left, right),
                position,
            )
        };

        let result = match op {
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
                if !(left.is_int() && right.is_int()) {
                    return Err(mismatch());
                }
                Type::INT
            }
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                if !(left.is_int() && right.is_int()) {
                    return Err(mismatch());
                }
                Type::BOOL
            }
            BinaryOperator::And | BinaryOperator::Or => {
                if !(left.is_bool() && right.is_bool()) {
                    return Err(mismatch());
                }
                Type::BOOL
            }
            BinaryOperator::Eq | BinaryOperator::Ne => {
                let (l, r) = (left.unliteral(), right.unliteral());
                if !(self.table.is_assignable(&l, &r) || self.table.is_assignable(&r, &l)) {
                    return Err(mismatch());
                }
                Type::BOOL
            }
        };
        trace!("binary '{}' at {} : {}", symbol, position, result);
        binary.result_type = Some(result.clone());
        Ok(result)
    }

    /// Check a chain link and everything after it; returns the chain type
    fn check_primary(&mut self, primary: &mut Primary, receiver: Option<&Receiver>) -> Result<Type> {
        let token = &primary.token;
        let link = match &mut primary.kind {
            PrimaryKind::SimpleAccess => self.check_access(token, receiver)?,
            PrimaryKind::MethodCall { args } => self.check_call(token, receiver, args)?,
            PrimaryKind::ArrayAccess { index } => {
                let base = self.check_access(token, receiver)?.ty();
                let Type::Array(element) = &base else {
                    return Err(Error::type_mismatch(
                        format!("'{}' is {}, not an array", token.lexeme, base),
                        token.position(),
                    ));
                };
                let index_type = self.check_expression(index)?;
                if !index_type.is_int() {
                    return Err(Error::type_mismatch(
                        format!("array index must be Int, found {}", index_type),
                        index.position(),
                    ));
                }
                Receiver::Instance(Type::Primitive(*element))
            }
            PrimaryKind::CreateInstance { args } => {
                Self::require_head(token, receiver)?;
                self.check_create_instance(token, args)?
            }
            PrimaryKind::CreateArray { dimension } => {
                Self::require_head(token, receiver)?;
                let element = PrimitiveType::from_name(&token.lexeme).ok_or_else(|| {
                    Error::type_mismatch(
                        format!("array elements must be primitive, found {}", token.lexeme),
                        token.position(),
                    )
                })?;
                let dimension_type = self.check_expression(dimension)?;
                if !dimension_type.is_int() {
                    return Err(Error::type_mismatch(
                        format!("array dimension must be Int, found {}", dimension_type),
                        dimension.position(),
                    ));
                }
                Receiver::Instance(Type::Array(element))
            }
            PrimaryKind::Parenthesized { expression } => {
                Self::require_head(token, receiver)?;
                Receiver::Instance(self.check_expression(expression)?)
            }
        };

        trace!("{} '{}' at {} : {}", primary.kind.name(), primary.token.lexeme, primary.token.position(), link.ty());
        primary.result_type = Some(link.ty());
        match &mut primary.chain {
            Some(next) => self.check_primary(next, Some(&link)),
            None => match link {
                Receiver::Static(name) => Err(Error::invalid_access(
                    format!("struct '{}' used as a value", name),
                    primary.token.position(),
                )),
                Receiver::Instance(ty) => Ok(ty),
            },
        }
    }

    /// Links that can only start a chain
    fn require_head(token: &Token, receiver: Option<&Receiver>) -> Result<()> {
        match receiver {
            None => Ok(()),
            Some(_) => Err(Error::invalid_access(
                format!("'{}' cannot follow '.'", token.lexeme),
                token.position(),
            )),
        }
    }

    fn check_access(&self, token: &Token, receiver: Option<&Receiver>) -> Result<Receiver> {
        let position = token.position();
        let Some(receiver) = receiver else {
            return self.check_head_access(token);
        };
        if token.kind != TokenKind::ObjectId {
            return Err(Error::invalid_access(
                format!("'{}' cannot follow '.'", token.lexeme),
                position,
            ));
        }
        match receiver {
            Receiver::Static(name) => Err(Error::invalid_access(
                format!("attribute '{}' of '{}' needs an instance", token.lexeme, name),
                position,
            )),
            Receiver::Instance(ty) => {
                let owner = self.member_struct(ty, token)?;
                self.visible_attribute(owner, token)
            }
        }
    }

    fn check_head_access(&self, token: &Token) -> Result<Receiver> {
        let position = token.position();
        let ty = match token.kind {
            TokenKind::IntLit => Type::Literal(PrimitiveType::Int),
            TokenKind::StrLit => Type::Literal(PrimitiveType::Str),
            TokenKind::CharLit => Type::Literal(PrimitiveType::Char),
            TokenKind::True | TokenKind::False => Type::BOOL,
            TokenKind::Nil => Type::Nil,
            TokenKind::SelfValue => {
                let owner = match self.current_struct {
                    Some(owner) if !self.method.is_static() => owner,
                    _ => {
                        return Err(Error::invalid_access(
                            format!("'self' cannot be used in static method '{}'", self.method.name()),
                            position,
                        ))
                    }
                };
                Type::Struct(owner.name().to_string())
            }
            TokenKind::ObjectId => return self.resolve_identifier(token),
            _ => {
                if self.table.contains_struct(&token.lexeme) {
                    return Ok(Receiver::Static(token.lexeme.clone()));
                }
                return Err(Error::UndefinedType {
                    name: token.lexeme.clone(),
                    position,
                });
            }
        };
        Ok(Receiver::Instance(ty))
    }

    /// Locals, then parameters, then attributes of the current struct
    fn resolve_identifier(&self, token: &Token) -> Result<Receiver> {
        let name = token.lexeme.as_str();
        if let Some(local) = self.method.local(name) {
            return Ok(Receiver::Instance(local.ty().clone()));
        }
        if let Some(param) = self.method.param(name) {
            return Ok(Receiver::Instance(param.ty().clone()));
        }
        match self.current_struct {
            Some(owner) if owner.attribute(name).is_some() => {
                if self.method.is_static() {
                    return Err(Error::invalid_access(
                        format!("attribute '{}' used in static method '{}'", name, self.method.name()),
                        token.position(),
                    ));
                }
                self.visible_attribute(owner, token)
            }
            _ => Err(Error::UndefinedSymbol {
                name: name.to_string(),
                position: token.position(),
            }),
        }
    }

    fn visible_attribute(&self, owner: &Struct, token: &Token) -> Result<Receiver> {
        let accessor = self.current_struct.map(Struct::name);
        match owner.lookup_attribute(&token.lexeme, accessor) {
            AttributeLookup::Visible(var) => Ok(Receiver::Instance(var.ty().clone())),
            AttributeLookup::Hidden(var) => Err(Error::invalid_access(
                format!("attribute '{}' is private to '{}'", token.lexeme, var.owner()),
                token.position(),
            )),
            AttributeLookup::Missing => Err(Error::UndefinedSymbol {
                name: format!("{}.{}", owner.name(), token.lexeme),
                position: token.position(),
            }),
        }
    }

    fn member_struct(&self, ty: &Type, token: &Token) -> Result<&'a Struct> {
        let name = ty.struct_name().ok_or_else(|| {
            Error::invalid_access(format!("{} has no member '{}'", ty, token.lexeme), token.position())
        })?;
        self.table.get_struct(name).ok_or_else(|| Error::UndefinedType {
            name: name.to_string(),
            position: token.position(),
        })
    }

    fn check_call(&mut self, token: &Token, receiver: Option<&Receiver>, args: &mut [Expression]) -> Result<Receiver> {
        let position = token.position();
        let (owner, static_only) = match receiver {
            None => match self.current_struct {
                Some(owner) => (owner, self.method.is_static()),
                None => {
                    return Err(Error::UndefinedSymbol {
                        name: token.lexeme.clone(),
                        position,
                    })
                }
            },
            Some(Receiver::Static(name)) => {
                let owner = self.table.get_struct(name).ok_or_else(|| Error::UndefinedType {
                    name: name.clone(),
                    position,
                })?;
                (owner, true)
            }
            Some(Receiver::Instance(ty)) => (self.member_struct(ty, token)?, false),
        };

        let method = owner.method(&token.lexeme).ok_or_else(|| Error::UndefinedSymbol {
            name: format!("{}.{}", owner.name(), token.lexeme),
            position,
        })?;
        if static_only && !method.is_static() {
            return Err(Error::invalid_access(
                format!("instance method '{}' of '{}' called without an instance", method.name(), owner.name()),
                position,
            ));
        }
        self.check_arguments(method, token, args)?;
        Ok(Receiver::Instance(method.return_type().clone()))
    }

    fn check_create_instance(&mut self, token: &Token, args: &mut [Expression]) -> Result<Receiver> {
        let name = token.lexeme.as_str();
        let target = self.table.get_struct(name).ok_or_else(|| Error::UndefinedType {
            name: name.to_string(),
            position: token.position(),
        })?;
        if target.is_builtin() && name != ROOT {
            return Err(Error::invalid_access(
                format!("built-in struct '{}' cannot be instantiated", name),
                token.position(),
            ));
        }
        match target.constructor() {
            Some(constructor) => self.check_arguments(constructor, token, args)?,
            None if !args.is_empty() => {
                return Err(Error::type_mismatch(
                    format!("constructor of '{}' takes no arguments, found {}", name, args.len()),
                    token.position(),
                ))
            }
            None => {}
        }
        self.instantiated.insert(name.to_string());
        Ok(Receiver::Instance(Type::Struct(name.to_string())))
    }

    fn check_arguments(&mut self, method: &Method, token: &Token, args: &mut [Expression]) -> Result<()> {
        let params = method.params();
        if params.len() != args.len() {
            return Err(Error::type_mismatch(
                format!(
                    "'{}' expects {} argument(s), found {}",
                    token.lexeme,
                    params.len(),
                    args.len()
                ),
                token.position(),
            ));
        }
        for (param, arg) in params.iter().zip(args.iter_mut()) {
            let found = self.check_expression(arg)?;
            if !self.table.is_assignable(&found, param.ty()) {
                return Err(Error::type_mismatch(
                    format!("argument '{}' expects {}, found {}", param.name(), param.ty(), found),
                    arg.position(),
                ));
            }
        }
        Ok(())
    }
}
