//! Abstract Syntax Tree definitions
//!
//! This is the hand-off format between the parser and the semantic core.
//! Declarations carry their tokens; expression nodes carry a result type
//! slot that the type checker fills in.

use serde::{Deserialize, Serialize};

use crate::frontend::token::{Token, TokenKind};
use crate::symbols::method::MethodKind;
use crate::types::Type;
use crate::utils::Position;

/// A complete program (compilation unit)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level items, in source order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Struct(StructDef),
    Impl(ImplBlock),
    Start(StartDef),
}

/// `struct Name : Parent { attributes }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Token,
    #[serde(default)]
    pub parent: Option<Token>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

/// Attribute declaration; `pri` makes it private
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: Token,
    pub ty: Token,
    #[serde(default)]
    pub private: bool,
}

/// `impl Name { constructor and methods }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplBlock {
    pub name: Token,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

/// Method or constructor definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: Token,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub params: Vec<VarDef>,
    /// `None` means `void`
    #[serde(default)]
    pub return_type: Option<Token>,
    #[serde(default)]
    pub locals: Vec<VarDef>,
    #[serde(default)]
    pub body: Block,
}

/// `start { locals body }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDef {
    pub token: Token,
    #[serde(default)]
    pub locals: Vec<VarDef>,
    #[serde(default)]
    pub body: Block,
}

/// Typed name: a parameter or a local variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDef {
    pub name: Token,
    pub ty: Token,
}

/// Code block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub sentences: Vec<Sentence>,
}

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentence {
    Block(Block),
    /// if (condition) then [else otherwise]
    Conditional {
        token: Token,
        condition: Expression,
        then_branch: Box<Sentence>,
        #[serde(default)]
        else_branch: Option<Box<Sentence>>,
    },
    /// while (condition) body
    Loop {
        token: Token,
        condition: Expression,
        body: Box<Sentence>,
    },
    /// target = value;
    Assignment {
        target: Primary,
        token: Token,
        value: Expression,
    },
    /// ret [value];
    Return {
        token: Token,
        #[serde(default)]
        value: Option<Expression>,
    },
    /// Expression statement
    Expression(Expression),
}

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Primary(Primary),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
}

impl Expression {
    /// Type stored by the checker
    pub fn result_type(&self) -> Option<&Type> {
        match self {
            Expression::Primary(primary) => primary.chain_type(),
            Expression::Unary(unary) => unary.result_type.as_ref(),
            Expression::Binary(binary) => binary.result_type.as_ref(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Expression::Primary(primary) => primary.token.position(),
            Expression::Unary(unary) => unary.operator.position(),
            Expression::Binary(binary) => binary.operator.position(),
        }
    }
}

/// Prefix operator applied to a simple access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: Token,
    pub operand: Primary,
    #[serde(skip)]
    pub result_type: Option<Type>,
}

/// Infix operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: Token,
    pub right: Box<Expression>,
    #[serde(skip)]
    pub result_type: Option<Type>,
}

/// One link of an access chain such as `a.b.c()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primary {
    /// Identifier, literal, `self`, struct name, element type or `(`
    pub token: Token,
    #[serde(default)]
    pub kind: PrimaryKind,
    /// Next link, evaluated against this link's value
    #[serde(default)]
    pub chain: Option<Box<Primary>>,
    #[serde(skip)]
    pub result_type: Option<Type>,
}

impl Primary {
    pub fn new(token: Token, kind: PrimaryKind) -> Self {
        Self {
            token,
            kind,
            chain: None,
            result_type: None,
        }
    }

    /// Append a link at the end of the chain
    pub fn with_chain(mut self, next: Primary) -> Self {
        match self.chain.take() {
            Some(existing) => self.chain = Some(Box::new(existing.with_chain(next))),
            None => self.chain = Some(Box::new(next)),
        }
        self
    }

    pub fn last_link(&self) -> &Primary {
        match &self.chain {
            Some(next) => next.last_link(),
            None => self,
        }
    }

    /// Type of the whole chain: the type of its last link
    pub fn chain_type(&self) -> Option<&Type> {
        self.last_link().result_type.as_ref()
    }
}

/// What a chain link does
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKind {
    /// Variable, attribute, literal, `self` or struct name
    #[default]
    SimpleAccess,
    MethodCall { args: Vec<Expression> },
    ArrayAccess { index: Box<Expression> },
    /// `new Name(args)`; the token names the struct
    CreateInstance { args: Vec<Expression> },
    /// `new Int[dimension]`; the token names the element type
    CreateArray { dimension: Box<Expression> },
    Parenthesized { expression: Box<Expression> },
}

impl PrimaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimaryKind::SimpleAccess => "simple_access",
            PrimaryKind::MethodCall { .. } => "method_call",
            PrimaryKind::ArrayAccess { .. } => "array_access",
            PrimaryKind::CreateInstance { .. } => "create_instance",
            PrimaryKind::CreateArray { .. } => "create_array",
            PrimaryKind::Parenthesized { .. } => "parenthesized",
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    Increment,
    Decrement,
}

impl UnaryOperator {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Plus),
            TokenKind::Minus => Some(Self::Minus),
            TokenKind::Not => Some(Self::Not),
            TokenKind::PlusPlus => Some(Self::Increment),
            TokenKind::MinusMinus => Some(Self::Decrement),
            _ => None,
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn from_kind(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Add),
            TokenKind::Minus => Some(Self::Sub),
            TokenKind::Star => Some(Self::Mul),
            TokenKind::Slash => Some(Self::Div),
            TokenKind::Percent => Some(Self::Mod),
            TokenKind::Lt => Some(Self::Lt),
            TokenKind::Le => Some(Self::Le),
            TokenKind::Gt => Some(Self::Gt),
            TokenKind::Ge => Some(Self::Ge),
            TokenKind::EqEq => Some(Self::Eq),
            TokenKind::Ne => Some(Self::Ne),
            TokenKind::AndAnd => Some(Self::And),
            TokenKind::OrOr => Some(Self::Or),
            _ => None,
        }
    }
}

/// A checked method body, ready for code generation
#[derive(Debug, Clone)]
pub struct MethodBody {
    /// `None` for the entry method
    pub owner: Option<String>,
    pub method: String,
    pub kind: MethodKind,
    pub body: Block,
}

/// Every checked body of a program, in source order
#[derive(Debug, Clone, Default)]
pub struct TypedAst {
    pub bodies: Vec<MethodBody>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_appends_at_end() {
        let a = Primary::new(Token::new(TokenKind::ObjectId, "a", 1, 1), PrimaryKind::SimpleAccess);
        let b = Primary::new(Token::new(TokenKind::ObjectId, "b", 1, 3), PrimaryKind::SimpleAccess);
        let c = Primary::new(
            Token::new(TokenKind::ObjectId, "c", 1, 5),
            PrimaryKind::MethodCall { args: vec![] },
        );
        let chain = a.with_chain(b).with_chain(c);
        assert_eq!(chain.last_link().token.lexeme, "c");
        assert_eq!(chain.last_link().kind.name(), "method_call");
    }

    #[test]
    fn test_program_from_json() {
        let json = r#"{
            "items": [
                {"struct": {"name": {"kind": "struct_id", "lexeme": "A", "line": 1, "column": 8}}},
                {"start": {
                    "token": {"kind": "start", "lexeme": "start", "line": 3, "column": 1},
                    "body": {"sentences": [
                        {"expression": {"primary": {
                            "token": {"kind": "int_lit", "lexeme": "1", "line": 4, "column": 5}
                        }}}
                    ]}
                }}
            ]
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.items.len(), 2);
        match &program.items[1] {
            Item::Start(start) => assert_eq!(start.body.sentences.len(), 1),
            other => panic!("unexpected item {:?}", other),
        }
    }
}
