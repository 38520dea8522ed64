//! Serializable snapshots of the symbol table and the typed AST
//!
//! The table snapshot keeps every slot number, so a dispatch table rebuilt
//! from a snapshot read back from disk matches the one built from the live
//! table.

use serde::{Deserialize, Serialize};

use crate::frontend::ast::{Block, Expression, Primary, PrimaryKind, Sentence, TypedAst};
use crate::frontend::token::Token;
use crate::symbols::layout::{AttributeSlot, DispatchSlot, DispatchTable};
use crate::symbols::method::{Method, MethodKind};
use crate::symbols::structure::Struct;
use crate::symbols::table::SymbolTable;
use crate::symbols::variable::Variable;
use crate::utils::Position;

// ==================== Symbol Table ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub structs: Vec<StructSnapshot>,
    pub start: Option<MethodSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructSnapshot {
    pub name: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub position: Position,
    pub builtin: bool,
    pub instantiated: bool,
    pub constructor: Option<MethodSnapshot>,
    pub methods: Vec<MethodSnapshot>,
    pub attributes: Vec<VariableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSnapshot {
    pub name: String,
    pub owner: Option<String>,
    pub kind: MethodKind,
    pub slot: usize,
    pub return_type: String,
    pub params: Vec<ParamSnapshot>,
    pub locals: Vec<VariableSnapshot>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub name: String,
    pub ty: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSnapshot {
    pub name: String,
    pub ty: String,
    pub owner: String,
    pub private: bool,
    pub inherited: bool,
    pub slot: usize,
}

impl TableSnapshot {
    pub fn from_table(table: &SymbolTable) -> Self {
        Self {
            structs: table.structs_sorted().into_iter().map(StructSnapshot::from_struct).collect(),
            start: table.start().map(MethodSnapshot::from_method),
        }
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructSnapshot> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Dispatch layout of a struct as recorded in the snapshot
    pub fn dispatch_table(&self, name: &str) -> Option<DispatchTable> {
        self.get_struct(name).map(StructSnapshot::dispatch_table)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl StructSnapshot {
    fn from_struct(entry: &Struct) -> Self {
        Self {
            name: entry.name().to_string(),
            parent: entry.parent().map(str::to_string),
            children: entry.children().map(str::to_string).collect(),
            position: entry.token().position(),
            builtin: entry.is_builtin(),
            instantiated: entry.is_instantiated(),
            constructor: entry.constructor().map(MethodSnapshot::from_method),
            methods: entry.methods_by_slot().into_iter().map(MethodSnapshot::from_method).collect(),
            attributes: entry
                .attributes_by_slot()
                .into_iter()
                .map(VariableSnapshot::from_variable)
                .collect(),
        }
    }

    pub fn dispatch_table(&self) -> DispatchTable {
        let methods = self
            .methods
            .iter()
            .map(|m| {
                let owner = m.owner.clone().unwrap_or_else(|| self.name.clone());
                let is_static = matches!(m.kind, MethodKind::Static | MethodKind::Start);
                (DispatchSlot::new(m.slot, m.name.clone(), owner), is_static)
            })
            .collect();
        let attributes = self
            .attributes
            .iter()
            .map(|v| AttributeSlot {
                slot: v.slot,
                name: v.name.clone(),
                ty: v.ty.clone(),
                owner: v.owner.clone(),
            })
            .collect();
        DispatchTable::new(
            self.name.clone(),
            self.parent.clone(),
            self.constructor.is_some(),
            methods,
            attributes,
        )
    }
}

impl MethodSnapshot {
    fn from_method(method: &Method) -> Self {
        Self {
            name: method.name().to_string(),
            owner: method.owner().map(str::to_string),
            kind: method.kind(),
            slot: method.position(),
            return_type: method.return_type().to_string(),
            params: method
                .params()
                .iter()
                .map(|p| ParamSnapshot {
                    name: p.name().to_string(),
                    ty: p.ty().to_string(),
                    position: p.position(),
                })
                .collect(),
            locals: method.locals().into_iter().map(VariableSnapshot::from_variable).collect(),
            position: method.token().position(),
        }
    }
}

impl VariableSnapshot {
    fn from_variable(var: &Variable) -> Self {
        Self {
            name: var.name().to_string(),
            ty: var.ty().to_string(),
            owner: var.owner().to_string(),
            private: var.is_private(),
            inherited: var.is_inherited(),
            slot: var.position(),
        }
    }
}

// ==================== Typed AST ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstSnapshot {
    pub bodies: Vec<BodySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub owner: Option<String>,
    pub method: String,
    pub kind: MethodKind,
    pub body: NodeSnapshot,
}

/// Generic tree node: variant name, anchor token and stored result type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    fn new(node: &str) -> Self {
        Self {
            node: node.to_string(),
            token: None,
            position: None,
            result_type: None,
            children: Vec::new(),
        }
    }

    fn anchored(node: &str, token: &Token) -> Self {
        Self {
            token: Some(token.lexeme.clone()),
            position: Some(token.position()),
            ..Self::new(node)
        }
    }

    fn with_children(mut self, children: Vec<NodeSnapshot>) -> Self {
        self.children = children;
        self
    }

    fn from_block(block: &Block) -> Self {
        Self::new("block").with_children(block.sentences.iter().map(Self::from_sentence).collect())
    }

    fn from_sentence(sentence: &Sentence) -> Self {
        match sentence {
            Sentence::Block(block) => Self::from_block(block),
            Sentence::Conditional {
                token,
                condition,
                then_branch,
                else_branch,
            } => {
                let mut children = vec![Self::from_expression(condition), Self::from_sentence(then_branch)];
                if let Some(otherwise) = else_branch {
                    children.push(Self::from_sentence(otherwise));
                }
                Self::anchored("conditional", token).with_children(children)
            }
            Sentence::Loop { token, condition, body } => Self::anchored("loop", token)
                .with_children(vec![Self::from_expression(condition), Self::from_sentence(body)]),
            Sentence::Assignment { target, token, value } => Self::anchored("assignment", token)
                .with_children(vec![Self::from_primary(target), Self::from_expression(value)]),
            Sentence::Return { token, value } => {
                Self::anchored("return", token).with_children(value.iter().map(Self::from_expression).collect())
            }
            Sentence::Expression(expression) => {
                Self::new("expression_sentence").with_children(vec![Self::from_expression(expression)])
            }
        }
    }

    fn from_expression(expression: &Expression) -> Self {
        match expression {
            Expression::Primary(primary) => Self::from_primary(primary),
            Expression::Unary(unary) => Self {
                result_type: unary.result_type.as_ref().map(ToString::to_string),
                ..Self::anchored("unary", &unary.operator).with_children(vec![Self::from_primary(&unary.operand)])
            },
            Expression::Binary(binary) => Self {
                result_type: binary.result_type.as_ref().map(ToString::to_string),
                ..Self::anchored("binary", &binary.operator).with_children(vec![
                    Self::from_expression(&binary.left),
                    Self::from_expression(&binary.right),
                ])
            },
        }
    }

    fn from_primary(primary: &Primary) -> Self {
        let mut children: Vec<NodeSnapshot> = match &primary.kind {
            PrimaryKind::SimpleAccess => vec![],
            PrimaryKind::MethodCall { args } | PrimaryKind::CreateInstance { args } => {
                args.iter().map(Self::from_expression).collect()
            }
            PrimaryKind::ArrayAccess { index } => vec![Self::from_expression(index)],
            PrimaryKind::CreateArray { dimension } => vec![Self::from_expression(dimension)],
            PrimaryKind::Parenthesized { expression } => vec![Self::from_expression(expression)],
        };
        if let Some(next) = &primary.chain {
            children.push(Self::from_primary(next));
        }
        Self {
            result_type: primary.result_type.as_ref().map(ToString::to_string),
            ..Self::anchored(primary.kind.name(), &primary.token).with_children(children)
        }
    }
}

impl AstSnapshot {
    pub fn from_ast(ast: &TypedAst) -> Self {
        Self {
            bodies: ast
                .bodies
                .iter()
                .map(|b| BodySnapshot {
                    owner: b.owner.clone(),
                    method: b.method.clone(),
                    kind: b.kind,
                    body: NodeSnapshot::from_block(&b.body),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
