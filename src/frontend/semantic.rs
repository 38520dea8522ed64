//! Semantic Analysis
//!
//! Three strictly sequential phases over a parsed program:
//! - declaration: every item is registered in the symbol table
//! - consolidation: the inheritance tree is finalized
//! - type checking: every method body is checked against the table

use std::collections::BTreeSet;

use log::info;

use crate::frontend::ast::*;
use crate::frontend::token::Token;
use crate::frontend::typeck::TypeChecker;
use crate::symbols::method::MethodKind;
use crate::symbols::structure::DeclarationForm;
use crate::symbols::table::SymbolTable;
use crate::utils::{Error, Result};

/// Output of a successful analysis
#[derive(Debug)]
pub struct Analysis {
    pub table: SymbolTable,
    pub ast: TypedAst,
}

/// Semantic analyzer
pub struct SemanticAnalyzer {
    table: SymbolTable,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            table: SymbolTable::new(),
        }
    }

    /// Analyze a program
    pub fn analyze(mut self, program: Program) -> Result<Analysis> {
        info!("declaring {} items", program.items.len());
        for item in &program.items {
            self.declare_item(item)?;
        }

        info!("consolidating symbol table");
        self.table.consolidate()?;

        info!("type checking method bodies");
        let ast = self.check_program(program)?;
        Ok(Analysis {
            table: self.table,
            ast,
        })
    }

    // ==================== Declaration ====================

    fn declare_item(&mut self, item: &Item) -> Result<()> {
        match item {
            Item::Struct(def) => {
                self.table
                    .declare_struct(&def.name, def.parent.as_ref(), DeclarationForm::Structural)?;
                for attribute in &def.attributes {
                    self.table.declare_var(&attribute.name, &attribute.ty, attribute.private)?;
                }
            }
            Item::Impl(block) => {
                self.table.declare_struct(&block.name, None, DeclarationForm::Implementation)?;
                for method in &block.methods {
                    if method.kind == MethodKind::Start {
                        return Err(Error::invalid_access(
                            format!("'start' cannot be declared inside impl '{}'", block.name.lexeme),
                            method.name.position(),
                        ));
                    }
                    self.table
                        .declare_method(&method.name, method.kind, method.return_type.as_ref())?;
                    for param in &method.params {
                        self.table.declare_param(&param.name, &param.ty)?;
                    }
                    for local in &method.locals {
                        self.table.declare_var(&local.name, &local.ty, false)?;
                    }
                }
            }
            Item::Start(start) => {
                self.table.declare_method(&start.token, MethodKind::Start, None)?;
                for local in &start.locals {
                    self.table.declare_var(&local.name, &local.ty, false)?;
                }
            }
        }
        self.table.close_scope();
        Ok(())
    }

    // ==================== Type Checking ====================

    fn check_program(&mut self, program: Program) -> Result<TypedAst> {
        let mut ast = TypedAst::default();
        let mut instantiated = BTreeSet::new();

        for item in program.items {
            match item {
                Item::Struct(_) => {}
                Item::Impl(block) => {
                    let owner = block.name.lexeme;
                    for method in block.methods {
                        let body = self.check_body(Some(&owner), method.kind, &method.name, method.body, &mut instantiated)?;
                        ast.bodies.push(MethodBody {
                            owner: Some(owner.clone()),
                            method: method.name.lexeme,
                            kind: method.kind,
                            body,
                        });
                    }
                }
                Item::Start(start) => {
                    let body = self.check_body(None, MethodKind::Start, &start.token, start.body, &mut instantiated)?;
                    ast.bodies.push(MethodBody {
                        owner: None,
                        method: start.token.lexeme,
                        kind: MethodKind::Start,
                        body,
                    });
                }
            }
        }

        for name in &instantiated {
            self.table.mark_instantiated(name);
        }
        Ok(ast)
    }

    fn check_body(
        &self,
        owner: Option<&str>,
        kind: MethodKind,
        name: &Token,
        mut body: Block,
        instantiated: &mut BTreeSet<String>,
    ) -> Result<Block> {
        let method = self.table.method(owner, kind, &name.lexeme).ok_or_else(|| Error::UndefinedSymbol {
            name: name.lexeme.clone(),
            position: name.position(),
        })?;
        let mut checker = TypeChecker::new(&self.table, method);
        checker.check_block(&mut body)?;
        instantiated.extend(checker.into_instantiated());
        Ok(body)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::TokenKind;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn tok(kind: TokenKind, lexeme: &str, line: u32) -> Token {
        Token::new(kind, lexeme, line, 1)
    }

    fn sid(name: &str, line: u32) -> Token {
        tok(TokenKind::StructId, name, line)
    }

    fn oid(name: &str, line: u32) -> Token {
        tok(TokenKind::ObjectId, name, line)
    }

    fn int_ty(line: u32) -> Token {
        tok(TokenKind::IntType, "Int", line)
    }

    fn struct_item(name: &str, parent: Option<&str>, attributes: &[&str]) -> Item {
        Item::Struct(StructDef {
            name: sid(name, 1),
            parent: parent.map(|p| sid(p, 1)),
            attributes: attributes
                .iter()
                .map(|a| AttributeDef {
                    name: oid(a, 2),
                    ty: int_ty(2),
                    private: false,
                })
                .collect(),
        })
    }

    fn constructor() -> MethodDef {
        MethodDef {
            name: tok(TokenKind::Dot, ".", 4),
            kind: MethodKind::Constructor,
            params: vec![],
            return_type: None,
            locals: vec![],
            body: Block::default(),
        }
    }

    fn method(name: &str, kind: MethodKind, body: Vec<Sentence>) -> MethodDef {
        MethodDef {
            name: oid(name, 5),
            kind,
            params: vec![],
            return_type: None,
            locals: vec![],
            body: Block { sentences: body },
        }
    }

    fn impl_item(name: &str, methods: Vec<MethodDef>) -> Item {
        let mut all = vec![constructor()];
        all.extend(methods);
        Item::Impl(ImplBlock {
            name: sid(name, 3),
            methods: all,
        })
    }

    fn start_item(locals: Vec<VarDef>, body: Vec<Sentence>) -> Item {
        Item::Start(StartDef {
            token: tok(TokenKind::Start, "start", 20),
            locals,
            body: Block { sentences: body },
        })
    }

    fn access(token: Token) -> Primary {
        Primary::new(token, PrimaryKind::SimpleAccess)
    }

    #[test]
    fn test_forward_references_across_items() {
        let program = Program {
            items: vec![
                struct_item("B", Some("A"), &["b"]),
                impl_item("B", vec![]),
                struct_item("A", None, &["a"]),
                impl_item("A", vec![method("run", MethodKind::Instance, vec![])]),
                start_item(vec![], vec![]),
            ],
        };
        let analysis = SemanticAnalyzer::new().analyze(program).unwrap();
        let b = analysis.table.get_struct("B").unwrap();
        assert_eq!(b.parent(), Some("A"));
        assert_eq!(b.attribute("a").map(|v| v.position()), Some(0));
        assert_eq!(b.attribute("b").map(|v| v.position()), Some(1));
        assert!(b.method("run").is_some());
        assert_eq!(analysis.ast.bodies.len(), 4);
    }

    #[test]
    fn test_missing_impl_block() {
        let program = Program {
            items: vec![struct_item("A", None, &[])],
        };
        let err = SemanticAnalyzer::new().analyze(program).unwrap_err();
        assert!(matches!(err, Error::MissingDeclarationForm { form: "impl block", .. }));
    }

    #[test]
    fn test_self_parent_fails_immediately() {
        let program = Program {
            items: vec![struct_item("A", Some("A"), &[])],
        };
        let err = SemanticAnalyzer::new().analyze(program).unwrap_err();
        assert!(matches!(err, Error::InvalidParent { .. }));
    }

    #[test]
    fn test_self_in_static_method() {
        let body = vec![Sentence::Expression(Expression::Primary(access(tok(
            TokenKind::SelfValue,
            "self",
            6,
        ))))];
        let program = Program {
            items: vec![
                struct_item("A", None, &[]),
                impl_item("A", vec![method("make", MethodKind::Static, body)]),
            ],
        };
        let err = SemanticAnalyzer::new().analyze(program).unwrap_err();
        assert!(matches!(err, Error::InvalidAccess { .. }));
        assert_eq!(err.position().line, 6);
    }

    #[test]
    fn test_start_body_is_annotated_and_instantiation_recorded() {
        let assign = Sentence::Assignment {
            target: access(oid("a", 21)),
            token: tok(TokenKind::Assign, "=", 21),
            value: Expression::Primary(Primary::new(sid("A", 21), PrimaryKind::CreateInstance { args: vec![] })),
        };
        let program = Program {
            items: vec![
                struct_item("A", None, &[]),
                impl_item("A", vec![]),
                start_item(
                    vec![VarDef {
                        name: oid("a", 20),
                        ty: sid("A", 20),
                    }],
                    vec![assign],
                ),
            ],
        };
        let analysis = SemanticAnalyzer::new().analyze(program).unwrap();
        assert!(analysis.table.get_struct("A").unwrap().is_instantiated());

        let start = analysis.ast.bodies.last().unwrap();
        assert_eq!(start.owner, None);
        match &start.body.sentences[0] {
            Sentence::Assignment { value, .. } => {
                assert_eq!(value.result_type(), Some(&Type::Struct("A".to_string())));
            }
            other => panic!("unexpected sentence {:?}", other),
        }
    }

    #[test]
    fn test_start_inside_impl_rejected() {
        let program = Program {
            items: vec![
                struct_item("A", None, &[]),
                impl_item("A", vec![method("start", MethodKind::Start, vec![])]),
            ],
        };
        let err = SemanticAnalyzer::new().analyze(program).unwrap_err();
        assert!(matches!(err, Error::InvalidAccess { .. }));
    }
}
