//! Symbol Table
//!
//! Declarations arrive in source order, which is not dependency order: a
//! struct may name a parent or a member type that is declared further down.
//! Such references are parked in two pending maps and discharged when the
//! named struct shows up. `consolidate` then rejects anything still pending,
//! checks that every struct is complete and pushes inherited members down the
//! tree.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use crate::frontend::token::Token;
use crate::stdlib::builtins::{self, ROOT};
use crate::symbols::layout::DispatchTable;
use crate::symbols::method::{Method, MethodKind};
use crate::symbols::structure::{DeclarationForm, Struct};
use crate::types::Type;
use crate::utils::{Error, Position, Result};

/// A struct parked under a parent that is not declared yet
#[derive(Debug, Clone)]
struct PendingChild {
    child: String,
    reference: Token,
}

/// The method whose params and locals are being declared
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpenMethod {
    Start,
    Constructor,
    Named(String),
}

/// Registry of every struct, method and variable of a compilation unit
#[derive(Debug)]
pub struct SymbolTable {
    structs: HashMap<String, Struct>,
    start: Option<Method>,
    /// parent name -> structs waiting for it
    pending_parents: BTreeMap<String, Vec<PendingChild>>,
    /// type name -> tokens that used it before it was declared
    pending_types: BTreeMap<String, Vec<Token>>,
    current_struct: Option<String>,
    current_method: Option<OpenMethod>,
    consolidated: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            structs: builtins::builtin_structs(),
            start: None,
            pending_parents: BTreeMap::new(),
            pending_types: BTreeMap::new(),
            current_struct: None,
            current_method: None,
            consolidated: false,
        }
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.get(name)
    }

    pub fn contains_struct(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// All structs, built-ins included, ordered by name
    pub fn structs_sorted(&self) -> Vec<&Struct> {
        let mut structs: Vec<&Struct> = self.structs.values().collect();
        structs.sort_by(|a, b| a.name().cmp(b.name()));
        structs
    }

    /// The entry method
    pub fn start(&self) -> Option<&Method> {
        self.start.as_ref()
    }

    pub fn is_consolidated(&self) -> bool {
        self.consolidated
    }

    /// Parent names that are still awaited
    pub fn pending_parents(&self) -> Vec<&str> {
        self.pending_parents.keys().map(String::as_str).collect()
    }

    /// Type names that are used but not declared yet
    pub fn pending_types(&self) -> Vec<&str> {
        self.pending_types.keys().map(String::as_str).collect()
    }

    /// Find a declared method. `owner == None` selects the entry method.
    pub fn method(&self, owner: Option<&str>, kind: MethodKind, name: &str) -> Option<&Method> {
        match owner {
            None => self.start.as_ref(),
            Some(owner) => self.structs.get(owner)?.declared_method(kind, name),
        }
    }

    /// Is `child` the struct `ancestor` or one of its descendants
    pub fn is_subtype(&self, child: &str, ancestor: &str) -> bool {
        let mut cursor = Some(child);
        while let Some(name) = cursor {
            if name == ancestor {
                return true;
            }
            cursor = self.structs.get(name).and_then(Struct::parent);
        }
        false
    }

    /// Can a value of type `value` be stored where `target` is expected
    pub fn is_assignable(&self, value: &Type, target: &Type) -> bool {
        match (value, target) {
            _ if value == target => true,
            (Type::Literal(v), Type::Primitive(t)) => v == t,
            (Type::Nil, Type::Struct(_) | Type::Array(_)) => true,
            (Type::Struct(v), Type::Struct(t)) => self.is_subtype(v, t),
            _ => false,
        }
    }

    /// Dispatch layout of a struct
    pub fn dispatch_table(&self, name: &str) -> Option<DispatchTable> {
        self.structs.get(name).map(DispatchTable::from_struct)
    }

    // ==================== Declaration ====================

    /// Register one declaration form of a struct.
    ///
    /// Only the structural form carries a parent. An undeclared parent parks
    /// the struct under the root until that parent is declared.
    pub fn declare_struct(&mut self, token: &Token, parent: Option<&Token>, form: DeclarationForm) -> Result<()> {
        let name = token.lexeme.as_str();
        if builtins::is_builtin(name) {
            return Err(Error::DuplicateDeclaration {
                what: "built-in struct",
                name: name.to_string(),
                position: token.position(),
            });
        }
        if self.structs.get(name).is_some_and(|s| s.has_form(form)) {
            return Err(Error::DuplicateDeclaration {
                what: form.describe(),
                name: name.to_string(),
                position: token.position(),
            });
        }

        let declared_parent = match form {
            DeclarationForm::Structural => parent,
            DeclarationForm::Implementation => None,
        };
        if let Some(p) = declared_parent {
            if builtins::is_sealed(&p.lexeme) || p.lexeme == name {
                return Err(Error::InvalidParent {
                    name: name.to_string(),
                    parent: p.lexeme.clone(),
                    position: p.position(),
                });
            }
        }

        let resolved = match declared_parent {
            Some(p) if !self.structs.contains_key(&p.lexeme) => {
                debug!("parent '{}' of '{}' is not declared yet", p.lexeme, name);
                self.pending_parents.entry(p.lexeme.clone()).or_default().push(PendingChild {
                    child: name.to_string(),
                    reference: p.clone(),
                });
                ROOT.to_string()
            }
            Some(p) => p.lexeme.clone(),
            None => ROOT.to_string(),
        };

        if !self.structs.contains_key(name) {
            debug!("declaring struct '{}' under '{}'", name, resolved);
            self.structs
                .insert(name.to_string(), Struct::new(token.clone(), Some(resolved.clone())));
            if let Some(parent) = self.structs.get_mut(&resolved) {
                parent.children.insert(name.to_string());
            }
        } else if form == DeclarationForm::Structural {
            self.set_parent(name, &resolved);
        }

        if let Some(waiting) = self.pending_parents.remove(name) {
            for pending in waiting {
                debug!("re-parenting '{}' under '{}'", pending.child, name);
                self.set_parent(&pending.child, name);
            }
        }
        self.pending_types.remove(name);
        self.check_cycle(name, token)?;

        if let Some(entry) = self.structs.get_mut(name) {
            entry.record_form(form, token)?;
        }
        self.current_struct = Some(name.to_string());
        self.current_method = None;
        Ok(())
    }

    /// Register a method of the open struct, or the entry method
    pub fn declare_method(&mut self, token: &Token, kind: MethodKind, return_type: Option<&Token>) -> Result<()> {
        if kind == MethodKind::Start {
            if self.start.is_some() {
                return Err(Error::DuplicateDeclaration {
                    what: "start method",
                    name: token.lexeme.clone(),
                    position: token.position(),
                });
            }
            self.start = Some(Method::new(token.clone(), None, kind, Type::Void, 0));
            self.current_struct = None;
            self.current_method = Some(OpenMethod::Start);
            return Ok(());
        }

        let return_type = match (kind, return_type) {
            (MethodKind::Constructor, _) | (_, None) => Type::Void,
            (_, Some(ty)) => self.resolve_type(ty),
        };
        let owner = self.current_struct.clone().ok_or_else(|| Error::MissingDeclarationForm {
            name: token.lexeme.clone(),
            form: "enclosing impl block",
            position: token.position(),
        })?;
        if let Some(entry) = self.structs.get_mut(&owner) {
            entry.add_method(token.clone(), kind, return_type)?;
        }
        self.current_method = Some(match kind {
            MethodKind::Constructor => OpenMethod::Constructor,
            _ => OpenMethod::Named(token.lexeme.clone()),
        });
        Ok(())
    }

    /// Append a parameter to the open method
    pub fn declare_param(&mut self, token: &Token, ty: &Token) -> Result<()> {
        let ty = self.resolve_type(ty);
        let method = self.open_method_mut().ok_or_else(|| Error::MissingDeclarationForm {
            name: token.lexeme.clone(),
            form: "enclosing method",
            position: token.position(),
        })?;
        method.add_param(token.clone(), ty)
    }

    /// Declare a local of the open method, or an attribute when no method is
    /// open
    pub fn declare_var(&mut self, token: &Token, ty: &Token, private: bool) -> Result<()> {
        let ty = self.resolve_type(ty);
        if self.current_method.is_some() {
            return match self.open_method_mut() {
                Some(method) => method.add_local(token.clone(), ty),
                None => Err(Error::MissingDeclarationForm {
                    name: token.lexeme.clone(),
                    form: "enclosing method",
                    position: token.position(),
                }),
            };
        }

        let owner = self.current_struct.as_deref().and_then(|name| self.structs.get_mut(name));
        match owner {
            Some(entry) => entry.add_attribute(token.clone(), ty, private),
            None => Err(Error::MissingDeclarationForm {
                name: token.lexeme.clone(),
                form: "enclosing struct declaration",
                position: token.position(),
            }),
        }
    }

    /// Close the open struct and method
    pub fn close_scope(&mut self) {
        self.current_struct = None;
        self.current_method = None;
    }

    /// Record that a struct is created somewhere in the program
    pub(crate) fn mark_instantiated(&mut self, name: &str) {
        if let Some(entry) = self.structs.get_mut(name) {
            entry.instantiated = true;
        }
    }

    fn resolve_type(&mut self, token: &Token) -> Type {
        let ty = Type::from_name(&token.lexeme);
        if let Type::Struct(name) = &ty {
            if !self.structs.contains_key(name) {
                debug!("type '{}' used before its declaration", name);
                self.pending_types.entry(name.clone()).or_default().push(token.clone());
            }
        }
        ty
    }

    fn open_method_mut(&mut self) -> Option<&mut Method> {
        match self.current_method.as_ref()? {
            OpenMethod::Start => self.start.as_mut(),
            OpenMethod::Constructor => {
                let owner = self.current_struct.as_ref()?;
                self.structs.get_mut(owner)?.constructor.as_mut()
            }
            OpenMethod::Named(name) => {
                let owner = self.current_struct.as_ref()?;
                self.structs.get_mut(owner)?.methods.get_mut(name)
            }
        }
    }

    fn set_parent(&mut self, child: &str, parent: &str) {
        let previous = self
            .structs
            .get_mut(child)
            .and_then(|s| s.parent.replace(parent.to_string()));
        if let Some(previous) = previous {
            if let Some(old) = self.structs.get_mut(&previous) {
                old.children.remove(child);
            }
        }
        if let Some(new) = self.structs.get_mut(parent) {
            new.children.insert(child.to_string());
        }
    }

    fn check_cycle(&self, name: &str, token: &Token) -> Result<()> {
        let mut seen = HashSet::from([name]);
        let mut cursor = self.structs.get(name).and_then(Struct::parent);
        while let Some(parent) = cursor {
            if parent == ROOT {
                break;
            }
            if !seen.insert(parent) {
                return Err(Error::CyclicInheritance {
                    name: name.to_string(),
                    position: token.position(),
                });
            }
            cursor = self.structs.get(parent).and_then(Struct::parent);
        }
        Ok(())
    }

    // ==================== Consolidation ====================

    /// Finalize the inheritance tree. Runs once; later calls do nothing.
    pub fn consolidate(&mut self) -> Result<()> {
        if self.consolidated {
            debug!("symbol table already consolidated");
            return Ok(());
        }

        if let Some((parent, waiting)) = self.pending_parents.iter().next() {
            return Err(Error::UndefinedType {
                name: parent.clone(),
                position: waiting.first().map_or_else(Position::default, |w| w.reference.position()),
            });
        }
        if let Some((name, tokens)) = self.pending_types.iter().next() {
            return Err(Error::UndefinedType {
                name: name.clone(),
                position: tokens.first().map_or_else(Position::default, Token::position),
            });
        }

        for entry in self.structs_sorted().into_iter().filter(|s| !s.is_builtin()) {
            let missing = if !entry.has_form(DeclarationForm::Structural) {
                Some(DeclarationForm::Structural.describe())
            } else if !entry.has_form(DeclarationForm::Implementation) {
                Some(DeclarationForm::Implementation.describe())
            } else if entry.constructor().is_none() {
                Some("constructor")
            } else {
                None
            };
            if let Some(form) = missing {
                return Err(Error::MissingDeclarationForm {
                    name: entry.name().to_string(),
                    form,
                    position: entry.token().position(),
                });
            }
        }

        self.propagate_members()?;
        self.consolidated = true;
        Ok(())
    }

    /// Pre-order walk from the root: a struct is merged only after its parent
    fn propagate_members(&mut self) -> Result<()> {
        let mut stack = vec![ROOT.to_string()];
        while let Some(name) = stack.pop() {
            let Some(parent) = self.structs.get(&name) else {
                continue;
            };
            let methods = parent.methods.clone();
            let attributes = parent.attributes.clone();
            let children: Vec<String> = parent.children.iter().rev().cloned().collect();

            for child in children {
                let Some(entry) = self.structs.get_mut(&child) else {
                    continue;
                };
                if !entry.consolidated {
                    debug!("consolidating '{}' into '{}'", name, child);
                    entry.inherit_methods(&methods)?;
                    entry.inherit_attributes(&attributes)?;
                    entry.consolidated = true;
                }
                stack.push(child);
            }
        }
        Ok(())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::TokenKind;
    use crate::symbols::structure::AttributeLookup;
    use pretty_assertions::assert_eq;

    fn sid(name: &str, line: u32) -> Token {
        Token::new(TokenKind::StructId, name, line, 8)
    }

    fn oid(name: &str, line: u32) -> Token {
        Token::new(TokenKind::ObjectId, name, line, 5)
    }

    fn ty(name: &str) -> Token {
        let kind = TokenKind::type_from_str(name).unwrap_or(TokenKind::StructId);
        Token::new(kind, name, 1, 1)
    }

    fn declare_struct(table: &mut SymbolTable, name: &str, parent: Option<&str>) -> Result<()> {
        let parent = parent.map(|p| sid(p, 1));
        table.declare_struct(&sid(name, 1), parent.as_ref(), DeclarationForm::Structural)
    }

    /// Impl block with a constructor and the given instance methods
    fn declare_impl(table: &mut SymbolTable, name: &str, methods: &[&str]) -> Result<()> {
        table.declare_struct(&sid(name, 2), None, DeclarationForm::Implementation)?;
        table.declare_method(&Token::new(TokenKind::Dot, ".", 3, 5), MethodKind::Constructor, None)?;
        for method in methods {
            table.declare_method(&oid(method, 4), MethodKind::Instance, None)?;
        }
        Ok(())
    }

    fn complete(table: &mut SymbolTable, name: &str, parent: Option<&str>) {
        declare_struct(table, name, parent).unwrap();
        declare_impl(table, name, &[]).unwrap();
    }

    fn slots(entry: &Struct) -> Vec<(String, usize)> {
        entry
            .methods_by_slot()
            .iter()
            .map(|m| (m.name().to_string(), m.position()))
            .collect()
    }

    #[test]
    fn test_forward_parent_is_resolved() {
        let mut table = SymbolTable::new();
        complete(&mut table, "B", Some("A"));
        assert_eq!(table.pending_parents(), vec!["A"]);
        assert_eq!(table.get_struct("B").and_then(Struct::parent), Some(ROOT));

        complete(&mut table, "A", None);
        assert!(table.pending_parents().is_empty());
        table.consolidate().unwrap();

        assert_eq!(table.get_struct("B").and_then(Struct::parent), Some("A"));
        assert!(table.get_struct("A").unwrap().children().any(|c| c == "B"));
        assert!(!table.get_struct(ROOT).unwrap().children().any(|c| c == "B"));
    }

    #[test]
    fn test_cycle_in_either_order() {
        for (first, second) in [("A", "B"), ("B", "A")] {
            let mut table = SymbolTable::new();
            declare_struct(&mut table, first, Some(second)).unwrap();
            let err = declare_struct(&mut table, second, Some(first)).unwrap_err();
            assert!(matches!(err, Error::CyclicInheritance { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_longer_cycle() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", Some("C")).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        let err = declare_struct(&mut table, "C", Some("B")).unwrap_err();
        assert_eq!(
            err,
            Error::CyclicInheritance {
                name: "C".to_string(),
                position: Position::new(1, 8),
            }
        );
    }

    #[test]
    fn test_invalid_parents() {
        let mut table = SymbolTable::new();
        let err = declare_struct(&mut table, "A", Some("A")).unwrap_err();
        assert!(matches!(err, Error::InvalidParent { .. }));

        for sealed in ["Int", "Str", "IO", "Array Int"] {
            let err = declare_struct(&mut table, "B", Some(sealed)).unwrap_err();
            assert!(matches!(err, Error::InvalidParent { ref parent, .. } if parent == sealed));
        }
        declare_struct(&mut table, "B", Some(ROOT)).unwrap();
    }

    #[test]
    fn test_builtin_name_cannot_be_redeclared() {
        let mut table = SymbolTable::new();
        let err = declare_struct(&mut table, "IO", None).unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "built-in struct", .. }));
    }

    #[test]
    fn test_each_form_once() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        let err = declare_struct(&mut table, "A", None).unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "struct declaration", .. }));
        let err = table
            .declare_struct(&sid("A", 9), None, DeclarationForm::Implementation)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "impl block", .. }));
    }

    #[test]
    fn test_impl_first_then_struct_reparents() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        declare_impl(&mut table, "B", &[]).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        table.consolidate().unwrap();
        assert_eq!(table.get_struct("B").and_then(Struct::parent), Some("A"));
        assert!(!table.get_struct(ROOT).unwrap().children().any(|c| c == "B"));
    }

    #[test]
    fn test_undefined_parent_reported_at_consolidation() {
        let mut table = SymbolTable::new();
        complete(&mut table, "B", Some("Missing"));
        let err = table.consolidate().unwrap_err();
        assert_eq!(
            err,
            Error::UndefinedType {
                name: "Missing".to_string(),
                position: Position::new(1, 8),
            }
        );
    }

    #[test]
    fn test_pending_type_discharged_by_later_declaration() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", None).unwrap();
        table.declare_var(&oid("next", 2), &ty("Node"), false).unwrap();
        declare_impl(&mut table, "A", &[]).unwrap();
        assert_eq!(table.pending_types(), vec!["Node"]);

        complete(&mut table, "Node", None);
        assert!(table.pending_types().is_empty());
        table.consolidate().unwrap();
    }

    #[test]
    fn test_undefined_member_type() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", None).unwrap();
        declare_impl(&mut table, "A", &[]).unwrap();
        table.declare_method(&oid("make", 5), MethodKind::Instance, Some(&ty("Ghost"))).unwrap();
        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::UndefinedType { ref name, .. } if name == "Ghost"));
    }

    #[test]
    fn test_missing_forms() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", None).unwrap();
        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::MissingDeclarationForm { form: "impl block", .. }));

        let mut table = SymbolTable::new();
        declare_impl(&mut table, "A", &[]).unwrap();
        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::MissingDeclarationForm { form: "struct declaration", .. }));

        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", None).unwrap();
        table.declare_struct(&sid("A", 2), None, DeclarationForm::Implementation).unwrap();
        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::MissingDeclarationForm { form: "constructor", .. }));
    }

    #[test]
    fn test_inherited_slots_below_own_slots() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        table.declare_var(&oid("b1", 2), &ty("Int"), false).unwrap();
        declare_impl(&mut table, "B", &["m3", "m1"]).unwrap();

        declare_struct(&mut table, "A", None).unwrap();
        table.declare_var(&oid("a1", 2), &ty("Int"), false).unwrap();
        table.declare_var(&oid("a2", 3), &ty("Str"), true).unwrap();
        declare_impl(&mut table, "A", &["m1", "m2"]).unwrap();
        table.consolidate().unwrap();

        let b = table.get_struct("B").unwrap();
        assert_eq!(
            slots(b),
            vec![("m1".to_string(), 0), ("m2".to_string(), 1), ("m3".to_string(), 2)]
        );
        assert_eq!(b.method("m1").and_then(Method::owner), Some("B"));
        assert_eq!(b.method("m2").and_then(Method::owner), Some("A"));

        let attributes: Vec<(&str, usize, bool)> = b
            .attributes_by_slot()
            .iter()
            .map(|v| (v.name(), v.position(), v.is_inherited()))
            .collect();
        assert_eq!(attributes, vec![("a1", 0, true), ("a2", 1, true), ("b1", 2, false)]);
        assert!(matches!(b.lookup_attribute("a2", Some("B")), AttributeLookup::Hidden(_)));
    }

    #[test]
    fn test_deep_chain_declared_in_reverse() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "C", Some("B")).unwrap();
        declare_impl(&mut table, "C", &["c"]).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &["b"]).unwrap();
        declare_struct(&mut table, "A", None).unwrap();
        declare_impl(&mut table, "A", &["a"]).unwrap();
        table.consolidate().unwrap();

        let c = table.get_struct("C").unwrap();
        assert_eq!(
            slots(c),
            vec![("a".to_string(), 0), ("b".to_string(), 1), ("c".to_string(), 2)]
        );
        assert!(table.is_subtype("C", "A"));
        assert!(table.is_subtype("C", ROOT));
        assert!(!table.is_subtype("A", "C"));
    }

    #[test]
    fn test_override_with_different_params() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Instance, None).unwrap();
        table.declare_param(&oid("x", 4), &ty("Int")).unwrap();

        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &["m"]).unwrap();
        table.declare_param(&oid("x", 4), &ty("Bool")).unwrap();

        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::InvalidOverride { ref method, .. } if method == "m"));
    }

    #[test]
    fn test_override_of_static_method() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Static, None).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &[]).unwrap();
        table.declare_method(&oid("m", 4), MethodKind::Static, None).unwrap();

        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::InvalidOverride { .. }));
    }

    #[test]
    fn test_static_override_with_different_params() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Static, None).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &[]).unwrap();
        table.declare_method(&oid("m", 9), MethodKind::Static, None).unwrap();
        table.declare_param(&oid("x", 9), &ty("Str")).unwrap();

        match table.consolidate().unwrap_err() {
            Error::InvalidOverride { method, reason, position } => {
                assert_eq!(method, "m");
                assert!(reason.contains("is static in 'A'"), "{}", reason);
                assert_eq!(position.line, 9);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_static_method_takes_over_instance_slot() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Instance, None).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &["own"]).unwrap();
        table.declare_method(&oid("m", 5), MethodKind::Static, None).unwrap();

        table.consolidate().unwrap();
        let a_slot = table.get_struct("A").unwrap().method("m").unwrap().position();
        let b = table.get_struct("B").unwrap();
        let m = b.method("m").unwrap();
        assert!(m.is_static());
        assert_eq!(m.owner(), Some("B"));
        assert_eq!(m.position(), a_slot);
        assert_eq!(b.method("own").map(|m| m.position()), Some(a_slot + 1));
    }

    #[test]
    fn test_override_with_different_return_type() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Instance, Some(&ty("Int"))).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        declare_impl(&mut table, "B", &[]).unwrap();
        table.declare_method(&oid("m", 4), MethodKind::Instance, Some(&ty("Bool"))).unwrap();

        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::InvalidOverride { .. }));
    }

    #[test]
    fn test_redeclared_inherited_attribute() {
        let mut table = SymbolTable::new();
        declare_struct(&mut table, "A", None).unwrap();
        table.declare_var(&oid("x", 2), &ty("Int"), false).unwrap();
        declare_impl(&mut table, "A", &[]).unwrap();
        declare_struct(&mut table, "B", Some("A")).unwrap();
        table.declare_var(&oid("x", 2), &ty("Int"), false).unwrap();
        declare_impl(&mut table, "B", &[]).unwrap();

        let err = table.consolidate().unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "inherited attribute", .. }));
    }

    #[test]
    fn test_locals_and_start() {
        let mut table = SymbolTable::new();
        let start = Token::new(TokenKind::Start, "start", 10, 1);
        table.declare_method(&start, MethodKind::Start, None).unwrap();
        table.declare_var(&oid("i", 11), &ty("Int"), false).unwrap();
        let err = table.declare_var(&oid("i", 12), &ty("Int"), false).unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "local variable", .. }));

        let err = table.declare_method(&start, MethodKind::Start, None).unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { what: "start method", .. }));
        assert!(table.start().and_then(|m| m.local("i")).is_some());
    }

    #[test]
    fn test_consolidate_twice_is_noop() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        table.declare_method(&oid("m", 4), MethodKind::Instance, None).unwrap();
        complete(&mut table, "B", Some("A"));
        table.consolidate().unwrap();
        let before = slots(table.get_struct("B").unwrap());
        table.consolidate().unwrap();
        assert!(table.is_consolidated());
        assert_eq!(slots(table.get_struct("B").unwrap()), before);
    }

    #[test]
    fn test_assignability() {
        let mut table = SymbolTable::new();
        complete(&mut table, "A", None);
        complete(&mut table, "B", Some("A"));
        table.consolidate().unwrap();

        let a = Type::Struct("A".to_string());
        let b = Type::Struct("B".to_string());
        assert!(table.is_assignable(&b, &a));
        assert!(!table.is_assignable(&a, &b));
        assert!(table.is_assignable(&Type::Nil, &a));
        assert!(table.is_assignable(&Type::Literal(crate::types::PrimitiveType::Int), &Type::INT));
        assert!(!table.is_assignable(&Type::INT, &Type::BOOL));
    }
}
