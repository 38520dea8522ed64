//! Struct records and inherited-member propagation

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::frontend::token::Token;
use crate::symbols::method::{Method, MethodKind};
use crate::symbols::variable::Variable;
use crate::types::Type;
use crate::utils::{Error, Result};

/// The two declaration sites every user struct needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationForm {
    /// `struct Name : Parent { attributes }`
    Structural,
    /// `impl Name { constructor and methods }`
    Implementation,
}

impl DeclarationForm {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Structural => "struct declaration",
            Self::Implementation => "impl block",
        }
    }
}

/// Result of looking up an attribute from some accessing struct
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeLookup<'a> {
    Visible(&'a Variable),
    /// Exists but is private to another struct
    Hidden(&'a Variable),
    Missing,
}

/// A struct type. Parent and children are names into the owning table.
#[derive(Debug, Clone)]
pub struct Struct {
    pub(crate) token: Token,
    pub(crate) parent: Option<String>,
    pub(crate) attributes: HashMap<String, Variable>,
    pub(crate) methods: HashMap<String, Method>,
    pub(crate) constructor: Option<Method>,
    pub(crate) children: BTreeSet<String>,
    pub(crate) structural_count: u8,
    pub(crate) impl_count: u8,
    pub(crate) consolidated: bool,
    pub(crate) instantiated: bool,
    pub(crate) builtin: bool,
    next_method_slot: usize,
    next_attribute_slot: usize,
}

impl Struct {
    pub fn new(token: Token, parent: Option<String>) -> Self {
        Self {
            token,
            parent,
            attributes: HashMap::new(),
            methods: HashMap::new(),
            constructor: None,
            children: BTreeSet::new(),
            structural_count: 0,
            impl_count: 0,
            consolidated: false,
            instantiated: false,
            builtin: false,
            next_method_slot: 0,
            next_attribute_slot: 0,
        }
    }

    /// A pre-registered struct; final from the start
    pub(crate) fn builtin(token: Token, parent: Option<String>) -> Self {
        Self {
            builtin: true,
            consolidated: true,
            ..Self::new(token, parent)
        }
    }

    pub fn name(&self) -> &str {
        &self.token.lexeme
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    pub fn constructor(&self) -> Option<&Method> {
        self.constructor.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Variable> {
        self.attributes.get(name)
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn is_consolidated(&self) -> bool {
        self.consolidated
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    pub fn has_form(&self, form: DeclarationForm) -> bool {
        match form {
            DeclarationForm::Structural => self.structural_count > 0,
            DeclarationForm::Implementation => self.impl_count > 0,
        }
    }

    /// Methods (inherited included) ordered by slot
    pub fn methods_by_slot(&self) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self.methods.values().collect();
        methods.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name().cmp(b.name())));
        methods
    }

    /// Attributes (inherited included) ordered by slot
    pub fn attributes_by_slot(&self) -> Vec<&Variable> {
        let mut attributes: Vec<&Variable> = self.attributes.values().collect();
        attributes.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.name().cmp(b.name())));
        attributes
    }

    /// Look up an attribute as seen from the struct named `accessor`.
    /// Private attributes are visible only inside their declaring struct.
    pub fn lookup_attribute(&self, name: &str, accessor: Option<&str>) -> AttributeLookup<'_> {
        match self.attributes.get(name) {
            None => AttributeLookup::Missing,
            Some(var) if !var.private => AttributeLookup::Visible(var),
            Some(var) if !var.inherited && accessor == Some(self.name()) => AttributeLookup::Visible(var),
            Some(var) => AttributeLookup::Hidden(var),
        }
    }

    /// Count one more declaration of the given form
    pub(crate) fn record_form(&mut self, form: DeclarationForm, token: &Token) -> Result<()> {
        if self.has_form(form) {
            return Err(Error::DuplicateDeclaration {
                what: form.describe(),
                name: self.name().to_string(),
                position: token.position(),
            });
        }
        match form {
            DeclarationForm::Structural => self.structural_count = 1,
            DeclarationForm::Implementation => self.impl_count = 1,
        }
        Ok(())
    }

    pub(crate) fn add_method(&mut self, token: Token, kind: MethodKind, return_type: Type) -> Result<()> {
        let owner = Some(self.name().to_string());
        if kind == MethodKind::Constructor {
            if self.constructor.is_some() {
                return Err(Error::DuplicateDeclaration {
                    what: "constructor of struct",
                    name: self.name().to_string(),
                    position: token.position(),
                });
            }
            self.constructor = Some(Method::new(token, owner, kind, Type::Void, 0));
            return Ok(());
        }

        if self.methods.contains_key(&token.lexeme) {
            return Err(Error::DuplicateDeclaration {
                what: "method",
                name: token.lexeme.clone(),
                position: token.position(),
            });
        }
        let method = Method::new(token, owner, kind, return_type, self.next_method_slot);
        self.next_method_slot += 1;
        self.methods.insert(method.name().to_string(), method);
        Ok(())
    }

    pub(crate) fn add_attribute(&mut self, token: Token, ty: Type, private: bool) -> Result<()> {
        if self.attributes.contains_key(&token.lexeme) {
            return Err(Error::DuplicateDeclaration {
                what: "attribute",
                name: token.lexeme.clone(),
                position: token.position(),
            });
        }
        let var = Variable::new(token, self.name(), ty, private, self.next_attribute_slot);
        self.next_attribute_slot += 1;
        self.attributes.insert(var.name().to_string(), var);
        Ok(())
    }

    /// Constructor for `MethodKind::Constructor`, otherwise the named method
    pub fn declared_method(&self, kind: MethodKind, name: &str) -> Option<&Method> {
        match kind {
            MethodKind::Constructor => self.constructor.as_ref(),
            _ => self.methods.get(name),
        }
    }

    /// Method or constructor that is currently being declared
    pub(crate) fn declared_method_mut(&mut self, kind: MethodKind, name: &str) -> Option<&mut Method> {
        match kind {
            MethodKind::Constructor => self.constructor.as_mut(),
            _ => self.methods.get_mut(name),
        }
    }

    /// Merge the parent's (already consolidated) methods into this struct.
    ///
    /// Inherited methods keep their slots; overrides take the ancestor slot;
    /// the remaining own methods are renumbered above the inherited range.
    pub(crate) fn inherit_methods(&mut self, inherited: &HashMap<String, Method>) -> Result<()> {
        if inherited.is_empty() {
            return Ok(());
        }

        let mut ancestors: Vec<&Method> = inherited.values().collect();
        ancestors.sort_by_key(|m| m.position);

        let mut overriding = HashSet::new();
        for ancestor in ancestors {
            match self.methods.get_mut(ancestor.name()) {
                None => {
                    self.methods.insert(ancestor.name().to_string(), ancestor.clone());
                }
                Some(own) => {
                    check_override(own, ancestor)?;
                    own.position = ancestor.position;
                    overriding.insert(ancestor.name().to_string());
                }
            }
        }

        let base = inherited.len();
        let name = self.name().to_string();
        let mut own: Vec<&mut Method> = self
            .methods
            .values_mut()
            .filter(|m| m.owner.as_deref() == Some(name.as_str()) && !overriding.contains(m.name()))
            .collect();
        own.sort_by_key(|m| m.position);
        for (offset, method) in own.into_iter().enumerate() {
            method.position = base + offset;
        }
        self.next_method_slot = self.methods.len();
        Ok(())
    }

    /// Merge the parent's attributes; own attributes move above them
    pub(crate) fn inherit_attributes(&mut self, inherited: &HashMap<String, Variable>) -> Result<()> {
        if inherited.is_empty() {
            return Ok(());
        }

        let mut ancestors: Vec<&Variable> = inherited.values().collect();
        ancestors.sort_by_key(|v| v.position);

        for ancestor in ancestors {
            if let Some(own) = self.attributes.get(ancestor.name()) {
                return Err(Error::DuplicateDeclaration {
                    what: "inherited attribute",
                    name: own.name().to_string(),
                    position: own.token.position(),
                });
            }
            let mut copy = ancestor.clone();
            copy.inherited = true;
            self.attributes.insert(copy.name().to_string(), copy);
        }

        let base = inherited.len();
        for var in self.attributes.values_mut().filter(|v| !v.inherited) {
            var.position += base;
        }
        self.next_attribute_slot = self.attributes.len();
        Ok(())
    }
}

fn check_override(own: &Method, ancestor: &Method) -> Result<()> {
    let declared_in = ancestor.owner().unwrap_or_default();
    let reason = if ancestor.is_static() {
        Some(format!("'{}' is static in '{}' and cannot be overridden", ancestor.name(), declared_in))
    } else if own.signature() != ancestor.signature() {
        Some(format!(
            "parameter types ({}) do not match ({}) declared in '{}'",
            join_types(&own.signature()),
            join_types(&ancestor.signature()),
            declared_in
        ))
    } else if own.return_type != ancestor.return_type {
        Some(format!(
            "return type {} does not match {} declared in '{}'",
            own.return_type, ancestor.return_type, declared_in
        ))
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidOverride {
            method: own.name().to_string(),
            reason,
            position: own.token.position(),
        }),
        None => Ok(()),
    }
}

fn join_types(types: &[Type]) -> String {
    types.iter().map(Type::to_string).collect::<Vec<_>>().join(", ")
}
