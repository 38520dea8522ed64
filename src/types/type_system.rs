//! Type System

use std::fmt;

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveType {
    Int,
    Str,
    Char,
    Bool,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 4] = [Self::Int, Self::Str, Self::Char, Self::Bool];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Int" => Some(Self::Int),
            "Str" => Some(Self::Str),
            "Char" => Some(Self::Char),
            "Bool" => Some(Self::Bool),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Str => "Str",
            Self::Char => "Char",
            Self::Bool => "Bool",
        }
    }

    /// Name of the built-in array struct holding elements of this type
    pub fn array_name(&self) -> &'static str {
        match self {
            Self::Int => "Array Int",
            Self::Str => "Array Str",
            Self::Char => "Array Char",
            Self::Bool => "Array Bool",
        }
    }
}

/// Resolved type of a declaration or expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveType),
    /// Array of a primitive element type
    Array(PrimitiveType),
    /// Type of a literal constant; assignable to its primitive
    Literal(PrimitiveType),
    /// User-defined or built-in struct, by name
    Struct(String),
    Nil,
    Void,
}

impl Type {
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);
    pub const STR: Self = Self::Primitive(PrimitiveType::Str);
    pub const CHAR: Self = Self::Primitive(PrimitiveType::Char);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);

    /// Resolve a declared type name (`Int`, `Array Str`, `void`, `Point`)
    pub fn from_name(name: &str) -> Self {
        if name == "void" {
            return Self::Void;
        }
        if let Some(primitive) = PrimitiveType::from_name(name) {
            return Self::Primitive(primitive);
        }
        if let Some(elem) = name.strip_prefix("Array ") {
            if let Some(primitive) = PrimitiveType::from_name(elem.trim()) {
                return Self::Array(primitive);
            }
        }
        Self::Struct(name.to_string())
    }

    /// Primitive behind a primitive or literal type
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            Self::Primitive(p) | Self::Literal(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Int)
    }

    pub fn is_bool(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Bool)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Drop the literal marker
    pub fn unliteral(&self) -> Type {
        match self {
            Self::Literal(p) => Self::Primitive(*p),
            other => other.clone(),
        }
    }

    /// Name of the registry struct that owns the members of this type
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) => Some(name),
            Self::Primitive(p) | Self::Literal(p) => Some(p.name()),
            Self::Array(p) => Some(p.array_name()),
            Self::Nil | Self::Void => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Array(p) => f.write_str(p.array_name()),
            Self::Literal(p) => write!(f, "literal {}", p.name()),
            Self::Struct(name) => f.write_str(name),
            Self::Nil => f.write_str("nil"),
            Self::Void => f.write_str("void"),
        }
    }
}
