//! Built-in Structs Registry
//!
//! Defines the structs every compilation unit starts with: the root `Object`,
//! the static `IO` helpers, the primitive structs and the primitive arrays.

use std::collections::HashMap;

use crate::frontend::token::{Token, TokenKind};
use crate::symbols::method::MethodKind;
use crate::symbols::structure::Struct;
use crate::types::{PrimitiveType, Type};

/// Name of the root of the inheritance tree
pub const ROOT: &str = "Object";

/// Name of the static input/output struct
pub const IO: &str = "IO";

/// Built-in method signature
#[derive(Debug, Clone)]
struct BuiltinMethod {
    name: &'static str,
    params: Vec<(&'static str, Type)>,
    ret_type: Type,
    kind: MethodKind,
}

impl BuiltinMethod {
    fn new(name: &'static str, params: Vec<(&'static str, Type)>, ret_type: Type, kind: MethodKind) -> Self {
        Self {
            name,
            params,
            ret_type,
            kind,
        }
    }
}

/// Check if a struct name is reserved by a built-in struct
pub fn is_builtin(name: &str) -> bool {
    name == ROOT
        || name == IO
        || name == "Array"
        || PrimitiveType::ALL
            .iter()
            .any(|p| p.name() == name || p.array_name() == name)
}

/// Check if a struct name may not be used as a parent
pub fn is_sealed(name: &str) -> bool {
    name != ROOT && is_builtin(name)
}

/// Create every built-in struct, keyed by name
pub fn builtin_structs() -> HashMap<String, Struct> {
    let mut structs = HashMap::new();
    let root = Struct::builtin(Token::builtin(TokenKind::StructId, ROOT), None);
    structs.insert(ROOT.to_string(), root);

    register(&mut structs, IO, TokenKind::StructId, io_methods());
    for primitive in PrimitiveType::ALL {
        register(&mut structs, primitive.name(), primitive_kind(primitive), primitive_methods(primitive));
        register(&mut structs, primitive.array_name(), TokenKind::ArrayType, array_methods());
    }
    structs
}

fn register(
    structs: &mut HashMap<String, Struct>,
    name: &str,
    kind: TokenKind,
    methods: Vec<BuiltinMethod>,
) {
    let mut entry = Struct::builtin(Token::builtin(kind, name), Some(ROOT.to_string()));
    for method in methods {
        let token = Token::builtin(TokenKind::ObjectId, method.name);
        let added = entry.add_method(token, method.kind, method.ret_type);
        debug_assert!(added.is_ok(), "duplicate built-in method {}.{}", name, method.name);
        for (param, ty) in method.params {
            if let Some(declared) = entry.declared_method_mut(method.kind, method.name) {
                let added = declared.add_param(Token::builtin(TokenKind::ObjectId, param), ty);
                debug_assert!(added.is_ok(), "duplicate parameter {} of built-in {}.{}", param, name, method.name);
            }
        }
    }
    if let Some(root) = structs.get_mut(ROOT) {
        root.children.insert(name.to_string());
    }
    structs.insert(name.to_string(), entry);
}

fn io_methods() -> Vec<BuiltinMethod> {
    let out = |name, ty: Type| BuiltinMethod::new(name, vec![("value", ty)], Type::Void, MethodKind::Static);
    let input = |name, ty: Type| BuiltinMethod::new(name, vec![], ty, MethodKind::Static);
    vec![
        out("out_str", Type::STR),
        out("out_int", Type::INT),
        out("out_bool", Type::BOOL),
        out("out_char", Type::CHAR),
        out("out_array_int", Type::Array(PrimitiveType::Int)),
        out("out_array_str", Type::Array(PrimitiveType::Str)),
        out("out_array_bool", Type::Array(PrimitiveType::Bool)),
        out("out_array_char", Type::Array(PrimitiveType::Char)),
        input("in_str", Type::STR),
        input("in_int", Type::INT),
        input("in_bool", Type::BOOL),
        input("in_char", Type::CHAR),
    ]
}

fn primitive_methods(primitive: PrimitiveType) -> Vec<BuiltinMethod> {
    match primitive {
        PrimitiveType::Str => vec![
            BuiltinMethod::new("length", vec![], Type::INT, MethodKind::Instance),
            BuiltinMethod::new("concat", vec![("other", Type::STR)], Type::STR, MethodKind::Instance),
        ],
        _ => vec![],
    }
}

fn array_methods() -> Vec<BuiltinMethod> {
    vec![BuiltinMethod::new("length", vec![], Type::INT, MethodKind::Instance)]
}

fn primitive_kind(primitive: PrimitiveType) -> TokenKind {
    match primitive {
        PrimitiveType::Int => TokenKind::IntType,
        PrimitiveType::Str => TokenKind::StrType,
        PrimitiveType::Char => TokenKind::CharType,
        PrimitiveType::Bool => TokenKind::BoolType,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert!(is_builtin("Object"));
        assert!(is_builtin("Array Int"));
        assert!(is_sealed("IO"));
        assert!(is_sealed("Bool"));
        assert!(!is_sealed("Object"));
        assert!(!is_builtin("Point"));
    }

    #[test]
    fn test_builtin_structs() {
        let structs = builtin_structs();
        assert_eq!(structs.len(), 10);

        let io = &structs[IO];
        assert!(io.is_builtin());
        assert_eq!(io.parent(), Some(ROOT));
        let out_int = io.method("out_int").unwrap();
        assert!(out_int.is_static());
        assert_eq!(out_int.signature(), vec![Type::INT]);
        assert_eq!(io.method("in_char").unwrap().return_type(), &Type::CHAR);

        let concat = structs["Str"].method("concat").unwrap();
        assert!(!concat.is_static());
        assert_eq!(concat.position(), 1);
        assert!(structs[ROOT].children().any(|c| c == "Array Bool"));
    }

    #[test]
    fn test_every_builtin_method_is_registered() {
        let structs = builtin_structs();
        let mut expected = vec![(IO, io_methods())];
        for primitive in PrimitiveType::ALL {
            expected.push((primitive.name(), primitive_methods(primitive)));
            expected.push((primitive.array_name(), array_methods()));
        }
        for (owner, methods) in expected {
            for method in methods {
                let declared = structs[owner].method(method.name).unwrap();
                let params: Vec<Type> = method.params.into_iter().map(|(_, ty)| ty).collect();
                assert_eq!(declared.signature(), params, "{}.{}", owner, method.name);
                assert_eq!(declared.return_type(), &method.ret_type);
            }
        }
    }
}
