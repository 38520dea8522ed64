//! Frontend module - Tokens, AST hand-off, Semantic Analysis

pub mod ast;
pub mod semantic;
pub mod token;
pub mod typeck;
