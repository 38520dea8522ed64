//! structc - semantic core of a small struct-based language
//!
//! Takes a parsed program, builds the symbol table, resolves single
//! inheritance and type checks every method body.

pub mod feedback;
pub mod frontend;
pub mod stdlib;
pub mod symbols;
pub mod types;
pub mod utils;

pub use frontend::semantic::{Analysis, SemanticAnalyzer};
pub use symbols::{DispatchTable, SymbolTable};
pub use utils::{Error, Result};
