//! Symbol records, the symbol table and dispatch layout

pub mod layout;
pub mod method;
pub mod structure;
pub mod table;
pub mod variable;

pub use layout::{AttributeSlot, DispatchSlot, DispatchTable};
pub use method::{Method, MethodKind};
pub use structure::{AttributeLookup, DeclarationForm, Struct};
pub use table::SymbolTable;
pub use variable::{Param, Variable};
