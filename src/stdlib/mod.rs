//! Built-in declarations

pub mod builtins;
