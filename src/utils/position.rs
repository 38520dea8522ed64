//! Source location tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// A line/column pair in the source text.
///
/// Built-in declarations (the root struct, `IO`, the primitive structs) are
/// anchored at `0:0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl Position {
    /// Create a new position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Position used by pre-registered declarations
    pub fn builtin() -> Self {
        Self { line: 0, column: 0 }
    }

    /// Check if this position belongs to a pre-registered declaration
    pub fn is_builtin(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
