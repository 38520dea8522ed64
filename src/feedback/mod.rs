//! Structured Feedback Module
//!
//! Machine-readable output of a `check` run:
//! - JSON error report for the single failure
//! - symbol table and typed AST snapshots on success
//! - compilation statistics

pub mod snapshot;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frontend::semantic::Analysis;
use crate::utils::Error;
use snapshot::{AstSnapshot, TableSnapshot};

// ==================== Structured Error Report ====================

/// A structured error report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code (e.g., "E0001")
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Location information; absent for built-in anchors
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl ErrorReport {
    /// Create an error report from a semantic error
    pub fn from_error(error: &Error, file_name: &str) -> Self {
        let position = error.position();
        let location = (!position.is_builtin()).then(|| Location {
            file: file_name.to_string(),
            line: position.line,
            column: position.column,
        });
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            location,
        }
    }
}

// ==================== Compilation Feedback ====================

/// Complete result of a `check` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationFeedback {
    /// Compilation status
    pub success: bool,

    /// Source file
    pub source_file: String,

    /// At most one error: analysis stops at the first failure
    pub diagnostics: Vec<ErrorReport>,

    /// Compilation statistics
    pub stats: CompilationStats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableSnapshot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<AstSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationStats {
    /// Semantic analysis time in milliseconds
    pub semantic_time_ms: u64,

    /// Number of user-declared structs
    pub struct_count: usize,

    /// Number of checked method bodies
    pub body_count: usize,

    /// Number of structs created with `new`
    pub instantiated_count: usize,
}

impl CompilationStats {
    /// Whole milliseconds, saturating at `u64::MAX`
    pub fn millis(elapsed: Duration) -> u64 {
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn from_analysis(analysis: &Analysis, semantic_time_ms: u64) -> Self {
        let user_structs = analysis
            .table
            .structs_sorted()
            .into_iter()
            .filter(|s| !s.is_builtin());
        let (mut struct_count, mut instantiated_count) = (0, 0);
        for entry in user_structs {
            struct_count += 1;
            if entry.is_instantiated() {
                instantiated_count += 1;
            }
        }
        Self {
            semantic_time_ms,
            struct_count,
            body_count: analysis.ast.bodies.len(),
            instantiated_count,
        }
    }
}

impl CompilationFeedback {
    /// Create a successful feedback carrying both snapshots
    pub fn success(source_file: String, analysis: &Analysis, stats: CompilationStats) -> Self {
        Self {
            success: true,
            source_file,
            diagnostics: vec![],
            stats,
            table: Some(TableSnapshot::from_table(&analysis.table)),
            ast: Some(AstSnapshot::from_ast(&analysis.ast)),
        }
    }

    /// Create a failed feedback
    pub fn failure(source_file: String, error: &Error, stats: CompilationStats) -> Self {
        let diagnostics = vec![ErrorReport::from_error(error, &source_file)];
        Self {
            success: false,
            source_file,
            diagnostics,
            stats,
            table: None,
            ast: None,
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
