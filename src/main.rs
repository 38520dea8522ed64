//! structc
//!
//! Command-line driver: reads a parsed program (JSON), runs the semantic
//! analysis and writes the symbol table and typed AST snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use structc::feedback::snapshot::{AstSnapshot, TableSnapshot};
use structc::feedback::{CompilationFeedback, CompilationStats};
use structc::frontend::ast::Program;
use structc::SemanticAnalyzer;

/// structc semantic checker
#[derive(Parser, Debug)]
#[command(name = "structc")]
#[command(version = "0.1.0")]
#[command(about = "Semantic analysis for a small struct-based language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a parsed program and export its snapshots
    Check {
        /// Parsed program (JSON)
        input: PathBuf,

        /// Symbol table snapshot path (default: <stem>.ts.json)
        #[arg(long, value_name = "PATH")]
        table: Option<PathBuf>,

        /// Typed AST snapshot path (default: <stem>.ast.json)
        #[arg(long, value_name = "PATH")]
        ast: Option<PathBuf>,

        /// Print a structured JSON report instead of text
        #[arg(long)]
        json: bool,

        /// Print the dispatch layout of every user struct
        #[arg(long)]
        emit_layout: bool,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check {
            input,
            table,
            ast,
            json,
            emit_layout,
        } => match check_file(&input, table, ast, json, emit_layout) {
            Ok(true) => {}
            Ok(false) => process::exit(1),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                process::exit(2);
            }
        },
        Commands::Version => {
            println!("structc 0.1.0");
            println!("License: Apache-2.0");
        }
    }
}

/// Default snapshot path next to the input: `<stem><suffix>`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("program");
    input.with_file_name(format!("{}{}", stem, suffix))
}

/// Returns whether the program passed the analysis
fn check_file(
    input: &Path,
    table_path: Option<PathBuf>,
    ast_path: Option<PathBuf>,
    json: bool,
    emit_layout: bool,
) -> Result<bool> {
    let source = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let program: Program =
        serde_json::from_str(&source).with_context(|| format!("parsing program in {}", input.display()))?;
    let source_file = input.display().to_string();
    if !json {
        println!("Checking: {} ({} items)", source_file, program.items.len());
    }

    let started = Instant::now();
    let result = SemanticAnalyzer::new().analyze(program);
    let elapsed = CompilationStats::millis(started.elapsed());

    let analysis = match result {
        Ok(analysis) => analysis,
        Err(e) => {
            let stats = CompilationStats {
                semantic_time_ms: elapsed,
                ..CompilationStats::default()
            };
            if json {
                println!("{}", CompilationFeedback::failure(source_file, &e, stats).to_json());
            } else {
                eprintln!("{}:{}: {} [{}]", source_file, e.position(), e, e.code());
            }
            return Ok(false);
        }
    };

    let table_path = table_path.unwrap_or_else(|| sibling(input, ".ts.json"));
    let ast_path = ast_path.unwrap_or_else(|| sibling(input, ".ast.json"));
    fs::write(&table_path, TableSnapshot::from_table(&analysis.table).to_json())
        .with_context(|| format!("writing {}", table_path.display()))?;
    fs::write(&ast_path, AstSnapshot::from_ast(&analysis.ast).to_json())
        .with_context(|| format!("writing {}", ast_path.display()))?;

    if emit_layout {
        for entry in analysis.table.structs_sorted().into_iter().filter(|s| !s.is_builtin()) {
            if let Some(layout) = analysis.table.dispatch_table(entry.name()) {
                println!("{}", layout);
            }
        }
    }

    let stats = CompilationStats::from_analysis(&analysis, elapsed);
    if json {
        println!("{}", CompilationFeedback::success(source_file, &analysis, stats).to_json());
    } else {
        println!("  [✓] {} structs, {} bodies checked", stats.struct_count, stats.body_count);
        println!("  [✓] Wrote {}", table_path.display());
        println!("  [✓] Wrote {}", ast_path.display());
    }
    Ok(true)
}
