//! Axenlang frontend driver
//!
//! Parses a source file and reports diagnostics; optionally dumps the AST or
//! the canonical source form.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use axen_lang::frontend::diagnostics::{line_col, Diagnostic};
use axen_lang::frontend::parser;
use axen_lang::frontend::printer;

/// Axenlang frontend
#[derive(Parser, Debug)]
#[command(name = "axenc")]
#[command(author = "Arsoniv")]
#[command(version = "0.1.0")]
#[command(about = "Axenlang frontend - lexer, parser and AST")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file (.axn)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Print the parsed AST in debug form
    #[arg(long)]
    emit_ast: bool,

    /// Print the canonical source form of the parsed AST
    #[arg(long)]
    emit_source: bool,

    /// Report diagnostics as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a source file and report errors, without any output on success
    Check {
        /// Input source file
        input: PathBuf,

        /// Report diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Check { input, json }) => {
            let had_errors = run_file(input, *json, false, false)?;
            if !had_errors {
                println!("{}: no errors found", input.display());
            }
            process::exit(if had_errors { 1 } else { 0 });
        }
        Some(Commands::Version) => {
            println!("axenc 0.1.0");
            println!("Axenlang frontend");
            println!("License: MIT");
            Ok(())
        }
        None => {
            let Some(input) = &cli.input else {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: axenc <FILE> or axenc check <FILE>");
                process::exit(1);
            };
            let had_errors = run_file(input, cli.json, cli.emit_ast, cli.emit_source)?;
            process::exit(if had_errors { 1 } else { 0 });
        }
    }
}

/// Parse one file, render its diagnostics, and optionally dump the AST.
/// Returns whether any diagnostics were produced.
fn run_file(input: &Path, json: bool, emit_ast: bool, emit_source: bool) -> Result<bool> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let result = parser::parse(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&result.diagnostics)?);
    } else {
        for diag in &result.diagnostics {
            render_diagnostic(input, &source, diag);
        }
    }

    if emit_ast {
        println!("{:#?}", result.file);
    }
    if emit_source {
        print!("{}", printer::unparse(&result.file));
    }

    Ok(!result.diagnostics.is_empty())
}

fn render_diagnostic(input: &Path, source: &str, diag: &Diagnostic) {
    let (line, col) = line_col(source, diag.span.start);
    let kind = match diag.kind {
        axen_lang::DiagKind::Lex => "lex error",
        axen_lang::DiagKind::Syntax => "syntax error",
    };
    eprintln!("{}:{}:{}: {}: {}", input.display(), line, col, kind, diag.message);
}
