use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use cmdbind_core::{ParserRegistry, Schema, SchemaDocument, render_help};

const SCHEMA_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Parser)]
#[command(name = "cmdbind")]
#[command(version)]
#[command(about = "Check argument schemas and bind command lines against them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build and validate one or more schema documents.
    Check(CheckArgs),
    /// Print the usage text for a schema document.
    Usage(UsageArgs),
    /// Bind a token list against a schema and print the values as JSON.
    Bind(BindArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema files and/or directories containing schema files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Schema file (.json, .yaml or .yml).
    file: PathBuf,
}

#[derive(Debug, Args)]
struct BindArgs {
    /// Schema file (.json, .yaml or .yml).
    file: PathBuf,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
    /// Tokens to bind, given after `--`.
    #[arg(last = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Check(args) => run_check(args).map(|()| 0),
        Command::Usage(args) => run_usage(args).map(|()| 0),
        Command::Bind(args) => run_bind(args),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let paths = collect_schema_paths(&args.inputs)?;
    for path in &paths {
        load_schema(path)?;
    }
    println!("Validated {} schema file(s).", paths.len());
    Ok(())
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let schema = load_schema(&args.file)?;
    print!("{}", render_help(&schema));
    Ok(())
}

/// Returns the process exit code: 0 for bound values or a help request,
/// 1 when binding failed.
fn run_bind(args: BindArgs) -> Result<i32, String> {
    let schema = load_schema(&args.file)?;

    match schema.bind(args.tokens.as_slice()) {
        Ok(bound) => {
            let json = bound.to_json();
            let rendered = if args.pretty {
                serde_json::to_string_pretty(&json)
            } else {
                serde_json::to_string(&json)
            }
            .map_err(|e| format!("failed to serialize bound values: {e}"))?;
            println!("{rendered}");
            Ok(0)
        }
        Err(errors) if errors.is_help_request() => {
            print!("{}", render_help(&schema));
            Ok(errors.exit_code())
        }
        Err(errors) => {
            for err in errors.errors() {
                eprintln!("{err}");
            }
            eprintln!();
            eprint!("{}", render_help(&schema));
            Ok(errors.exit_code())
        }
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext))
}

fn collect_schema_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .map_err(|e| format!("failed to read '{}': {e}", input.display()))?;
            for entry in entries {
                let path = entry
                    .map_err(|e| format!("failed to read '{}': {e}", input.display()))?
                    .path();
                if is_schema_file(&path) {
                    paths.insert(path);
                }
            }
            continue;
        }

        if input.is_file() {
            if !is_schema_file(input) {
                return Err(format!(
                    "schema file '{}' must end in .json, .yaml or .yml",
                    input.display()
                ));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(format!("schema path '{}' does not exist", input.display()));
    }

    if paths.is_empty() {
        return Err("no schema files found in provided paths".to_string());
    }

    Ok(paths.into_iter().collect())
}

fn load_document(path: &Path) -> Result<SchemaDocument, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    match ext {
        "json" => serde_json::from_str(&text).map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
        _ => Err("expected a .json, .yaml or .yml file".to_string()),
    }
    .map_err(|e| format!("failed to load '{}': {e}", path.display()))
}

/// Loads and builds a schema; the program name falls back to the file stem.
fn load_schema(path: &Path) -> Result<Schema, String> {
    let mut document = load_document(path)?;
    if document.program.is_none() {
        document.program = path
            .file_stem()
            .and_then(OsStr::to_str)
            .map(str::to_string);
    }
    document
        .build(&ParserRegistry::with_builtins())
        .map_err(|e| format!("invalid schema '{}': {e}", path.display()))
}
