//! fxl: Command-line checker for formulas.
//!
//! Usage:
//!   fxl check [--config host.json] [--var name=type]... [--row type] <formula | --file path>
//!   fxl lower [--config host.json] [--var name=type]... <formula | --file path>
//!   fxl defs [--config host.json] <file>
//!
//! Exit status is 0 when there are no errors, 1 when the host setup
//! itself is invalid and 2 when the formulas have error diagnostics.

use clap::{Args, Parser as ClapParser, Subcommand};
use fxl_binder::RowScope;
use fxl_core::LineMap;
use fxl_diagnostics::{Diagnostic, DiagnosticCategory};
use fxl_engine::{CheckResult, DefinitionsResult, Engine};
use fxl_options::{parse_host_config_file, HostConfig, VariableDecl};
use fxl_types::DType;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(ClapParser, Debug)]
#[command(name = "fxl", version, about = "Type-check formulas against a host configuration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a single formula.
    Check(CheckArgs),
    /// Check a single formula and print only its IR.
    Lower(CheckArgs),
    /// Check a document of named formulas and functions.
    Defs(DefsArgs),
}

#[derive(Args, Debug)]
struct HostArgs {
    /// Host configuration (variables, enums, options) as JSON.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Declare a host variable, as `name=type`. May be repeated.
    #[arg(long = "var", value_name = "NAME=TYPE")]
    vars: Vec<String>,

    /// Numeric literals are floats.
    #[arg(long)]
    floats: bool,

    /// Allow `a; b` chains.
    #[arg(long)]
    chaining: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    host: HostArgs,

    /// The formula text.
    #[arg(value_name = "FORMULA", required_unless_present = "file")]
    formula: Option<String>,

    /// Read the formula from a file.
    #[arg(short = 'f', long, conflicts_with = "formula")]
    file: Option<PathBuf>,

    /// Record or table type of the row the formula is evaluated in.
    #[arg(long, value_name = "TYPE")]
    row: Option<String>,

    /// Print the lowered IR.
    #[arg(long)]
    ir: bool,
}

#[derive(Args, Debug)]
struct DefsArgs {
    #[command(flatten)]
    host: HostArgs,

    /// Document with `name = formula;` definitions.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the lowered IR of each formula.
    #[arg(long)]
    ir: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{:?}", report);
            1
        }
    };
    process::exit(exit_code);
}

/// Install a subscriber only when `RUST_LOG` asks for one.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Check(args) => run_check(args, false),
        Command::Lower(args) => run_check(args, true),
        Command::Defs(args) => run_defs(args),
    }
}

fn build_engine(args: &HostArgs) -> Result<Engine> {
    let mut config = match &args.config {
        Some(path) => parse_host_config_file(path).into_diagnostic()?,
        None => HostConfig::default(),
    };
    for var in &args.vars {
        config.variables.push(parse_var(var)?);
    }
    config.options.numbers_are_floats |= args.floats;
    config.options.allow_chaining |= args.chaining;
    Engine::from_config(&config)
        .into_diagnostic()
        .wrap_err("invalid host configuration")
}

fn parse_var(text: &str) -> Result<VariableDecl> {
    let (name, ty) = text
        .split_once('=')
        .ok_or_else(|| miette!("expected `name=type`, found `{}`", text))?;
    if name.trim().is_empty() {
        return Err(miette!("missing variable name in `{}`", text));
    }
    Ok(VariableDecl {
        name: name.trim().to_string(),
        ty: ty.trim().to_string(),
        mutable: false,
        display_name: None,
    })
}

fn parse_row(text: &str) -> Result<RowScope> {
    let ty = DType::parse(text)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid row type `{}`", text))?;
    let row = match &ty {
        DType::Record(row) | DType::Table(row) => row.clone(),
        _ => return Err(miette!("row type must be a record or a table, found `{}`", ty)),
    };
    Ok(RowScope::new(row))
}

fn run_check(args: &CheckArgs, ir_only: bool) -> Result<i32> {
    let engine = build_engine(&args.host)?;
    let (source, origin) = match (&args.formula, &args.file) {
        (_, Some(path)) => (
            std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("cannot read {}", path.display()))?,
            path.display().to_string(),
        ),
        (Some(formula), None) => (formula.clone(), "<formula>".to_string()),
        (None, None) => return Err(miette!("no formula given")),
    };
    let row = args.row.as_deref().map(parse_row).transpose()?;

    let start = Instant::now();
    let result = engine
        .check_in_row(&source, row.as_ref())
        .into_diagnostic()?;
    let elapsed = start.elapsed();

    let use_color = std::io::stderr().is_terminal();
    print_diagnostics(&origin, &source, &result.diagnostics, use_color);
    if ir_only {
        if let Some(ir) = &result.ir {
            println!("{}", ir);
        }
    } else {
        print_check(&result, args.ir);
    }
    tracing::debug!(?elapsed, "checked formula");

    Ok(exit_code(result.is_success()))
}

fn print_check(result: &CheckResult, with_ir: bool) {
    println!("type: {}", describe_type(&result.return_type));
    if !result.dependencies.is_empty() {
        let names: Vec<&str> = result.dependencies.iter().map(|n| n.as_str()).collect();
        println!("reads: {}", names.join(", "));
    }
    if with_ir {
        if let Some(ir) = &result.ir {
            println!("ir: {}", ir);
        }
    }
}

fn run_defs(args: &DefsArgs) -> Result<i32> {
    let engine = build_engine(&args.host)?;
    let source = std::fs::read_to_string(&args.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", args.file.display()))?;

    let result = engine.definitions(&source).into_diagnostic()?;
    let use_color = std::io::stderr().is_terminal();
    print_diagnostics(&args.file.display().to_string(), &source, &result.diagnostics, use_color);
    print_defs(&result, args.ir);

    Ok(exit_code(result.is_success()))
}

fn print_defs(result: &DefinitionsResult, with_ir: bool) {
    for name in &result.order {
        let Some(formula) = result.formula(name.as_str()) else {
            continue;
        };
        println!("{}: {}", formula.name, describe_type(&formula.ty));
        if with_ir {
            if let Some(ir) = &formula.ir {
                println!("  {}", ir);
            }
        }
    }
    for udf in &result.udfs {
        println!("{}", udf);
    }
}

fn describe_type(ty: &DType) -> String {
    match ty {
        DType::Record(_) | DType::Table(_) | DType::Enum(_) => ty.to_string(),
        _ => ty.kind_name().to_string(),
    }
}

fn exit_code(success: bool) -> i32 {
    if success {
        0
    } else {
        2
    }
}

fn print_diagnostics(origin: &str, source: &str, diagnostics: &[Diagnostic], use_color: bool) {
    let line_map = LineMap::new(source);
    for diag in diagnostics {
        eprintln!("{}", format_diagnostic(origin, &line_map, diag, use_color));
        for related in &diag.related_information {
            eprintln!("  {}", format_diagnostic(origin, &line_map, related, use_color));
        }
    }
}

/// `origin:line:col: error FX2001: message`, with 1-based positions.
fn format_diagnostic(origin: &str, line_map: &LineMap, diag: &Diagnostic, use_color: bool) -> String {
    let pos = line_map.line_and_column_of(diag.span.min);
    let location = format!("{}:{}:{}", origin, pos.line + 1, pos.character + 1);
    let category = diag.category.to_string();
    if use_color {
        let color = match diag.category {
            DiagnosticCategory::Error => RED,
            DiagnosticCategory::Warning => YELLOW,
            DiagnosticCategory::Message => GRAY,
        };
        format!(
            "{}{}{}: {}{}{} {}FX{}{}: {}",
            CYAN, location, RESET, BOLD, color, category, GRAY, diag.code, RESET, diag.message_text
        )
    } else {
        format!("{}: {} FX{}: {}", location, category, diag.code, diag.message_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxl_core::Span;
    use fxl_diagnostics::messages;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_var() {
        let decl = parse_var("price = n").unwrap();
        assert_eq!(decl.name, "price");
        assert_eq!(decl.ty, "n");
        assert!(parse_var("price").is_err());
        assert!(parse_var("=n").is_err());
    }

    #[test]
    fn test_parse_row_accepts_tables() {
        let row = parse_row("*[qty:n]").unwrap();
        assert_eq!(DType::Record(row.row), DType::parse("![qty:n]").unwrap());
        assert!(parse_row("n").is_err());
    }

    #[test]
    fn test_format_diagnostic_positions() {
        let source = "1 +\n  Foo";
        let line_map = LineMap::new(source);
        let diag = Diagnostic::new(Span::new(6, 9), &messages::NAME_NOT_RECOGNIZED, &["Foo"]);
        let text = format_diagnostic("f.fx", &line_map, &diag, false);
        assert!(text.starts_with("f.fx:2:3: error FX"), "{}", text);
        assert!(text.contains("Foo"));

        let note = Diagnostic::new(Span::new(0, 1), &messages::FIRST_DEFINED_HERE, &["x"]);
        let text = format_diagnostic("f.fx", &line_map, &note, false);
        assert_eq!(text, "f.fx:1:1: note FX3010: 'x' is first defined here.");
    }

    #[test]
    fn test_build_engine_from_vars() {
        let host = HostArgs {
            config: None,
            vars: vec!["price=Number".to_string()],
            floats: false,
            chaining: false,
        };
        let engine = build_engine(&host).unwrap();
        let result = engine.check("price * 2").unwrap();
        assert!(result.is_success());
        assert_eq!(exit_code(result.is_success()), 0);
    }
}
