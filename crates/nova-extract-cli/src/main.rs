use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nova_extract_class::{
    check_extraction, synthesize_with_report, CodeStyleNaming, ExtractClassConfig,
    ExtractClassError, ExtractionContext, LoggingConfig, MemberSetBuilder,
};
use nova_extract_hir::{DeclId, DeclKind, SourceFile};
use serde::Serialize;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(
    name = "nova-extract-class",
    version,
    about = "Extract members of a Java class into a new class"
)]
struct Cli {
    /// Java source file containing the class
    file: PathBuf,
    /// Class to extract from (simple or qualified name)
    #[arg(long)]
    class: String,
    /// Name of the new class
    #[arg(long)]
    name: String,
    /// Package of the new class (defaults to the source file's package)
    #[arg(long)]
    package: Option<String>,
    /// Field to move
    #[arg(long = "field", value_name = "FIELD")]
    fields: Vec<String>,
    /// Method to move (all overloads)
    #[arg(long = "method", value_name = "METHOD")]
    methods: Vec<String>,
    /// Nested class to move
    #[arg(long = "inner", value_name = "CLASS")]
    inner: Vec<String>,
    /// Nested class to move and make public
    #[arg(long = "public-inner", value_name = "CLASS")]
    public_inner: Vec<String>,
    /// Initializer block to move, by 0-based index
    #[arg(long = "initializer", value_name = "INDEX")]
    initializers: Vec<usize>,
    /// Interface the new class implements
    #[arg(long = "interface", value_name = "NAME")]
    interfaces: Vec<String>,
    /// Moved field that gets a getter
    #[arg(long = "getter", value_name = "FIELD")]
    getters: Vec<String>,
    /// Moved field that gets a setter
    #[arg(long = "setter", value_name = "FIELD")]
    setters: Vec<String>,
    /// Path to an `extract-class.toml` config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only run the pre-flight checks; exits 1 when any problem is found
    #[arg(long)]
    check: bool,
    /// Emit JSON suitable for tooling
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => ExtractClassConfig::load_from_path(path)?,
        None => ExtractClassConfig::default(),
    };
    init_tracing(&config.logging);

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let file = nova_extract_syntax::lower(&source)
        .with_context(|| format!("failed to parse {}", cli.file.display()))?;

    let ctx = extraction_context(&file, &cli)?;
    let naming = CodeStyleNaming::new(config.naming);

    if cli.check {
        let problems: Vec<String> = check_extraction(&file, &ctx, &naming)
            .iter()
            .map(ToString::to_string)
            .collect();
        let exit = if problems.is_empty() { 0 } else { 1 };
        if cli.json {
            print_json(&CheckReport { problems })?;
        } else {
            for problem in &problems {
                println!("error: {problem}");
            }
        }
        return Ok(exit);
    }

    let report = synthesize_with_report(&file, &ctx, &naming);
    if cli.json {
        print_json(&report)?;
    } else {
        print!("{}", report.text);
    }
    Ok(0)
}

fn extraction_context(file: &SourceFile, cli: &Cli) -> Result<ExtractionContext> {
    let mut builder = MemberSetBuilder::for_class(file, &cli.class)?;
    for field in &cli.fields {
        builder.field(field)?;
    }
    for method in &cli.methods {
        builder.method(method)?;
    }
    for inner in &cli.inner {
        builder.inner_class(inner, false)?;
    }
    for inner in &cli.public_inner {
        builder.inner_class(inner, true)?;
    }
    for index in &cli.initializers {
        builder.initializer(*index)?;
    }
    for interface in &cli.interfaces {
        builder.interface(interface.as_str());
    }
    builder.all_type_params();

    let class = builder.class();
    let getters = lookup_fields(file, class, &cli.getters)?;
    let setters = lookup_fields(file, class, &cli.setters)?;
    let mut ctx = ExtractionContext::new(file, class, cli.name.as_str(), builder.build())
        .with_getters(getters)
        .with_setters(setters);
    if cli.package.is_some() {
        ctx = ctx.with_package(cli.package.clone());
    }
    Ok(ctx)
}

fn lookup_fields(file: &SourceFile, class: DeclId, names: &[String]) -> Result<Vec<DeclId>> {
    names
        .iter()
        .map(|name| {
            file.find_member(class, name, DeclKind::Field).ok_or_else(|| {
                ExtractClassError::MemberNotFound {
                    class: file.decl(class).name.clone(),
                    member: name.clone(),
                }
                .into()
            })
        })
        .collect()
}

fn init_tracing(logging: &LoggingConfig) {
    let layer = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    };
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(logging.env_filter())
        .try_init();
}

#[derive(Serialize)]
struct CheckReport {
    problems: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
