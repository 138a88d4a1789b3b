//! # pie
//!
//! Command-line interface for pie request files.
//!
//! `pie lint` reports syntax errors and undefined variables as JSON, `pie request`
//! prints the fully materialized request at a given line. Nothing is sent over
//! the network. Logging goes to stderr (`RUST_LOG`) so stdout stays parseable.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use pie::config::{get_config, load_config, update_config, PieConfig};
use pie::context::RequestContext;
use pie::lint::find_lint;
use pie::materializer::build_request;
use pie::models::RequestDescriptor;
use pie::parser::parse;
use pie::source::read_source;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pie")]
#[command(about = "Lint and resolve pie HTTP request files", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON settings file holding a "pie" object
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Report syntax errors and undefined variables as JSON")]
    Lint {
        /// Request file, or - for stdin
        file: PathBuf,
    },
    #[command(about = "Print the request at a line with all variables substituted")]
    Request {
        /// Request file, or - for stdin
        file: PathBuf,
        /// 1-based line inside the request
        line: usize,
        /// Print the request as JSON
        #[arg(long)]
        raw: bool,
        /// Leave headers out of the text output
        #[arg(long)]
        no_headers: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let settings = cli.config.as_deref().map(read_settings).transpose()?;
    load_config(settings).map_err(|e| anyhow!(e))?;
    if cli.no_color {
        update_config(|config| config.color = false);
    }

    match cli.command {
        Commands::Lint { file } => lint(&file),
        Commands::Request {
            file,
            line,
            raw,
            no_headers,
        } => {
            update_config(|config| {
                config.raw |= raw;
                config.headers &= !no_headers;
            });
            request(&file, line)
        }
    }
}

fn read_settings(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn lint(file: &Path) -> Result<()> {
    let source =
        read_source(file).with_context(|| format!("Failed to read {:?}", file))?;

    let diagnostics = find_lint(&source);
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);

    if !diagnostics.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn request(file: &Path, line: usize) -> Result<()> {
    let source =
        read_source(file).with_context(|| format!("Failed to read {:?}", file))?;

    let pie_file = parse(&source).map_err(|e| anyhow!("{}: {}", file.display(), e))?;
    let context = RequestContext::create(&pie_file, line)?;
    let request = build_request(&context)?;

    print_request(&request, &get_config())
}

fn print_request(request: &RequestDescriptor, config: &PieConfig) -> Result<()> {
    if config.raw {
        println!("{}", serde_json::to_string_pretty(request)?);
        return Ok(());
    }

    colored::control::set_override(config.color);

    println!(
        "{} {}",
        request.method.as_str().green().bold(),
        request.url.bold()
    );
    if config.headers {
        for (name, value) in &request.headers {
            println!("{}: {}", name.cyan(), value);
        }
    }
    if let Some(body) = &request.body {
        println!();
        println!("{}", body);
    }
    Ok(())
}
