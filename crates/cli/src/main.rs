//! TeamJoin command-line host.
//!
//! Loads the team directory, project roster, and snippet collections from
//! JSON files, runs a join pass over them, and writes the joined dataset
//! (with the global error report) back out as JSON. The `check` subcommand
//! runs the same pass but only reports errors, for use as a CI gate.

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use teamjoin_core::{join_site, JoinMode, SiteData};

use crate::config::JoinConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// TeamJoin command-line host.
#[derive(Parser, Debug)]
#[command(
    name = "teamjoin",
    version,
    about = "Join team, project, and snippet data into one consistent dataset"
)]
struct Cli {
    /// Path to a TOML configuration file supplying defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a join pass and write the joined dataset.
    Join(InputArgs),

    /// Run a join pass and report errors only; non-zero exit when any
    /// project's team references failed to resolve.
    Check(InputArgs),
}

/// Input / policy flags shared by the subcommands. Flags override the
/// corresponding config-file fields.
#[derive(Args, Debug, Default)]
struct InputArgs {
    /// Team directory JSON file.
    #[arg(long)]
    team: Option<PathBuf>,

    /// Project roster JSON file.
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Snippets JSON file.
    #[arg(long)]
    snippets: Option<PathBuf>,

    /// Output path for the joined dataset (stdout when unset).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Build the public view: strip private data instead of promoting it.
    #[arg(long)]
    public: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Join(args) => {
            let config = effective_config(cli.config.as_deref(), &args)?;
            init_tracing(&config.log_level);
            cmd_join(&config)
        }
        Commands::Check(args) => {
            let config = effective_config(cli.config.as_deref(), &args)?;
            init_tracing(&config.log_level);
            cmd_check(&config)
        }
    }
}

/// The configured `log_level` is the baseline; a `RUST_LOG` directive in the
/// environment takes precedence when set.
fn log_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    EnvFilter::new(rust_log.unwrap_or(level))
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref(), level))
        .with_target(false)
        .without_time()
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Merge the config file (when given) with command-line overrides.
fn effective_config(config_path: Option<&Path>, args: &InputArgs) -> Result<JoinConfig> {
    let mut config = JoinConfig::load_or_default(config_path)
        .context("failed to load configuration file")?;

    if args.team.is_some() {
        config.team = args.team.clone();
    }
    if args.projects.is_some() {
        config.projects = args.projects.clone();
    }
    if args.snippets.is_some() {
        config.snippets = args.snippets.clone();
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    if args.public {
        config.public = true;
    }

    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_join(config: &JoinConfig) -> Result<()> {
    let mut site = load_site(config)?;
    let mode = JoinMode::from_public_flag(config.public);

    let report = join_site(&mut site, mode).context("join pass failed")?;

    let mut joined = serde_json::to_value(&site).context("failed to serialize joined data")?;
    if !report.is_empty() {
        let errors = serde_json::to_value(&report)?;
        joined
            .as_object_mut()
            .context("joined dataset serialized to a non-object value")?
            .insert("errors".into(), errors);
    }

    write_output(config.output.as_deref(), &joined)?;
    info!(
        projects = site.projects.len(),
        snippet_groups = site.snippets.len(),
        projects_with_errors = report.len(),
        "joined dataset written"
    );
    Ok(())
}

fn cmd_check(config: &JoinConfig) -> Result<()> {
    let mut site = load_site(config)?;
    let mode = JoinMode::from_public_flag(config.public);

    let report = join_site(&mut site, mode).context("join pass failed")?;
    if report.is_empty() {
        println!("ok: all team references resolved");
        return Ok(());
    }

    for (project, errors) in &report {
        for error in errors {
            println!("{project}: {error}");
        }
    }
    bail!("{} project(s) have unresolved team references", report.len());
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

/// Assemble the site collections from the configured input files. Absent
/// files contribute empty collections.
fn load_site(config: &JoinConfig) -> Result<SiteData> {
    let mut site = SiteData::default();
    if let Some(path) = &config.team {
        site.team = read_json(path)?;
    }
    if let Some(path) = &config.projects {
        site.projects = read_json(path)?;
    }
    if let Some(path) = &config.snippets {
        site.snippets = read_json(path)?;
    }
    Ok(site)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse '{}'", path.display()))
}

fn write_output(path: Option<&Path>, joined: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(joined)?;
    match path {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
