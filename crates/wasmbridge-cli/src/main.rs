//! wasmbridge CLI
//!
//! - `plan`: descriptor set JSON → generation plan JSON
//! - `check-config`: validate filter configuration on its own

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wasmbridge_core::config::split_list;
use wasmbridge_core::{build_generation_plan, DescriptorSet, FilterCriteria};

mod settings;

use settings::ConfigArgs;

#[derive(Parser)]
#[command(name = "wasmbridge")]
#[command(author, version, about = "Plan TypeScript/WASM bindings from protobuf descriptor sets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the generation plan for a descriptor set.
    ///
    /// The input is the JSON form of a `FileDescriptorSet` or
    /// `CodeGeneratorRequest` (`buf build --as-file-descriptor-set -o x.json`).
    Plan {
        /// Descriptor JSON file, or `-` for stdin
        descriptor: PathBuf,

        /// Comma-separated proto files to generate (overrides `fileToGenerate`)
        #[arg(long)]
        files: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output plan JSON (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate configuration (patterns, renames, toggles) without a descriptor.
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<()> {
    // logs go to stderr; stdout is reserved for the plan
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wasmbridge=info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Plan {
            descriptor,
            files,
            config,
            out,
        } => cmd_plan(&descriptor, files.as_deref(), &config, out.as_deref()),
        Commands::CheckConfig { config } => cmd_check_config(&config),
    }
}

fn read_descriptor(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read descriptor from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_plan(
    descriptor: &Path,
    files: Option<&str>,
    config_args: &ConfigArgs,
    out: Option<&Path>,
) -> Result<()> {
    let text = read_descriptor(descriptor)?;
    let mut set = DescriptorSet::from_json(&text)
        .with_context(|| format!("invalid descriptor set {}", descriptor.display()))?;
    if let Some(files) = files {
        set.set_files_to_generate(split_list(files));
    }
    debug!(files = set.file.len(), "loaded descriptor set");

    let config = config_args.resolve(set.parameter.as_deref())?;
    let criteria = FilterCriteria::from_config(&config)?;
    let plan = build_generation_plan(&set, &criteria)?;

    let json = serde_json::to_string_pretty(&plan)?;
    match out {
        Some(path) => {
            fs::write(path, json + "\n").with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    eprintln!("{} {}", "ok".green().bold(), plan.stats.summary());
    for package in &plan.packages {
        eprintln!(
            "  {} {} services, {} messages, {} enums, {} dependencies",
            package.name.cyan(),
            package.services.len(),
            package.messages.len(),
            package.enums.len(),
            package.factory_dependencies.len()
        );
    }
    Ok(())
}

fn cmd_check_config(config_args: &ConfigArgs) -> Result<()> {
    let config = config_args.resolve(None)?;
    let criteria = FilterCriteria::from_config(&config)?;

    eprintln!("{}", "Configuration valid.".green());
    let services = if criteria.services.is_restricted() {
        split_list(&config.services).join(", ")
    } else {
        "all".to_string()
    };
    eprintln!("  Services: {}", services.cyan());
    eprintln!("  Include patterns: {}", criteria.method_include.len());
    eprintln!("  Exclude patterns: {}", criteria.method_exclude.len());
    eprintln!("  Renames: {}", criteria.method_renames.len());
    eprintln!("  Type mappings: {}", criteria.type_mappings.len());
    Ok(())
}
