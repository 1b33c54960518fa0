//! Conformance CLI - run the repository workbench from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Self-check against the built-in reference repository
//! conformance run
//!
//! # Seed the reference repository from a JSON type gallery
//! conformance run --types gallery.json --format json
//!
//! # Show or write configuration
//! conformance config show
//! conformance config init --path conformance.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use conformance_core::{TypeDefGallery, WorkbenchConfig};
use conformance_workbench::output::{self, OutputFormat};
use conformance_workbench::reference::{InMemoryConnector, InMemoryMetadataCollection, SAMPLE_COLLECTION_ID};
use conformance_workbench::Workbench;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "conformance.toml";

#[derive(Parser)]
#[command(name = "conformance")]
#[command(about = "Repository conformance workbench", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (human, json)
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the workbench against the in-memory reference repository
    Run {
        /// JSON type gallery to load instead of the sample type system
        #[arg(short, long)]
        types: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Destination (default: conformance.toml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            output::error(format!("{:#}", e));
            process::exit(2);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let format = OutputFormat::from(cli.format);
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    // `config init` must work even when the existing file is broken
    let config = match &cli.command {
        Commands::Config(ConfigCommands::Init { .. }) => WorkbenchConfig::default(),
        _ => WorkbenchConfig::load(&config_path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?,
    };

    init_logging(cli.verbose, &config.log_level);

    match cli.command {
        Commands::Run { types } => run_workbench(config, types.as_deref(), format, cli.verbose).await,

        Commands::Config(ConfigCommands::Show) => {
            match format {
                OutputFormat::Json => output::output_json(&config)?,
                OutputFormat::Human => print!("{}", config.export_toml()?),
            }
            Ok(0)
        }

        Commands::Config(ConfigCommands::Init { path, force }) => {
            let path = path.unwrap_or(config_path);
            if tokio::fs::try_exists(&path).await? && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config
                .save(&path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output::success(format!("Wrote default configuration to {}", path.display()));
            Ok(0)
        }
    }
}

async fn run_workbench(
    config: WorkbenchConfig,
    types: Option<&Path>,
    format: OutputFormat,
    verbose: bool,
) -> Result<i32> {
    let connector = match types {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read type gallery {}", path.display()))?;
            let gallery: TypeDefGallery = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse type gallery {}", path.display()))?;
            let collection = InMemoryMetadataCollection::new(SAMPLE_COLLECTION_ID, gallery);
            InMemoryConnector::new(Arc::new(collection))
        }
        None => InMemoryConnector::sample(),
    };

    let workbench = Workbench::new(Arc::new(connector), config);
    let result = workbench.run().await;
    output::print_result(&result, format, verbose)?;

    Ok(if result.has_failures() { 1 } else { 0 })
}

/// Initialize logging based on verbosity level and the configured log level
fn init_logging(verbose: bool, log_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("conformance_workbench=debug,conformance_core=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "conformance_workbench={level},conformance_core={level},warn",
                level = log_level
            ))
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
