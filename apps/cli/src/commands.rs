//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docbind_core::{
    GenerateConfig, GenerateResult, InputSource, ProgressReporter, RegenerateConfig,
};
use docbind_fetch::FetchOptions;
use docbind_shared::{AppConfig, init_config, load_config, validate_source};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docbind: typed bindings from an HTML API reference.
#[derive(Parser)]
#[command(
    name = "docbind",
    version,
    about = "Scrape an HTML API reference into a JSON snapshot, data models and call bindings.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape the reference page and write all artifacts.
    Generate {
        /// Reference page URL (defaults to `[source] url` from the config).
        #[arg(long, conflicts_with = "input")]
        url: Option<String>,

        /// Read the reference page from a local HTML file instead of fetching it.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to `[output] dir` from the config).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-render artifacts from a frozen snapshot, without network access.
    Regen {
        /// Directory holding the snapshot's JSON dumps.
        #[arg(long)]
        snapshot: PathBuf,

        /// Output directory (defaults to the snapshot directory).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docbind=info",
        1 => "docbind=debug",
        _ => "docbind=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate { url, input, out } => cmd_generate(url.as_deref(), input, out).await,
        Command::Regen { snapshot, out } => cmd_regen(snapshot, out),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(url: Option<&str>, input: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(url) = url {
        config.source.url = url.to_string();
    }

    let source = match input {
        Some(path) => {
            if !path.is_file() {
                return Err(eyre!("input file '{}' does not exist", path.display()));
            }
            InputSource::File(path)
        }
        None => InputSource::Url(resolve_url(&config)?),
    };

    let out_dir = out.unwrap_or_else(|| PathBuf::from(&config.output.dir));

    let generate_config = GenerateConfig {
        input: source,
        fetch: FetchOptions::from(&config.source),
        scrape: config.scrape.clone(),
        output: config.output.clone(),
        out_dir,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        source = %generate_config.input.describe(),
        out = %generate_config.out_dir.display(),
        "generating bindings"
    );

    let reporter = CliProgress::new();
    let result = docbind_core::generate(&generate_config, &reporter).await;
    reporter.clear();
    let result = result?;

    print_summary("Bindings generated", &result);
    Ok(())
}

fn cmd_regen(snapshot: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;

    if !snapshot.is_dir() {
        return Err(eyre!("snapshot '{}' is not a directory", snapshot.display()));
    }

    let regen_config = RegenerateConfig {
        out_dir: out.unwrap_or_else(|| snapshot.clone()),
        snapshot_dir: snapshot,
        output: config.output,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        snapshot = %regen_config.snapshot_dir.display(),
        out = %regen_config.out_dir.display(),
        "regenerating from snapshot"
    );

    let reporter = CliProgress::new();
    let result = docbind_core::regenerate(&regen_config, &reporter);
    reporter.clear();
    let result = result?;

    print_summary("Bindings regenerated", &result);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn resolve_url(config: &AppConfig) -> Result<Url> {
    Ok(validate_source(&config.source)?)
}

fn print_summary(headline: &str, result: &GenerateResult) {
    println!();
    println!("  {headline}!");
    println!("  Types:      {}", result.type_count);
    println!("  Operations: {}", result.operation_count);
    println!("  Source:     {}", result.manifest.source_url);
    println!("  Path:       {}", result.out_dir.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Stop the spinner whether or not the pipeline succeeded.
    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}
