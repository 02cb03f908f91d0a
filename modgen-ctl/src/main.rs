//! modgen-ctl: apply template modules to input documents.
//!
//! Stands in for a build-tool integration: it binds parameters from flags and
//! `.modgen.toml`, sets up logging and drives `modgen_tooling::Module`.

mod cli_config;
mod commands;
mod output;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use modgen_tooling::OutputNaming;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "modgen-ctl",
    version,
    about = "Generate files by applying template modules to input documents",
    styles = output::clap_styles()
)]
struct Cli {
    /// Config file (default: ./.modgen.toml, then ~/.config/modgen.toml)
    #[arg(long, global = true, env = "MODGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Apply every template of each module to each input
    Generate(GenerateArgs),
    /// List the templates a module would apply
    Templates(TemplatesArgs),
}

#[derive(Debug, Args)]
pub(crate) struct GenerateArgs {
    /// Modules-root locator: a directory, `zip:<archive>!/<root>` or `jar:file:<archive>!/<root>`
    #[arg(long)]
    pub modules_root: Option<String>,

    /// Module to apply (repeatable)
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Directory receiving generated files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Extraction directory for archive-backed modules
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Output file stem source: `template` or `input`
    #[arg(long)]
    pub naming: Option<OutputNaming>,

    /// Input documents
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct TemplatesArgs {
    /// Module to inspect
    #[arg(short, long = "module")]
    pub module: String,

    /// Modules-root locator
    #[arg(long)]
    pub modules_root: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose > 0 {
        "modgen=debug"
    } else {
        "modgen=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli_config = cli_config::load_cli_config(cli.config.as_deref());

    if let Err(e) = commands::handle_command(cli.command, &cli_config) {
        output::error(format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
