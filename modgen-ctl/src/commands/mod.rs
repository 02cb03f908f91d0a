//! Command handlers.

mod generate;
mod templates;

use std::sync::Arc;

use modgen_tooling::{BuildLog, TracingLog};

use crate::cli_config::CliConfig;
use crate::Commands;

pub(crate) fn handle_command(cmd: Commands, cli_config: &CliConfig) -> anyhow::Result<()> {
    let log: Arc<dyn BuildLog> = Arc::new(TracingLog);
    match cmd {
        Commands::Generate(args) => generate::generate(args, cli_config, log),
        Commands::Templates(args) => templates::list_templates(args, cli_config),
    }
}

/// Pick the flag value, then the configured one.
fn modules_root(flag: Option<String>, cli_config: &CliConfig) -> anyhow::Result<String> {
    flag.or_else(|| cli_config.modules_root.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no modules root: pass --modules-root or set `modules-root` in .modgen.toml")
        })
}
