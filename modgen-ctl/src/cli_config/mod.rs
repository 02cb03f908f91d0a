//! CLI configuration for module locations, inputs and output paths.
//!
//! Values here are defaults; command-line flags always win.

pub(crate) mod loader;

pub(crate) use loader::{expand_path, load_cli_config};

use modgen_tooling::OutputNaming;
use serde::Deserialize;

fn default_work_dir() -> String {
    "target".to_string()
}

/// Project or user configuration read from `.modgen.toml`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct CliConfig {
    /// Modules-root locator (directory path, `zip:` or `jar:file:` locator).
    pub modules_root: Option<String>,

    /// Modules to apply when `--module` is not given.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Directory receiving generated files.
    pub output_dir: Option<String>,

    /// Extraction destination for archive-backed modules. Default: "target".
    #[serde(default = "default_work_dir")]
    pub work_dir: String,

    /// Output file stem source. Default: template.
    #[serde(default)]
    pub naming: OutputNaming,

    /// Input documents to translate when none are given on the command line.
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            modules_root: None,
            modules: Vec::new(),
            output_dir: None,
            work_dir: default_work_dir(),
            naming: OutputNaming::default(),
            inputs: Vec::new(),
        }
    }
}
