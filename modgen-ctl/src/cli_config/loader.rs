//! Config file discovery and loading for `.modgen.toml`.
//!
//! Checks, in precedence order:
//! 1. an explicit `--config` path
//! 2. `./.modgen.toml` (project-local)
//! 3. `~/.config/modgen.toml` (user-global)

use std::fmt;
use std::path::{Path, PathBuf};

use super::CliConfig;

const PROJECT_CONFIG: &str = ".modgen.toml";
const USER_CONFIG: &str = ".config/modgen.toml";

/// Where a config file was found.
#[derive(Debug)]
enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
}

impl ConfigSource {
    fn path(&self) -> &Path {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::User(p) => p,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Explicit(_) => "explicit",
            Self::Project(_) => "project",
            Self::User(_) => "user",
        };
        write!(f, "{kind} config {}", self.path().display())
    }
}

/// Load the first config found, falling back to defaults.
///
/// A file that cannot be read or parsed is reported and ignored; flags can
/// still supply everything a command needs.
pub(crate) fn load_cli_config(explicit: Option<&Path>) -> CliConfig {
    let Some(source) = discover(explicit) else {
        return CliConfig::default();
    };

    let loaded = std::fs::read_to_string(source.path())
        .map_err(|e| e.to_string())
        .and_then(|contents| parse_config(&contents).map_err(|e| e.to_string()));
    match loaded {
        Ok(config) => {
            tracing::debug!(%source, "Loaded modgen config");
            config
        }
        Err(error) => {
            tracing::warn!(%source, %error, "Ignoring unusable modgen config");
            CliConfig::default()
        }
    }
}

fn parse_config(contents: &str) -> Result<CliConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn discover(explicit: Option<&Path>) -> Option<ConfigSource> {
    if let Some(path) = explicit {
        return Some(ConfigSource::Explicit(path.to_path_buf()));
    }
    let project = PathBuf::from(PROJECT_CONFIG);
    if project.is_file() {
        return Some(ConfigSource::Project(project));
    }
    home_dir()
        .map(|home| home.join(USER_CONFIG))
        .filter(|user| user.is_file())
        .map(ConfigSource::User)
}

/// Resolve a leading `~/` against `$HOME`.
pub(crate) fn expand_path(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
