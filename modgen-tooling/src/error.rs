//! Errors raised while building a [`Module`](crate::Module) or translating through it.

use std::path::PathBuf;

use crate::archive::ExtractionError;
use crate::input::InputError;
use crate::locator::ResolutionError;
use crate::naming::NamingError;

/// Every failure is fatal for the operation that raised it; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid module name '{name}': {reason}")]
    InvalidModuleName { name: String, reason: &'static str },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("output naming by input requires a named input")]
    UnnamedInput,

    #[error("failed to compile template {path}: {source}")]
    TemplateCompile { path: PathBuf, source: tera::Error },

    #[error("failed to apply template {path}: {source}")]
    TemplateExecution { path: PathBuf, source: tera::Error },

    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Input(#[from] InputError),
}
