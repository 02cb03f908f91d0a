//! Template module resolution and application.
//!
//! A *module* is a named directory of Tera templates. It lives either on disk
//! under a modules root or inside a zip archive, in which case it is extracted
//! into a working directory first. Every template in the module is applied to
//! one input document, producing one output file per template.
//!
//! # Modules
//!
//! - [`locator`]: Modules-root locators and template directory resolution
//! - [`archive`]: Extraction of a module subtree from a zip archive
//! - [`naming`]: Output file name derivation
//! - [`input`]: Buffered, format-aware input documents
//! - [`engine`]: Per-template compilation and rendering
//! - [`module`]: The [`Module`] tying resolution and application together
//! - [`log`]: The [`BuildLog`] collaborator receiving diagnostics

pub mod archive;
pub mod engine;
mod error;
mod filters;
pub mod input;
pub mod locator;
pub mod log;
pub mod module;
pub mod naming;

pub use error::ModuleError;
pub use input::{DocumentFormat, InputError, TransformInput};
pub use locator::{ModulesRoot, Partial, ResolutionError};
pub use log::{BuildLog, LogEntry, LogLevel, MemoryLog, TracingLog};
pub use module::{Module, ModuleConfig, OutputNaming};
pub use naming::{output_file_name, NamingError};
