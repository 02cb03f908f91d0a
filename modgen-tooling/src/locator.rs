//! Modules-root locators and template directory resolution.
//!
//! A locator names where module directories live:
//!
//! - `zip:<archive>!/<root>` or `jar:file:<archive>!/<root>`: inside a zip archive
//! - `file:<path>` or a bare path: a plain directory
//!
//! Archive-backed modules are extracted into `<work_dir>/<root>/<module>` so
//! they can be read as ordinary files.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::archive::{extract_subtree, list_subtree};
use crate::error::ModuleError;
use crate::log::BuildLog;

/// Archive locator separator between the archive path and the path inside it.
const ARCHIVE_SEPARATOR: &str = "!/";

/// Where module directories live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModulesRoot {
    /// Modules are subdirectories of a directory on disk.
    Directory(PathBuf),
    /// Modules are subtrees of `root` inside a zip archive.
    Archive { archive: PathBuf, root: String },
}

/// A resolved template directory.
#[derive(Debug, Clone)]
pub struct TemplateDir {
    pub path: PathBuf,
    /// Set when the directory was produced by archive extraction.
    pub extracted: bool,
}

impl ModulesRoot {
    /// Parse a locator string, picking the variant from its scheme.
    pub fn parse(locator: &str) -> Result<Self, ResolutionError> {
        let locator = locator.trim();
        let archived = locator
            .strip_prefix("zip:")
            .or_else(|| locator.strip_prefix("jar:"));

        match archived {
            Some(rest) => {
                let (archive, root) = strip_file_scheme(rest)
                    .split_once(ARCHIVE_SEPARATOR)
                    .ok_or_else(|| ResolutionError::InvalidLocator {
                        locator: locator.to_string(),
                        reason: "archive locators need a '!/' separator",
                    })?;
                if archive.is_empty() {
                    return Err(ResolutionError::InvalidLocator {
                        locator: locator.to_string(),
                        reason: "archive path is empty",
                    });
                }
                Ok(Self::Archive {
                    archive: PathBuf::from(archive),
                    root: root.trim_matches('/').to_string(),
                })
            }
            None => {
                let path = strip_file_scheme(locator);
                if path.is_empty() {
                    return Err(ResolutionError::InvalidLocator {
                        locator: locator.to_string(),
                        reason: "path is empty",
                    });
                }
                Ok(Self::Directory(PathBuf::from(path)))
            }
        }
    }

    /// Resolve the template directory for `module_name`.
    ///
    /// Archive roots extract the module subtree under `work_dir` first. The
    /// resulting path must be an existing directory.
    pub fn resolve(
        &self,
        module_name: &str,
        work_dir: &Path,
        log: &dyn BuildLog,
    ) -> Result<TemplateDir, ModuleError> {
        match self {
            Self::Directory(root) => {
                let path = root.join(module_name);
                log.debug(&format!("module '{module_name}' resolves to {}", path.display()));
                check_directory(&path)?;
                Ok(TemplateDir {
                    path,
                    extracted: false,
                })
            }
            Self::Archive { archive, root } => {
                let prefix = archive_prefix(root, module_name);
                let dest = work_dir.join(&prefix);
                log.debug(&format!(
                    "extracting '{prefix}' from {} into {}",
                    archive.display(),
                    dest.display()
                ));

                let summary = extract_subtree(archive, &prefix, &dest)?;
                if !summary.matched {
                    return Err(ResolutionError::SubtreeMissing {
                        archive: archive.clone(),
                        prefix,
                    }
                    .into());
                }
                log.debug(&format!(
                    "extracted {} file(s) for module '{module_name}'",
                    summary.files.len()
                ));

                check_directory(&dest)?;
                Ok(TemplateDir {
                    path: dest,
                    extracted: true,
                })
            }
        }
    }

    /// Names of the templates `module_name` would apply, without touching disk
    /// beyond reading. Archive modules are inspected in place.
    pub fn template_names(&self, module_name: &str) -> Result<Vec<String>, ModuleError> {
        match self {
            Self::Directory(root) => {
                let path = root.join(module_name);
                check_directory(&path)?;
                Ok(list_templates(&path)?
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect())
            }
            Self::Archive { archive, root } => {
                let prefix = archive_prefix(root, module_name);
                let files = list_subtree(archive, &prefix)?.ok_or_else(|| {
                    ResolutionError::SubtreeMissing {
                        archive: archive.clone(),
                        prefix,
                    }
                })?;
                Ok(files
                    .iter()
                    .filter(|p| p.components().count() == 1)
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect())
            }
        }
    }
}

fn archive_prefix(root: &str, module_name: &str) -> String {
    if root.is_empty() {
        module_name.to_string()
    } else {
        format!("{root}/{module_name}")
    }
}

impl FromStr for ModulesRoot {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModulesRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::Archive { archive, root } => {
                write!(f, "zip:{}{ARCHIVE_SEPARATOR}{root}", archive.display())
            }
        }
    }
}

/// Regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories are skipped, not descended into.
pub fn list_templates(dir: &Path) -> Result<Vec<PathBuf>, ResolutionError> {
    let entries = fs::read_dir(dir).map_err(|source| ResolutionError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ResolutionError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() {
            templates.push(path);
        }
    }
    templates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(templates)
}

/// A file below a subdirectory of a module. Never applied itself, but
/// reachable from templates through `include`, `import` and `extends`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partial {
    /// Path relative to the module directory, `/`-separated.
    pub name: String,
    pub path: PathBuf,
}

/// Every regular file inside the subdirectories of `dir`, at any depth,
/// sorted by name.
pub fn list_partials(dir: &Path) -> Result<Vec<Partial>, ResolutionError> {
    let mut partials = Vec::new();
    let mut pending = vec![(dir.to_path_buf(), String::new())];
    while let Some((current, prefix)) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|source| ResolutionError::Io {
            path: current.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ResolutionError::Io {
                path: current.clone(),
                source,
            })?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                pending.push((path, format!("{prefix}{file_name}/")));
            } else if path.is_file() && !prefix.is_empty() {
                partials.push(Partial {
                    name: format!("{prefix}{file_name}"),
                    path,
                });
            }
        }
    }
    partials.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(partials)
}

fn check_directory(path: &Path) -> Result<(), ResolutionError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ResolutionError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ResolutionError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ResolutionError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn strip_file_scheme(locator: &str) -> &str {
    locator
        .strip_prefix("file://")
        .or_else(|| locator.strip_prefix("file:"))
        .unwrap_or(locator)
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("invalid modules root '{locator}': {reason}")]
    InvalidLocator {
        locator: String,
        reason: &'static str,
    },
    #[error("module directory {path} does not exist")]
    NotFound { path: PathBuf },
    #[error("modules must be directories: {path} is not one")]
    NotADirectory { path: PathBuf },
    #[error("archive {archive} has no entries under '{prefix}/'")]
    SubtreeMissing { archive: PathBuf, prefix: String },
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}
