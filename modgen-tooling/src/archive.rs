//! Extraction of a module subtree from a zip archive.
//!
//! Only entries under the requested prefix are copied. Relative paths below the
//! prefix are preserved and existing destination files are never overwritten.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use zip::read::ZipArchive;
use zip::result::ZipError;

/// What an extraction run touched.
#[derive(Debug, Default)]
pub struct ExtractSummary {
    /// Whether any entry (file or directory) lived under the prefix.
    pub matched: bool,
    /// Extracted files, relative to the destination directory.
    pub files: Vec<PathBuf>,
}

/// Copy every entry under `prefix` in `archive_path` into `dest`.
///
/// `prefix` uses `/` separators and names a directory inside the archive. When
/// at least one entry matches, `dest` is created even if the subtree holds no
/// files. A destination file that already exists fails the extraction.
pub fn extract_subtree(
    archive_path: &Path,
    prefix: &str,
    dest: &Path,
) -> Result<ExtractSummary, ExtractionError> {
    let file = File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(|source| ExtractionError::Zip {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let prefix_path = Path::new(prefix);
    let mut summary = ExtractSummary::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ExtractionError::Zip {
                path: archive_path.to_path_buf(),
                source,
            })?;

        let Some(relative) = relative_to_prefix(entry.name(), prefix_path)? else {
            continue;
        };
        let relative = relative.to_path_buf();

        if !summary.matched {
            create_dir_all(dest)?;
            summary.matched = true;
        }

        let target = dest.join(&relative);
        if entry.is_dir() {
            create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|source| ExtractionError::Io {
                path: target.clone(),
                source,
            })?;
        io::copy(&mut entry, &mut out).map_err(|source| ExtractionError::Io {
            path: target.clone(),
            source,
        })?;

        summary.files.push(relative);
    }

    Ok(summary)
}

/// File entries under `prefix`, relative to it, without extracting anything.
///
/// Returns `None` when no entry lives under the prefix.
pub fn list_subtree(
    archive_path: &Path,
    prefix: &str,
) -> Result<Option<Vec<PathBuf>>, ExtractionError> {
    let file = File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let archive = ZipArchive::new(file).map_err(|source| ExtractionError::Zip {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let prefix_path = Path::new(prefix);
    let mut matched = false;
    let mut files = Vec::new();
    for name in archive.file_names() {
        let Some(relative) = relative_to_prefix(name, prefix_path)? else {
            continue;
        };
        matched = true;
        if !name.ends_with('/') && !relative.as_os_str().is_empty() {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(matched.then_some(files))
}

/// The part of entry `name` below `prefix`, or `None` when the entry lives
/// elsewhere. Prefix matching is per path component, so `json` never matches
/// `jsonx/...`. Below the prefix only plain names are allowed.
fn relative_to_prefix<'a>(
    name: &'a str,
    prefix: &Path,
) -> Result<Option<&'a Path>, ExtractionError> {
    let Ok(relative) = Path::new(name).strip_prefix(prefix) else {
        return Ok(None);
    };
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(ExtractionError::UnsafeEntry {
            name: name.to_string(),
        });
    }
    Ok(Some(relative))
}

fn create_dir_all(path: &Path) -> Result<(), ExtractionError> {
    fs::create_dir_all(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("failed to open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("invalid archive {path}: {source}")]
    Zip { path: PathBuf, source: ZipError },
    #[error("archive entry '{name}' escapes the extraction directory")]
    UnsafeEntry { name: String },
    #[error("failed to extract {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_archive(path: &Path, entries: &[(&str, Option<&str>)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            match content {
                Some(body) => {
                    zip.start_file(*name, options).unwrap();
                    zip.write_all(body.as_bytes()).unwrap();
                }
                None => zip.add_directory(*name, options).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extracts_only_prefixed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(
            &archive,
            &[
                ("modules/json/schema.tera", Some("{{ module }}")),
                ("modules/json/nested/part.tera", Some("part")),
                ("modules/jsonx/other.tera", Some("other")),
                ("modules/cpp/header.tera", Some("cpp")),
            ],
        );

        let dest = dir.path().join("work/modules/json");
        let summary = extract_subtree(&archive, "modules/json", &dest).unwrap();

        assert!(summary.matched);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(
            fs::read_to_string(dest.join("schema.tera")).unwrap(),
            "{{ module }}"
        );
        assert_eq!(
            fs::read_to_string(dest.join("nested/part.tera")).unwrap(),
            "part"
        );
        assert!(!dir.path().join("work/modules/jsonx").exists());
    }

    #[test]
    fn test_directory_only_subtree_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(&archive, &[("modules/empty/", None)]);

        let dest = dir.path().join("out");
        let summary = extract_subtree(&archive, "modules/empty", &dest).unwrap();
        assert!(summary.matched);
        assert!(summary.files.is_empty());
        assert!(dest.is_dir());
    }

    #[test]
    fn test_missing_prefix_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(&archive, &[("modules/json/a.tera", Some("a"))]);

        let dest = dir.path().join("out");
        let summary = extract_subtree(&archive, "modules/xml", &dest).unwrap();
        assert!(!summary.matched);
        assert!(!dest.exists());
    }

    #[test]
    fn test_existing_destination_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(&archive, &[("m/a.tera", Some("new"))]);

        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.tera"), "old").unwrap();

        let err = extract_subtree(&archive, "m", &dest).unwrap_err();
        match err {
            ExtractionError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(dest.join("a.tera")).unwrap(), "old");
    }

    #[test]
    fn test_list_subtree_does_not_extract() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(
            &archive,
            &[
                ("modules/json/b.tera", Some("b")),
                ("modules/json/a.tera", Some("a")),
                ("modules/json/nested/c.tera", Some("c")),
                ("modules/rust/r.tera", Some("r")),
            ],
        );

        let listed = list_subtree(&archive, "modules/json").unwrap().unwrap();
        assert_eq!(
            listed,
            vec![
                PathBuf::from("a.tera"),
                PathBuf::from("b.tera"),
                PathBuf::from("nested/c.tera")
            ]
        );
        assert!(list_subtree(&archive, "modules/xml").unwrap().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_escaping_entry_of_sibling_module_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(
            &archive,
            &[
                ("modules/json/a.tera", Some("a")),
                ("modules/jsonx/../../../evil.tera", Some("evil")),
            ],
        );

        let dest = dir.path().join("work/json");
        let summary = extract_subtree(&archive, "modules/json", &dest).unwrap();
        assert_eq!(summary.files, vec![PathBuf::from("a.tera")]);
        assert!(!dir.path().join("evil.tera").exists());

        let listed = list_subtree(&archive, "modules/json").unwrap().unwrap();
        assert_eq!(listed, vec![PathBuf::from("a.tera")]);
    }

    #[test]
    fn test_escaping_entry_under_prefix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("dist.zip");
        write_archive(
            &archive,
            &[
                ("modules/json/a.tera", Some("a")),
                ("modules/json/../../evil.tera", Some("evil")),
            ],
        );

        let err = list_subtree(&archive, "modules/json").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsafeEntry { .. }));

        let err = extract_subtree(&archive, "modules/json", &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsafeEntry { .. }));
        assert!(!dir.path().join("evil.tera").exists());
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_subtree(&dir.path().join("absent.zip"), "m", dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::Open { .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.zip");
        fs::write(&bogus, "plain text").unwrap();
        let err = extract_subtree(&bogus, "m", dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::Zip { .. }));
    }
}
