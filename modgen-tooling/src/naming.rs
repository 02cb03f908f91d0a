//! Output file name derivation.

/// Compute `<stem>.<module_name>` where `stem` is `source_name` up to its last `.`.
///
/// `source_name` is a bare file name (a template file or the input document).
/// Names without an extension, or whose stem would be empty, are rejected.
pub fn output_file_name(source_name: &str, module_name: &str) -> Result<String, NamingError> {
    let (stem, _extension) =
        source_name
            .rsplit_once('.')
            .ok_or_else(|| NamingError::MissingExtension {
                name: source_name.to_string(),
            })?;

    if stem.is_empty() {
        return Err(NamingError::EmptyStem {
            name: source_name.to_string(),
        });
    }

    Ok(format!("{stem}.{module_name}"))
}

#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("'{name}' has no extension to replace")]
    MissingExtension { name: String },
    #[error("'{name}' has an empty stem")]
    EmptyStem { name: String },
}
