//! A named set of templates bound to an output directory.
//!
//! Construction does all the file-system work up front: it creates the output
//! directory, resolves (and if needed extracts) the template directory and
//! lists the templates. Top-level files are applied; files in subdirectories
//! are partials that templates may include. [`Module::translate`] then applies every template to
//! one input document, writing one output file per template.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::engine::{base_context, CompiledTemplate};
use crate::error::ModuleError;
use crate::input::TransformInput;
use crate::locator::{list_partials, list_templates, ModulesRoot, Partial};
use crate::log::BuildLog;
use crate::naming::output_file_name;

/// Which file name supplies the stem of each output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputNaming {
    /// `<template stem>.<module>`, one distinct file per template.
    #[default]
    Template,
    /// `<input stem>.<module>`; templates of one module overwrite each other.
    Input,
}

impl FromStr for OutputNaming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(Self::Template),
            "input" => Ok(Self::Input),
            other => Err(format!(
                "unknown output naming '{other}' (expected 'template' or 'input')"
            )),
        }
    }
}

impl fmt::Display for OutputNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => f.write_str("template"),
            Self::Input => f.write_str("input"),
        }
    }
}

/// Everything needed to construct a [`Module`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleConfig {
    /// Module name; also the extension of every output file.
    pub name: String,
    /// Modules-root locator, see [`ModulesRoot::parse`].
    pub modules_root: String,
    pub output_dir: PathBuf,
    /// Extraction destination for archive-backed modules.
    pub work_dir: PathBuf,
    #[serde(default)]
    pub naming: OutputNaming,
}

impl ModuleConfig {
    pub fn new(
        modules_root: impl Into<String>,
        name: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            modules_root: modules_root.into(),
            output_dir: output_dir.into(),
            work_dir: work_dir.into(),
            naming: OutputNaming::default(),
        }
    }

    pub fn with_naming(mut self, naming: OutputNaming) -> Self {
        self.naming = naming;
        self
    }
}

#[derive(Debug)]
pub struct Module {
    name: String,
    modules_root: ModulesRoot,
    templates_dir: PathBuf,
    extraction_dir: Option<PathBuf>,
    output_dir: PathBuf,
    naming: OutputNaming,
    templates: Vec<PathBuf>,
    partials: Vec<Partial>,
    log: Arc<dyn BuildLog>,
}

impl Module {
    /// Bind a module and resolve its templates.
    ///
    /// Fails if the output directory cannot be created, the module cannot be
    /// resolved to a directory, or archive extraction fails (including when a
    /// previous extraction already left files at the destination).
    pub fn new(log: Arc<dyn BuildLog>, config: ModuleConfig) -> Result<Self, ModuleError> {
        validate_module_name(&config.name)?;
        let modules_root = ModulesRoot::parse(&config.modules_root)?;

        log.debug(&format!("modules root = {modules_root}"));
        log.debug(&format!("module name = {}", config.name));

        create_output_dir(&config.output_dir)?;

        let resolved = modules_root.resolve(&config.name, &config.work_dir, log.as_ref())?;
        let templates = list_templates(&resolved.path)?;
        let partials = list_partials(&resolved.path)?;
        log.debug(&format!(
            "module '{}' has {} template(s) and {} partial(s) in {}",
            config.name,
            templates.len(),
            partials.len(),
            resolved.path.display()
        ));

        Ok(Self {
            name: config.name,
            modules_root,
            extraction_dir: resolved.extracted.then(|| resolved.path.clone()),
            templates_dir: resolved.path,
            output_dir: config.output_dir,
            naming: config.naming,
            templates,
            partials,
            log,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules_root(&self) -> &ModulesRoot {
        &self.modules_root
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Set only when the templates came out of an archive.
    pub fn extraction_dir(&self) -> Option<&Path> {
        self.extraction_dir.as_deref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn naming(&self) -> OutputNaming {
        self.naming
    }

    /// Template files in application order.
    pub fn templates(&self) -> &[PathBuf] {
        &self.templates
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Apply every template to `input`, returning the written output paths.
    ///
    /// Stops at the first failure. Outputs written before it are left in place.
    pub fn translate(&self, input: &TransformInput) -> Result<Vec<PathBuf>, ModuleError> {
        let mut written = Vec::with_capacity(self.templates.len());
        if self.templates.is_empty() {
            self.log
                .debug(&format!("module '{}' has no templates to apply", self.name));
            return Ok(written);
        }

        let input_name = match self.naming {
            OutputNaming::Input => Some(input_file_name(input)?),
            OutputNaming::Template => None,
        };
        let doc = input.document()?;
        let context = base_context(&self.name, input, &doc)?;

        for template in &self.templates {
            let compiled =
                CompiledTemplate::compile(template, &self.partials, Arc::clone(&self.log))?;

            let stem_source = input_name.as_deref().unwrap_or(compiled.name());
            let output = self
                .output_dir
                .join(output_file_name(stem_source, &self.name)?);

            self.log.debug(&format!(
                "applying {} -> {}",
                compiled.name(),
                output.display()
            ));
            compiled.render_to_file(&context, &output)?;
            written.push(output);
        }

        Ok(written)
    }

    /// Read `path` and [`translate`](Self::translate) it.
    pub fn translate_file(&self, path: &Path) -> Result<Vec<PathBuf>, ModuleError> {
        let input = TransformInput::from_path(path)?;
        self.translate(&input)
    }
}

fn validate_module_name(name: &str) -> Result<(), ModuleError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name == "." || name == ".." {
        "name cannot be a relative directory"
    } else if name.contains(['/', '\\']) {
        "name cannot contain path separators"
    } else {
        return Ok(());
    };
    Err(ModuleError::InvalidModuleName {
        name: name.to_string(),
        reason,
    })
}

fn create_output_dir(path: &Path) -> Result<(), ModuleError> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| ModuleError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

fn input_file_name(input: &TransformInput) -> Result<String, ModuleError> {
    let name = input.name().ok_or(ModuleError::UnnamedInput)?;
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or(ModuleError::UnnamedInput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLog;
    use crate::ResolutionError;

    fn module_dir(root: &Path, name: &str, templates: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, body) in templates {
            fs::write(dir.join(file), body).unwrap();
        }
    }

    fn build(root: &Path, name: &str, out: &Path) -> Result<Module, ModuleError> {
        let config = ModuleConfig::new(
            root.to_string_lossy(),
            name,
            out,
            root.join("target"),
        );
        Module::new(Arc::new(MemoryLog::new()), config)
    }

    #[test]
    fn test_output_naming_parse() {
        assert_eq!("template".parse::<OutputNaming>().unwrap(), OutputNaming::Template);
        assert_eq!("input".parse::<OutputNaming>().unwrap(), OutputNaming::Input);
        assert!("other".parse::<OutputNaming>().is_err());
        assert_eq!(OutputNaming::Input.to_string(), "input");
    }

    #[test]
    fn test_module_config_deserializes_kebab_case() {
        let config: ModuleConfig = toml::from_str(
            r#"
name = "json"
modules-root = "zip:dist.zip!/modules"
output-dir = "out"
work-dir = "target"
naming = "input"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "json");
        assert_eq!(config.modules_root, "zip:dist.zip!/modules");
        assert_eq!(config.naming, OutputNaming::Input);
    }

    #[test]
    fn test_invalid_module_names() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                validate_module_name(bad),
                Err(ModuleError::InvalidModuleName { .. })
            ));
        }
        assert!(validate_module_name("json").is_ok());
    }

    #[test]
    fn test_new_lists_templates() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(dir.path(), "rust", &[("types.tera", "x"), ("impls.tera", "y")]);

        let module = build(dir.path(), "rust", &dir.path().join("out")).unwrap();
        assert_eq!(module.name(), "rust");
        assert_eq!(module.templates().len(), 2);
        assert!(module.extraction_dir().is_none());
        assert_eq!(module.templates_dir(), dir.path().join("rust"));
    }

    #[test]
    fn test_new_creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(dir.path(), "rust", &[]);
        let out = dir.path().join("a/b/c");

        build(dir.path(), "rust", &out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_new_fails_when_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(dir.path(), "rust", &[]);
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let err = build(dir.path(), "rust", &blocker.join("out")).unwrap_err();
        assert!(matches!(err, ModuleError::OutputDir { .. }));
    }

    #[test]
    fn test_new_fails_for_missing_module() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(dir.path(), "nope", &dir.path().join("out")).unwrap_err();
        assert!(matches!(
            err,
            ModuleError::Resolution(ResolutionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_translate_names_outputs_after_templates() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(
            dir.path(),
            "rs",
            &[
                ("model.tera", "struct {{ doc.name | pascal_case }};"),
                ("tests.tera", "// tests for {{ doc.name }}"),
            ],
        );
        let out = dir.path().join("out");
        let module = build(dir.path(), "rs", &out).unwrap();

        let input = TransformInput::from_bytes(r#"{"name": "order_line"}"#, Some("order.json".into()));
        let written = module.translate(&input).unwrap();

        assert_eq!(written, vec![out.join("model.rs"), out.join("tests.rs")]);
        assert_eq!(
            fs::read_to_string(out.join("model.rs")).unwrap(),
            "struct OrderLine;"
        );
    }

    #[test]
    fn test_translate_by_input_name_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(dir.path(), "json", &[("a.tera", "{}")]);
        let config = ModuleConfig::new(
            dir.path().to_string_lossy(),
            "json",
            dir.path().join("out"),
            dir.path().join("target"),
        )
        .with_naming(OutputNaming::Input);
        let module = Module::new(Arc::new(MemoryLog::new()), config).unwrap();

        let err = module
            .translate(&TransformInput::from_bytes("{}", None))
            .unwrap_err();
        assert!(matches!(err, ModuleError::UnnamedInput));
    }

    #[test]
    fn test_translate_rejects_template_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        module_dir(dir.path(), "txt", &[("README", "plain")]);
        let module = build(dir.path(), "txt", &dir.path().join("out")).unwrap();

        let err = module
            .translate(&TransformInput::from_bytes("", None))
            .unwrap_err();
        assert!(matches!(err, ModuleError::Naming(_)));
    }
}
