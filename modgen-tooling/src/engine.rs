//! Per-template compilation and rendering on top of Tera.
//!
//! Each template file is compiled into its own Tera instance carrying the case
//! filters, three diagnostic functions and the module's [`Partial`]s, so
//! `include`, `import` and `extends` resolve against files of the same module.
//! Diagnostics go to the module's [`BuildLog`] and render as empty strings;
//! they never fail a render.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tera::{Context, Tera};

use crate::error::ModuleError;
use crate::filters;
use crate::input::TransformInput;
use crate::locator::Partial;
use crate::log::BuildLog;

/// Severity of a diagnostic raised from inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    FatalError,
}

impl Severity {
    /// Tera function name templates call to raise this severity.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::FatalError => "fatal_error",
        }
    }

    fn report(self, log: &dyn BuildLog, template: &str, message: &str) {
        match self {
            Self::Warning => log.warn(&format!("[W] warning in {template}: {message}")),
            Self::Error => log.error(&format!("[!] error in {template}: {message}")),
            Self::FatalError => log.error(&format!("[!!!] fatal error in {template}: {message}")),
        }
    }
}

/// A single template file, compiled and ready to render.
#[derive(Debug)]
pub struct CompiledTemplate {
    tera: Tera,
    name: String,
    path: PathBuf,
}

impl CompiledTemplate {
    /// Compile the template at `path`, registered under its file name next to
    /// `partials`. A partial that fails to parse fails this compile too.
    pub fn compile(
        path: &Path,
        partials: &[Partial],
        log: Arc<dyn BuildLog>,
    ) -> Result<Self, ModuleError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut tera = Tera::default();
        // Generated sources are not HTML; never escape, whatever the suffix.
        tera.autoescape_on(vec![]);
        filters::register(&mut tera);
        for severity in [Severity::Warning, Severity::Error, Severity::FatalError] {
            tera.register_function(
                severity.function_name(),
                diagnostic(severity, name.clone(), Arc::clone(&log)),
            );
        }

        let files = partials
            .iter()
            .map(|p| (p.path.as_path(), Some(p.name.as_str())))
            .chain(std::iter::once((path, Some(name.as_str()))));
        tera.add_template_files(files)
            .map_err(|source| ModuleError::TemplateCompile {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            tera,
            name,
            path: path.to_path_buf(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with `context`, adding the `template` variable.
    pub fn render(&self, context: &Context) -> Result<String, ModuleError> {
        let mut context = context.clone();
        context.insert("template", &self.name);
        self.tera
            .render(&self.name, &context)
            .map_err(|source| ModuleError::TemplateExecution {
                path: self.path.clone(),
                source,
            })
    }

    /// Render and write the result to `output`, replacing any existing file.
    pub fn render_to_file(&self, context: &Context, output: &Path) -> Result<(), ModuleError> {
        let content = self.render(context)?;
        fs::write(output, content).map_err(|source| ModuleError::OutputWrite {
            path: output.to_path_buf(),
            source,
        })
    }
}

/// Variables shared by every template of one `translate` call.
pub fn base_context(
    module: &str,
    input: &TransformInput,
    doc: &Value,
) -> Result<Context, ModuleError> {
    let mut context = Context::new();
    context.insert("doc", doc);
    context.insert("source", input.text()?);
    context.insert("input_name", input.name().unwrap_or(""));
    context.insert("module", module);
    Ok(context)
}

fn diagnostic(
    severity: Severity,
    template: String,
    log: Arc<dyn BuildLog>,
) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let message = match args.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        severity.report(log.as_ref(), &template, &message);
        Ok(Value::String(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogLevel, MemoryLog};
    use serde_json::json;

    fn write_template(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn context_for(doc: Value) -> Context {
        let input = TransformInput::from_bytes("raw", Some("order.json".to_string()));
        base_context("json", &input, &doc).unwrap()
    }

    #[test]
    fn test_compile_and_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(
            dir.path(),
            "struct.tera",
            "pub struct {{ doc.name | pascal_case }}; // {{ module }} from {{ input_name }} via {{ template }}",
        );
        let log = Arc::new(MemoryLog::new());
        let compiled = CompiledTemplate::compile(&path, &[], log).unwrap();

        let out = compiled.render(&context_for(json!({"name": "order_line"}))).unwrap();
        assert_eq!(
            out,
            "pub struct OrderLine; // json from order.json via struct.tera"
        );
    }

    #[test]
    fn test_xml_named_template_is_not_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "schema.xml", "<v>{{ doc.v }}</v>");
        let compiled = CompiledTemplate::compile(&path, &[], Arc::new(MemoryLog::new())).unwrap();

        let out = compiled.render(&context_for(json!({"v": "a<b & c"}))).unwrap();
        assert_eq!(out, "<v>a<b & c</v>");
    }

    #[test]
    fn test_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "broken.tera", "{% if %}");
        let err = CompiledTemplate::compile(&path, &[], Arc::new(MemoryLog::new())).unwrap_err();
        assert!(matches!(err, ModuleError::TemplateCompile { .. }));
    }

    #[test]
    fn test_render_error_on_undefined_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "t.tera", "{{ missing.field }}");
        let compiled = CompiledTemplate::compile(&path, &[], Arc::new(MemoryLog::new())).unwrap();
        let err = compiled.render(&context_for(json!({}))).unwrap_err();
        assert!(matches!(err, ModuleError::TemplateExecution { .. }));
    }

    #[test]
    fn test_diagnostics_are_logged_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(
            dir.path(),
            "diag.tera",
            r#"a{{ warning(message="check input") }}b{{ error(message="bad field") }}c{{ fatal_error(message=3) }}d"#,
        );
        let log = Arc::new(MemoryLog::new());
        let compiled = CompiledTemplate::compile(&path, &[], log.clone()).unwrap();

        let out = compiled.render(&context_for(json!({}))).unwrap();
        assert_eq!(out, "abcd");

        let warnings = log.messages(LogLevel::Warn);
        assert_eq!(warnings, vec!["[W] warning in diag.tera: check input"]);
        let errors = log.messages(LogLevel::Error);
        assert_eq!(
            errors,
            vec![
                "[!] error in diag.tera: bad field",
                "[!!!] fatal error in diag.tera: 3"
            ]
        );
    }

    #[test]
    fn test_render_to_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(dir.path(), "t.tera", "{{ source }}");
        let compiled = CompiledTemplate::compile(&path, &[], Arc::new(MemoryLog::new())).unwrap();

        let output = dir.path().join("t.json");
        fs::write(&output, "stale").unwrap();
        compiled
            .render_to_file(&context_for(json!({})), &output)
            .unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "raw");
    }

    fn partial(dir: &Path, name: &str, body: &str) -> Partial {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        Partial {
            name: name.to_string(),
            path,
        }
    }

    #[test]
    fn test_include_import_and_extend_partials() {
        let dir = tempfile::tempdir().unwrap();
        let partials = vec![
            partial(dir.path(), "partials/header.tera", "// {{ module }} header"),
            partial(
                dir.path(),
                "partials/macros.tera",
                "{% macro field(name) %}pub {{ name | snake_case }}: String,{% endmacro field %}",
            ),
            partial(
                dir.path(),
                "layouts/base.tera",
                "{% block head %}{% endblock head %}\n{% block body %}{% endblock body %}",
            ),
        ];
        let path = write_template(
            dir.path(),
            "model.tera",
            r#"{% extends "layouts/base.tera" %}{% import "partials/macros.tera" as m %}{% block head %}{% include "partials/header.tera" %}{% endblock head %}{% block body %}{{ m::field(name=doc.name) }}{% endblock body %}"#,
        );
        let compiled =
            CompiledTemplate::compile(&path, &partials, Arc::new(MemoryLog::new())).unwrap();

        let out = compiled.render(&context_for(json!({"name": "OrderId"}))).unwrap();
        assert_eq!(out, "// json header\npub order_id: String,");
    }

    #[test]
    fn test_broken_partial_fails_compile() {
        let dir = tempfile::tempdir().unwrap();
        let partials = vec![partial(dir.path(), "partials/bad.tera", "{% if %}")];
        let path = write_template(dir.path(), "t.tera", "ok");
        let err = CompiledTemplate::compile(&path, &partials, Arc::new(MemoryLog::new()))
            .unwrap_err();
        assert!(matches!(err, ModuleError::TemplateCompile { .. }));
    }
}
