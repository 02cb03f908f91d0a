//! Generation: every module applied to every input.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use modgen_tooling::{output_file_name, BuildLog, Module, ModuleConfig, OutputNaming};

use crate::cli_config::{expand_path, CliConfig};
use crate::output;
use crate::GenerateArgs;

/// Fully bound parameters for one `generate` run.
#[derive(Debug)]
struct GeneratePlan {
    modules_root: String,
    modules: Vec<String>,
    output_dir: PathBuf,
    work_dir: PathBuf,
    naming: OutputNaming,
    inputs: Vec<PathBuf>,
}

impl GeneratePlan {
    fn bind(args: GenerateArgs, cli_config: &CliConfig) -> anyhow::Result<Self> {
        let modules_root = super::modules_root(args.modules_root, cli_config)?;

        let modules = if args.modules.is_empty() {
            cli_config.modules.clone()
        } else {
            args.modules
        };
        if modules.is_empty() {
            anyhow::bail!("no modules: pass --module or set `modules` in .modgen.toml");
        }

        let output_dir = args
            .output_dir
            .or_else(|| cli_config.output_dir.as_deref().map(expand_path))
            .context("no output directory: pass --output-dir or set `output-dir` in .modgen.toml")?;

        let inputs = if args.inputs.is_empty() {
            cli_config.inputs.iter().map(|i| expand_path(i)).collect()
        } else {
            args.inputs
        };
        if inputs.is_empty() {
            anyhow::bail!("no input documents: pass them as arguments or set `inputs` in .modgen.toml");
        }

        let naming = args.naming.unwrap_or(cli_config.naming);
        check_output_collisions(naming, &inputs)?;

        Ok(Self {
            modules_root,
            modules,
            output_dir,
            work_dir: args
                .work_dir
                .unwrap_or_else(|| expand_path(&cli_config.work_dir)),
            naming,
            inputs,
        })
    }
}

/// Reject input sets whose outputs would overwrite each other.
fn check_output_collisions(naming: OutputNaming, inputs: &[PathBuf]) -> anyhow::Result<()> {
    match naming {
        OutputNaming::Template if inputs.len() > 1 => anyhow::bail!(
            "{} inputs would all write the same <template>.<module> files: \
             pass a single input or use --naming input",
            inputs.len()
        ),
        OutputNaming::Template => Ok(()),
        OutputNaming::Input => {
            let mut seen: HashMap<String, &Path> = HashMap::new();
            for input in inputs {
                // Unusable names are reported by the module itself.
                let Some(key) = input
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| output_file_name(n, "*").ok())
                else {
                    continue;
                };
                if let Some(previous) = seen.insert(key, input) {
                    anyhow::bail!(
                        "inputs {} and {} would write the same output files",
                        previous.display(),
                        input.display()
                    );
                }
            }
            Ok(())
        }
    }
}

pub(crate) fn generate(
    args: GenerateArgs,
    cli_config: &CliConfig,
    log: Arc<dyn BuildLog>,
) -> anyhow::Result<()> {
    let plan = GeneratePlan::bind(args, cli_config)?;
    tracing::debug!(?plan, "Bound generate parameters");

    let mut generated = BTreeSet::new();
    for name in &plan.modules {
        let config = ModuleConfig::new(
            plan.modules_root.clone(),
            name.clone(),
            plan.output_dir.clone(),
            plan.work_dir.clone(),
        )
        .with_naming(plan.naming);
        let module = Module::new(Arc::clone(&log), config)
            .with_context(|| format!("failed to load module '{name}'"))?;

        output::header(format!("Module: {name}"));
        output::label("Templates", module.templates_dir().display());
        if let Some(dir) = module.extraction_dir() {
            output::dim(format!("  extracted into {}", dir.display()));
        }
        if module.templates().is_empty() {
            output::warning("Module has no templates.");
        } else if plan.naming == OutputNaming::Input && module.templates().len() > 1 {
            output::hint("  Outputs are named after inputs; later templates overwrite earlier ones.");
        }

        for input in &plan.inputs {
            let written = module
                .translate_file(input)
                .with_context(|| format!("module '{name}' failed on {}", input.display()))?;
            for path in written {
                if generated.insert(path.clone()) {
                    output::item(path.display());
                }
            }
        }
        output::blank();
    }

    output::success(format!(
        "Generated {} file(s) in {}",
        generated.len(),
        plan.output_dir.display()
    ));
    Ok(())
}
