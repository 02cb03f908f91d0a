//! Template listing for a single module.

use anyhow::Context;
use modgen_tooling::ModulesRoot;

use crate::cli_config::CliConfig;
use crate::output;
use crate::TemplatesArgs;

pub(crate) fn list_templates(args: TemplatesArgs, cli_config: &CliConfig) -> anyhow::Result<()> {
    let locator = super::modules_root(args.modules_root, cli_config)?;
    let root = ModulesRoot::parse(&locator)?;
    let names = root
        .template_names(&args.module)
        .with_context(|| format!("cannot resolve module '{}'", args.module))?;

    output::header(format!("Module: {}", args.module));
    output::label("Modules root", &root);
    output::blank();

    if names.is_empty() {
        output::warning("No templates found.");
        return Ok(());
    }
    for name in &names {
        output::item(name);
    }
    Ok(())
}
