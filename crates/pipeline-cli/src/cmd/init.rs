use anyhow::Context;
use pipeline_core::config::Config;
use pipeline_core::store::OpportunityStore;
use pipeline_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pipeline".to_string());

    println!("Initializing pipeline in: {}", root.display());

    let dir = paths::pipeline_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    let created = OpportunityStore::new(root)
        .init()
        .context("failed to write opportunities.yaml")?;
    let verb = if created { "created:" } else { "exists: " };
    println!("  {verb} {}", paths::STORE_FILE);

    Ok(())
}
