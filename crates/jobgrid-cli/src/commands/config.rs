use std::path::Path;

use jobgrid_core::{BackendKind, JobgridConfig};

pub fn init(path: &Path, backend: BackendKind, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    let content = JobgridConfig::scaffold(backend).to_toml_string()?;
    std::fs::write(path, content)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}

pub fn show(path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
