//! `tgrelay init`: write a documented config template.

use std::path::Path;

use anyhow::{Context, Result, bail};

pub fn handle_init(path: &Path, account_id: &str, force: bool) -> Result<()> {
    write_template(path, account_id, force)?;
    eprintln!("Wrote {}", path.display());
    eprintln!("Fill in the destination section, then run `tgrelay doctor`.");
    Ok(())
}

fn write_template(path: &Path, account_id: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let template = tgrelay_config::template::default_config_template(account_id);
    std::fs::write(path, template).with_context(|| format!("failed to write {}", path.display()))
}
