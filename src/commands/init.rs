//! Init command - write a starter `.reqpin.toml`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{PROJECT_CONFIG_FILE, PROJECT_CONFIG_TEMPLATE, ProjectConfig};
use crate::manifests::discover_manifests;

#[derive(Args)]
pub struct InitCmd {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

impl InitCmd {
    pub async fn run(&self) -> Result<()> {
        let config_path = self.path.join(PROJECT_CONFIG_FILE);

        if config_path.exists() && !self.force {
            println!(
                "{} already exists. Use --force to overwrite.",
                config_path.display()
            );
            return Ok(());
        }

        std::fs::write(&config_path, PROJECT_CONFIG_TEMPLATE)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Wrote {}", config_path.display());

        let config = ProjectConfig::load(&self.path)?;
        let manifests = discover_manifests(&self.path, &config)?;
        if manifests.is_empty() {
            println!("No manifests found yet.");
        } else {
            println!("Found {} manifests:", manifests.len());
            for path in &manifests {
                println!("  {}", crate::manifests::display_path(path, &self.path));
            }
        }

        Ok(())
    }
}
