//! List command - print pins grouped by section.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::{load_project_manifests, projects_for};
use crate::manifests::{Manifest, Section};

#[derive(Args)]
pub struct ListCmd {
    /// Manifest files or directories to scan (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Only show sections whose title contains this text
    #[arg(long, short = 's')]
    pub section: Option<String>,

    /// Show only package names (no versions)
    #[arg(long)]
    pub names_only: bool,
}

impl ListCmd {
    pub async fn run(&self) -> Result<()> {
        let projects = projects_for(&self.paths)?;
        let manifests: Vec<Manifest> = load_project_manifests(&projects)?
            .into_iter()
            .flat_map(|(_, manifests)| manifests)
            .collect();

        if manifests.is_empty() {
            println!("No manifests found.");
            return Ok(());
        }

        let mut total = 0;
        for manifest in &manifests {
            let sections = self.matching_sections(manifest);
            if sections.is_empty() {
                continue;
            }

            if !self.names_only {
                println!("{}", manifest.path.display());
            }

            for section in sections {
                if !self.names_only {
                    println!("  [{}]", section.title.unwrap_or("(no section)"));
                }
                for (_, pin) in &section.pins {
                    if self.names_only {
                        println!("{}", pin.name);
                    } else {
                        println!("    {}", pin);
                    }
                    total += 1;
                }
            }
        }

        if !self.names_only {
            println!("\n{} pins", total);
        }

        Ok(())
    }

    fn matching_sections<'a>(&self, manifest: &'a Manifest) -> Vec<Section<'a>> {
        let filter = self.section.as_ref().map(|s| s.to_lowercase());
        manifest
            .sections()
            .into_iter()
            .filter(|s| !s.pins.is_empty())
            .filter(|s| match &filter {
                Some(f) => s.title.is_some_and(|t| t.to_lowercase().contains(f.as_str())),
                None => true,
            })
            .collect()
    }
}
