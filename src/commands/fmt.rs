//! Fmt command - rewrite manifests in canonical form.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use tracing::info;

use super::projects_for;
use crate::manifests::{collect_manifest_paths, format_manifest, parse_str};
use crate::types::Spacing;

#[derive(Args)]
pub struct FmtCmd {
    /// Manifest files or directories to format (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Report files that would change without writing them
    #[arg(long)]
    pub check: bool,

    /// Write `name==version` instead of `name == version`
    #[arg(long)]
    pub compact: bool,
}

impl FmtCmd {
    pub async fn run(&self) -> Result<()> {
        // Each file is formatted with the spacing of the project it belongs to
        let mut files: Vec<(PathBuf, Spacing)> = Vec::new();
        for project in projects_for(&self.paths)? {
            let spacing = if self.compact {
                Spacing::Compact
            } else {
                project.config.spacing
            };
            for path in collect_manifest_paths(&project.paths, &project.config)? {
                if !files.iter().any(|(seen, _)| *seen == path) {
                    files.push((path, spacing));
                }
            }
        }

        if files.is_empty() {
            println!("No manifests found.");
            return Ok(());
        }

        let mut changed = 0;
        for (path, spacing) in &files {
            if format_file(path, *spacing, self.check)? {
                changed += 1;
                if self.check {
                    println!("would reformat {}", path.display());
                } else {
                    println!("formatted {}", path.display());
                }
            }
        }

        if self.check && changed > 0 {
            bail!("{} of {} manifests need formatting", changed, files.len());
        }

        println!(
            "{} of {} manifests {}",
            changed,
            files.len(),
            if self.check { "need formatting" } else { "reformatted" }
        );
        Ok(())
    }
}

/// Format one file. Returns whether its contents differ from canonical form.
fn format_file(path: &Path, spacing: Spacing, check_only: bool) -> Result<bool> {
    let original = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let formatted = format_manifest(&parse_str(path, &original), spacing);

    if formatted == original {
        return Ok(false);
    }

    if !check_only {
        std::fs::write(path, &formatted)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "reformatted manifest");
    }

    Ok(true)
}
