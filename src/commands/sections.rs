//! Sections command - show the comment-header structure of a manifest.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::manifests::parse_manifest;

#[derive(Args)]
pub struct SectionsCmd {
    /// Manifest file
    pub file: PathBuf,
}

impl SectionsCmd {
    pub async fn run(&self) -> Result<()> {
        let manifest = parse_manifest(&self.file)?;
        let sections = manifest.sections();

        if sections.is_empty() {
            println!("{} has no sections.", self.file.display());
            return Ok(());
        }

        println!("{}", self.file.display());
        println!();
        for section in &sections {
            println!(
                "{:>5}  {:<48} {:>3} pin{}",
                section.start_line,
                section.title.unwrap_or("(no section)"),
                section.pins.len(),
                if section.pins.len() == 1 { "" } else { "s" }
            );
            for note in &section.notes {
                println!("       {}", note);
            }
        }

        let invalid = manifest.invalid_lines().count();
        println!();
        println!(
            "{} sections, {} pins, {} invalid lines",
            sections.len(),
            manifest.pins().count(),
            invalid
        );

        Ok(())
    }
}
