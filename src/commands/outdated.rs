//! Outdated command - audit pins against the package index.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use secrecy::SecretString;

use super::{load_project_manifests, projects_for};
use crate::audit::{AuditEntry, AuditStatus, audit_pins};
use crate::config::{UserConfig, validate_index_url};
use crate::manifests::Pin;
use crate::registry::PypiClient;
use crate::types::OutputFormat;

#[derive(Args)]
pub struct OutdatedCmd {
    /// Manifest files or directories to scan (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Number of packages to look up concurrently (default: from config)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Package index JSON API root (default: from config)
    #[arg(long, env = "REQPIN_INDEX_URL")]
    pub index_url: Option<String>,

    /// Bearer token for the package index
    #[arg(long, env = "REQPIN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit non-zero if any pin is not current
    #[arg(long)]
    pub fail: bool,
}

impl OutdatedCmd {
    pub async fn run(&self) -> Result<()> {
        let user = UserConfig::load()?;
        let projects = projects_for(&self.paths)?;

        let index_url = match &self.index_url {
            Some(url) => validate_index_url(url)?,
            None => user.index_url.clone(),
        };
        let token = self
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .or_else(|| user.index_token_secret());
        let concurrency = self.concurrency.unwrap_or(user.concurrency);

        let loaded = load_project_manifests(&projects)?;
        let pins = unique_pins(
            loaded
                .iter()
                .flat_map(|(_, manifests)| manifests)
                .flat_map(|m| m.pins().map(|(_, p)| p)),
        );

        // JSON output stays an array even when there is nothing to audit
        if pins.is_empty() && self.format == OutputFormat::Text {
            println!("No pins found.");
            return Ok(());
        }

        if self.format == OutputFormat::Text {
            println!("Checking {} pins against {}...", pins.len(), index_url);
        }

        let client = PypiClient::with_api_url(index_url).with_token(token);
        let entries = audit_pins(&client, &pins, concurrency).await;

        match self.format {
            OutputFormat::Text => print_table(&entries),
            OutputFormat::Json => println!("{}", render_json(&entries)?),
        }

        let problems = entries.iter().filter(|e| e.status.is_problem()).count();
        if self.fail && problems > 0 {
            bail!("{} of {} pins need attention", problems, entries.len());
        }

        Ok(())
    }
}

fn render_json(entries: &[AuditEntry]) -> Result<String> {
    serde_json::to_string_pretty(entries).context("Failed to serialize report")
}

/// Drop repeated `(normalized name, version)` pairs, keeping first occurrence.
fn unique_pins<'a>(pins: impl Iterator<Item = &'a Pin>) -> Vec<Pin> {
    let mut seen = std::collections::HashSet::new();
    pins.filter(|p| seen.insert((p.normalized_name(), p.version.to_lowercase())))
        .cloned()
        .collect()
}

fn print_table(entries: &[AuditEntry]) {
    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0)
        .max("package".len());

    println!();
    println!(
        "{:<name_width$}  {:<14} {:<14} {}",
        "package", "pinned", "latest", "status"
    );
    for entry in entries {
        let mut status = entry.status.label().to_string();
        if let Some(released) = entry.released {
            status.push_str(&format!(" (released {})", released.format("%Y-%m-%d")));
        }
        match &entry.status {
            AuditStatus::Yanked {
                reason: Some(reason),
            } => status.push_str(&format!(": {}", reason)),
            AuditStatus::Failed { error } => status.push_str(&format!(": {}", error)),
            _ => {}
        }
        println!(
            "{:<name_width$}  {:<14} {:<14} {}",
            entry.name,
            entry.version,
            entry.latest.as_deref().unwrap_or("-"),
            status
        );
    }

    let problems = entries.iter().filter(|e| e.status.is_problem()).count();
    println!();
    println!("{} of {} pins need attention", problems, entries.len());
}
