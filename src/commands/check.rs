//! Check command - lint manifests.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use super::{Project, load_project_manifests, projects_for};
use crate::config::ProjectConfig;
use crate::lint::{Diagnostic, Rule, lint_workspace};
use crate::manifests::load_manifests;
use crate::types::{OutputFormat, RuleLevel, Severity};

#[derive(Args)]
pub struct CheckCmd {
    /// Manifest files or directories to scan (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Override a rule level for this run, e.g. `unsorted-section=warning`
    #[arg(long = "rule", value_name = "RULE=LEVEL", value_parser = parse_rule_override)]
    pub rules: Vec<(Rule, RuleLevel)>,
}

fn parse_rule_override(s: &str) -> Result<(Rule, RuleLevel), String> {
    let (rule, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected RULE=LEVEL, got `{}`", s))?;
    Ok((rule.trim().parse()?, level.trim().parse()?))
}

/// Result of linting a set of manifests.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn new(files: usize, diagnostics: Vec<Diagnostic>) -> Self {
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        Self {
            files,
            errors,
            warnings: diagnostics.len() - errors,
            diagnostics,
        }
    }

    pub fn print_text(&self) {
        for diagnostic in &self.diagnostics {
            println!("{}", diagnostic);
        }
        if !self.diagnostics.is_empty() {
            println!();
        }
        println!(
            "Checked {} manifest{}: {} error{}, {} warning{}",
            self.files,
            plural(self.files),
            self.errors,
            plural(self.errors),
            self.warnings,
            plural(self.warnings)
        );
    }

    pub fn failed(&self, strict: bool) -> bool {
        self.errors > 0 || (strict && self.warnings > 0)
    }
}

/// Discover, parse and lint everything under `paths`.
pub fn check_paths(paths: &[PathBuf], config: &ProjectConfig) -> Result<CheckReport> {
    let manifests = load_manifests(paths, config)?;
    let diagnostics = lint_workspace(&manifests, &config.rules);
    Ok(CheckReport::new(manifests.len(), diagnostics))
}

/// Lint each project with its own rules, then merge into one report.
///
/// Cross-file conflicts are only looked for within a project.
fn check_projects(projects: &[Project], overrides: &[(Rule, RuleLevel)]) -> Result<CheckReport> {
    let mut files = 0;
    let mut diagnostics = Vec::new();

    for (project, manifests) in load_project_manifests(projects)? {
        let mut rules = project.config.rules.clone();
        for &(rule, level) in overrides {
            rules.set(rule, level);
        }
        files += manifests.len();
        diagnostics.extend(lint_workspace(&manifests, &rules));
    }

    diagnostics.sort_by(|a, b| (&a.path, a.line, a.rule).cmp(&(&b.path, b.line, b.rule)));
    Ok(CheckReport::new(files, diagnostics))
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

impl CheckCmd {
    pub async fn run(&self) -> Result<()> {
        let projects = projects_for(&self.paths)?;
        let report = check_projects(&projects, &self.rules)?;

        if report.files == 0 && self.format == OutputFormat::Text {
            println!("No manifests found.");
            return Ok(());
        }

        match self.format {
            OutputFormat::Text => report.print_text(),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if report.failed(self.strict) {
            bail!(
                "check failed: {} error(s), {} warning(s)",
                report.errors,
                report.warnings
            );
        }

        Ok(())
    }
}
