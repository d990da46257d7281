//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{
    CheckCmd, ConfigCmd, FmtCmd, InitCmd, ListCmd, OutdatedCmd, SectionsCmd, WatchCmd,
};

#[derive(Parser)]
#[command(name = "reqpin")]
#[command(about = "reqpin - lint, format and audit pinned requirements manifests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Lint manifests: invalid lines, conflicting and duplicate pins
    Check(CheckCmd),

    /// List pins grouped by section
    List(ListCmd),

    /// Show the section structure of a manifest
    Sections(SectionsCmd),

    /// Rewrite manifests in canonical form
    Fmt(FmtCmd),

    /// Compare pins with the latest releases on the package index
    Outdated(OutdatedCmd),

    /// Re-check manifests whenever they change
    Watch(WatchCmd),

    /// Write a starter .reqpin.toml
    Init(InitCmd),

    /// Manage configuration (index URL, token, etc.)
    Config(ConfigCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Check(cmd) => cmd.run().await,
            Command::List(cmd) => cmd.run().await,
            Command::Sections(cmd) => cmd.run().await,
            Command::Fmt(cmd) => cmd.run().await,
            Command::Outdated(cmd) => cmd.run().await,
            Command::Watch(cmd) => cmd.run().await,
            Command::Init(cmd) => cmd.run().await,
            Command::Config(cmd) => cmd.run().await,
        }
    }
}
