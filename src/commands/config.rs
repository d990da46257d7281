//! Config command - manage user configuration.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::UserConfig;

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set the package index JSON API root (default: https://pypi.org/pypi)
    SetIndexUrl(SetIndexUrlCmd),

    /// Set the bearer token for a private index
    SetToken(SetTokenCmd),

    /// Set how many packages are looked up concurrently
    SetConcurrency(SetConcurrencyCmd),

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetIndexUrlCmd {
    /// Index URL (e.g., https://pypi.internal.example/pypi)
    pub url: String,
}

#[derive(Args)]
pub struct SetTokenCmd {
    /// Token value (empty string clears it)
    pub token: String,
}

#[derive(Args)]
pub struct SetConcurrencyCmd {
    pub concurrency: usize,
}

impl ConfigCmd {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetIndexUrl(cmd) => {
                let mut config = UserConfig::load()?;
                config.set_index_url(&cmd.url)?;
                config.save()?;
                println!("Index URL set to: {}", config.index_url);
            }
            ConfigSubCmd::SetToken(cmd) => {
                let mut config = UserConfig::load()?;
                config.set_index_token(cmd.token.clone());
                config.save()?;
                if config.has_index_token() {
                    println!("Index token saved.");
                } else {
                    println!("Index token cleared.");
                }
            }
            ConfigSubCmd::SetConcurrency(cmd) => {
                let mut config = UserConfig::load()?;
                config.set_concurrency(cmd.concurrency)?;
                config.save()?;
                println!("Concurrency set to: {}", config.concurrency);
            }
            ConfigSubCmd::Show => {
                let config = UserConfig::load()?;
                println!("Config: {}", UserConfig::config_path()?.display());
                println!();
                println!("index_url:    {}", config.index_url);
                println!(
                    "index_token:  {}",
                    if config.has_index_token() {
                        "(set)"
                    } else {
                        "(not set)"
                    }
                );
                println!("concurrency:  {}", config.concurrency);
            }
        }
        Ok(())
    }
}
