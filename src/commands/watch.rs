//! Watch command - re-check manifests whenever they change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use super::check::check_paths;
use crate::config::{PROJECT_CONFIG_FILE, ProjectConfig};
use crate::manifests::ManifestMatcher;

#[derive(Args)]
pub struct WatchCmd {
    /// Directory or manifest to watch (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Milliseconds to wait for further changes before re-checking
    #[arg(long, default_value = "500")]
    pub debounce_ms: u64,
}

impl WatchCmd {
    pub async fn run(&self) -> Result<()> {
        let mut config = ProjectConfig::find(&self.path)?;
        let mut matcher = ManifestMatcher::new(&config.patterns)?;

        println!("Watching {} for manifest changes...", self.path.display());
        println!("Press Ctrl+C to stop.\n");

        self.check(&config);

        let (tx, mut rx) = mpsc::channel(100);

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.blocking_send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let mode = if self.path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&self.path, mode)?;

        let debounce = Duration::from_millis(self.debounce_ms);

        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    if !is_relevant(&event, &matcher) {
                        continue;
                    }
                    debug!(paths = ?event.paths, "manifest event");

                    // Let bursts of writes settle, then drain what piled up
                    tokio::time::sleep(debounce).await;
                    while rx.try_recv().is_ok() {}

                    match ProjectConfig::find(&self.path)
                        .and_then(|c| ManifestMatcher::new(&c.patterns).map(|m| (c, m)))
                    {
                        Ok((c, m)) => {
                            config = c;
                            matcher = m;
                        }
                        Err(e) => eprintln!("Keeping previous config: {}", e),
                    }

                    println!("\nManifest changed, re-checking...");
                    self.check(&config);
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("\nStopping watch.");
                    break;
                }
            }
        }

        Ok(())
    }

    fn check(&self, config: &ProjectConfig) {
        match check_paths(std::slice::from_ref(&self.path), config) {
            Ok(report) => report.print_text(),
            Err(e) => eprintln!("Check failed: {}", e),
        }
    }
}

/// Only content changes to manifests or the project config matter.
fn is_relevant(event: &Event, matcher: &ManifestMatcher) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }

    event
        .paths
        .iter()
        .any(|p| matcher.matches(p) || is_project_config(p))
}

fn is_project_config(path: &Path) -> bool {
    path.file_name().is_some_and(|n| n == PROJECT_CONFIG_FILE)
}
