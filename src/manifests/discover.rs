//! Manifest discovery for monorepos.
//!
//! Walks the directory tree to find all requirements manifests, skipping
//! build/cache directories. `.reqpin.toml` can restrict the walk to explicit
//! roots and change which file names count as manifests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::config::ProjectConfig;

/// Directories to skip during manifest discovery.
const SKIP_DIRS: &[&str] = &[
    // Dependencies
    "node_modules",
    "site-packages",
    // Build artifacts
    "target",
    "dist",
    "build",
    ".eggs",
    // Caches
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    ".cache",
    // Virtual envs
    ".venv",
    "venv",
    "env",
    // VCS
    ".git",
    ".svn",
    ".hg",
    // IDE
    ".idea",
    ".vscode",
];

/// Decides whether a path is a manifest, based on the configured patterns.
#[derive(Debug, Clone)]
pub struct ManifestMatcher {
    /// Each pattern with the number of path components it spans.
    patterns: Vec<(Pattern, usize)>,
}

impl ManifestMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let pattern = Pattern::new(p)
                    .with_context(|| format!("Invalid manifest pattern `{}`", p))?;
                let depth = p.split('/').filter(|s| !s.is_empty()).count();
                Ok((pattern, depth))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Match the trailing components of `path` against each pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let components: Vec<_> = path
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();

        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        self.patterns.iter().any(|(pattern, depth)| {
            if *depth == 0 || components.len() < *depth {
                return false;
            }
            let tail = components[components.len() - depth..].join("/");
            pattern.matches_with(&tail, options)
        })
    }
}

/// Discover all manifest files under `root`.
///
/// A file path is returned as-is. For directories, explicit `roots` from the
/// config are used when the config lives in `root` itself; otherwise the whole
/// tree is walked. The result is sorted and free of duplicates.
pub fn discover_manifests(root: &Path, config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        bail!("Path not found: {}", root.display());
    }

    let matcher = ManifestMatcher::new(&config.patterns)?;
    let extra_excludes: BTreeSet<&str> = config.exclude.iter().map(String::as_str).collect();

    let absolute_root = std::path::absolute(root)?;
    let walk_roots = match config.resolved_roots() {
        Some(roots) if config.dir.as_deref() == Some(absolute_root.as_path()) => roots
            .into_iter()
            .filter(|p| p.is_dir())
            .collect(),
        _ => vec![root.to_path_buf()],
    };

    let mut found = BTreeSet::new();
    for dir in &walk_roots {
        discover_recursive(dir, &matcher, &extra_excludes, &mut found);
    }

    debug!(root = %root.display(), count = found.len(), "discovered manifests");
    Ok(found.into_iter().collect())
}

fn discover_recursive(
    dir: &Path,
    matcher: &ManifestMatcher,
    extra_excludes: &BTreeSet<&str>,
    found: &mut BTreeSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.is_file() {
            if matcher.matches(&path) {
                found.insert(path);
            }
            continue;
        }

        if !path.is_dir() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };

        if should_skip(name, extra_excludes) {
            continue;
        }

        discover_recursive(&path, matcher, extra_excludes, found);
    }
}

fn should_skip(name: &str, extra_excludes: &BTreeSet<&str>) -> bool {
    SKIP_DIRS.contains(&name) || extra_excludes.contains(name)
}
