//! Requirements manifest parsing, discovery and formatting.

mod discover;
mod format;
mod requirements;

pub use discover::{ManifestMatcher, discover_manifests};
pub use format::format_manifest;
pub use requirements::{Manifest, Pin, Section, parse_manifest, parse_str};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;

use crate::config::ProjectConfig;

/// Expand every path into manifest files (directories go through discovery).
pub fn collect_manifest_paths(paths: &[PathBuf], config: &ProjectConfig) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    for path in paths {
        found.extend(discover_manifests(path, config)?);
    }
    Ok(found.into_iter().collect())
}

/// Discover and parse manifests under all given paths.
///
/// Files are parsed in parallel; the result is sorted by path.
pub fn load_manifests(paths: &[PathBuf], config: &ProjectConfig) -> Result<Vec<Manifest>> {
    let files = collect_manifest_paths(paths, config)?;
    files
        .par_iter()
        .map(|path| parse_manifest(path.as_path()))
        .collect()
}

/// Relative display path, falling back to the full path.
pub fn display_path<'a>(path: &'a Path, base: &Path) -> std::path::Display<'a> {
    path.strip_prefix(base).unwrap_or(path).display()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_manifests_sorted_and_deduped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/requirements.txt"), "# b\nsix == 1.15.0\n").unwrap();
        fs::write(root.join("a/requirements.txt"), "# a\nnumpy == 1.19.2\n").unwrap();

        let paths = vec![root.to_path_buf(), root.join("a/requirements.txt")];
        let manifests = load_manifests(&paths, &ProjectConfig::default()).unwrap();

        assert_eq!(manifests.len(), 2);
        assert!(manifests[0].path.ends_with("a/requirements.txt"));
        assert!(manifests[1].path.ends_with("b/requirements.txt"));
        assert_eq!(manifests[1].pins().count(), 1);
    }

    #[test]
    fn test_display_path() {
        let base = Path::new("/repo");
        assert_eq!(
            display_path(Path::new("/repo/api/requirements.txt"), base).to_string(),
            "api/requirements.txt"
        );
        assert_eq!(
            display_path(Path::new("/elsewhere/r.txt"), base).to_string(),
            "/elsewhere/r.txt"
        );
    }
}
