//! CLI command implementations.

mod check;
mod config;
mod fmt;
mod init;
mod list;
mod outdated;
mod sections;
mod watch;

pub use check::CheckCmd;
pub use config::ConfigCmd;
pub use fmt::FmtCmd;
pub use init::InitCmd;
pub use list::ListCmd;
pub use outdated::OutdatedCmd;
pub use sections::SectionsCmd;
pub use watch::WatchCmd;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;

use crate::config::ProjectConfig;
use crate::manifests::{Manifest, load_manifests};

/// Path arguments governed by one `.reqpin.toml`.
struct Project {
    config: ProjectConfig,
    paths: Vec<PathBuf>,
}

/// Group path arguments by their nearest project config, in argument order.
///
/// Paths with no config at all share the defaults.
fn projects_for(paths: &[PathBuf]) -> Result<Vec<Project>> {
    let mut projects: Vec<Project> = Vec::new();
    for path in paths {
        let config = ProjectConfig::find(path)?;
        match projects.iter_mut().find(|p| p.config.dir == config.dir) {
            Some(project) => project.paths.push(path.clone()),
            None => projects.push(Project {
                config,
                paths: vec![path.clone()],
            }),
        }
    }
    Ok(projects)
}

/// Load every project's manifests with its own config, each file once.
fn load_project_manifests(projects: &[Project]) -> Result<Vec<(&Project, Vec<Manifest>)>> {
    let mut seen = HashSet::new();
    let mut loaded = Vec::with_capacity(projects.len());
    for project in projects {
        let manifests: Vec<Manifest> = load_manifests(&project.paths, &project.config)?
            .into_iter()
            .filter(|m| seen.insert(m.path.clone()))
            .collect();
        loaded.push((project, manifests));
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_each_path_uses_its_own_project_config() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a/.reqpin.toml"), "patterns = [\"deps.txt\"]\n").unwrap();
        fs::write(root.join("a/deps.txt"), "six == 1.15.0\n").unwrap();
        fs::write(root.join("a/requirements.txt"), "numpy == 1.19.2\n").unwrap();
        fs::write(root.join("b/requirements.txt"), "pandas == 1.1.3\n").unwrap();
        fs::write(root.join("b/deps.txt"), "scipy == 1.5.2\n").unwrap();

        let paths = vec![root.join("a"), root.join("b"), root.join("a/deps.txt")];
        let projects = projects_for(&paths).unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].paths.len(), 2);
        assert_eq!(projects[0].config.patterns, vec!["deps.txt"]);

        let loaded = load_project_manifests(&projects).unwrap();
        let files: Vec<_> = loaded
            .iter()
            .flat_map(|(_, manifests)| manifests.iter().map(|m| m.path.clone()))
            .collect();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a/deps.txt"));
        assert!(files[1].ends_with("b/requirements.txt"));
    }
}
