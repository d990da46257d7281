//! Project configuration from `.reqpin.toml`.
//!
//! ```toml
//! roots = ["services/api"]
//! exclude = ["fixtures"]
//! patterns = ["requirements*.txt", "requirements/*.txt"]
//! spacing = "spaced"
//!
//! [rules]
//! duplicate-pin = "error"
//! unsorted-section = "warning"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::lint::RuleConfig;
use crate::types::Spacing;

pub const PROJECT_CONFIG_FILE: &str = ".reqpin.toml";

/// Default manifest file patterns. Patterns without `/` match file names
/// anywhere in the tree; patterns with `/` match trailing path components.
pub const DEFAULT_PATTERNS: &[&str] = &["requirements*.txt", "requirements/*.txt"];

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Explicit roots to scan, relative to the config file (disables auto-discovery).
    #[serde(default)]
    pub roots: Option<Vec<PathBuf>>,

    /// Additional directory names to skip during discovery.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Glob patterns identifying manifest files.
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,

    /// Spacing used by `fmt`.
    #[serde(default)]
    pub spacing: Spacing,

    /// Per-rule level overrides.
    #[serde(default)]
    pub rules: RuleConfig,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub dir: Option<PathBuf>,
}

fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            roots: None,
            exclude: Vec::new(),
            patterns: default_patterns(),
            spacing: Spacing::default(),
            rules: RuleConfig::default(),
            dir: None,
        }
    }
}

impl ProjectConfig {
    /// Load `.reqpin.toml` from exactly this directory, or defaults if absent.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let mut config: ProjectConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config.dir = Some(dir.to_path_buf());

        debug!(path = %config_path.display(), "loaded project config");
        Ok(config)
    }

    /// Find the nearest `.reqpin.toml` by walking up from `start`.
    pub fn find(start: &Path) -> Result<Self> {
        let start = std::path::absolute(start)
            .with_context(|| format!("Failed to resolve {}", start.display()))?;
        let mut current = if start.is_file() {
            start.parent().map(Path::to_path_buf).unwrap_or_default()
        } else {
            start
        };

        loop {
            if current.join(PROJECT_CONFIG_FILE).is_file() {
                return Self::load(&current);
            }
            if !current.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Explicit roots resolved against the config directory.
    pub fn resolved_roots(&self) -> Option<Vec<PathBuf>> {
        let dir = self.dir.as_ref()?;
        let roots = self.roots.as_ref()?;
        Some(roots.iter().map(|r| dir.join(r)).collect())
    }
}

/// Contents written by `reqpin init`.
pub const PROJECT_CONFIG_TEMPLATE: &str = r#"# reqpin project configuration

# Only scan these directories (relative to this file).
# roots = ["services/api"]

# Extra directory names to skip.
exclude = []

# Which files are manifests.
patterns = ["requirements*.txt", "requirements/*.txt"]

# "spaced" (numpy == 1.19.2) or "compact" (numpy==1.19.2)
spacing = "spaced"

[rules]
# invalid-line = "error"
# conflicting-pin = "error"
# duplicate-pin = "warning"
# empty-section = "warning"
# unsorted-section = "off"
# cross-file-conflict = "warning"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::Rule;
    use crate::types::RuleLevel;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let tmp = TempDir::new().unwrap();
        let config = ProjectConfig::load(tmp.path()).unwrap();
        assert!(config.roots.is_none());
        assert!(config.dir.is_none());
        assert_eq!(config.patterns, vec!["requirements*.txt", "requirements/*.txt"]);
        assert_eq!(config.spacing, Spacing::Spaced);
        assert_eq!(config.rules.level(Rule::DuplicatePin), RuleLevel::Warning);
    }

    #[test]
    fn test_load_overrides() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(PROJECT_CONFIG_FILE),
            "roots = [\"api\"]\nspacing = \"compact\"\n\n[rules]\nduplicate-pin = \"error\"\nempty-section = \"off\"\n",
        )
        .unwrap();

        let config = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(config.spacing, Spacing::Compact);
        assert_eq!(config.rules.level(Rule::DuplicatePin), RuleLevel::Error);
        assert_eq!(config.rules.level(Rule::EmptySection), RuleLevel::Off);
        assert_eq!(config.rules.level(Rule::ConflictingPin), RuleLevel::Error);
        assert_eq!(
            config.resolved_roots().unwrap(),
            vec![tmp.path().join("api")]
        );
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(PROJECT_CONFIG_FILE),
            "[rules]\nno-such-rule = \"error\"\n",
        )
        .unwrap();

        assert!(ProjectConfig::load(tmp.path()).is_err());
    }

    #[test]
    fn test_find_walks_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PROJECT_CONFIG_FILE), "exclude = [\"legacy\"]").unwrap();
        fs::create_dir_all(tmp.path().join("services/api")).unwrap();
        fs::write(tmp.path().join("services/api/requirements.txt"), "").unwrap();

        let config = ProjectConfig::find(&tmp.path().join("services/api/requirements.txt")).unwrap();
        assert_eq!(config.exclude, vec!["legacy"]);
        assert_eq!(config.dir.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn test_template_parses() {
        let config: ProjectConfig = toml::from_str(PROJECT_CONFIG_TEMPLATE).unwrap();
        assert!(config.roots.is_none());
        assert_eq!(config.patterns.len(), 2);
    }
}
