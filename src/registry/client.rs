//! Registry client trait and common types.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::RegistryError;

/// Metadata about a package from a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub summary: Option<String>,
    /// What the index reports as the current release.
    pub latest_version: Option<String>,
    pub releases: Vec<ReleaseInfo>,
}

/// One published release of a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub version: String,
    /// A release counts as yanked only when every uploaded file is yanked.
    pub yanked: bool,
    pub yanked_reason: Option<String>,
    /// Earliest upload time among the release's files.
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl PackageInfo {
    /// Find a release by version, case-insensitively.
    pub fn release(&self, version: &str) -> Option<&ReleaseInfo> {
        self.releases
            .iter()
            .find(|r| r.version.eq_ignore_ascii_case(version))
    }

    /// Releases matching a `1.2.*` prefix pin (`1.2`, `1.2.0`, `1.2.10`, ...).
    pub fn releases_matching_prefix(&self, pattern: &str) -> Vec<&ReleaseInfo> {
        let stem = pattern.trim_end_matches(".*").to_ascii_lowercase();
        let dotted = format!("{}.", stem);
        self.releases
            .iter()
            .filter(|r| {
                let v = r.version.to_ascii_lowercase();
                v == stem || v.starts_with(&dotted)
            })
            .collect()
    }
}

/// Trait for registry clients.
///
/// Lookups take the PEP 503 normalized package name.
pub trait RegistryClient: Send + Sync {
    /// Get package metadata, including every release.
    fn get_package(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<PackageInfo, RegistryError>> + Send;
}
