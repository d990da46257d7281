//! Registry audit: compare each pin with what the index publishes.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::manifests::Pin;
use crate::registry::{PackageInfo, RegistryClient, RegistryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AuditStatus {
    /// Pinned to the latest release, or to a plain release newer than it.
    Current,
    Outdated { latest: String },
    Yanked { reason: Option<String> },
    /// The package exists but the pinned version was never released.
    UnknownVersion,
    UnknownPackage,
    /// The lookup itself failed.
    Failed { error: String },
}

impl AuditStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::Current => "current",
            AuditStatus::Outdated { .. } => "outdated",
            AuditStatus::Yanked { .. } => "yanked",
            AuditStatus::UnknownVersion => "unknown version",
            AuditStatus::UnknownPackage => "unknown package",
            AuditStatus::Failed { .. } => "failed",
        }
    }

    /// Whether the pin needs attention.
    pub fn is_problem(&self) -> bool {
        !matches!(self, AuditStatus::Current)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub name: String,
    pub version: String,
    pub latest: Option<String>,
    /// Upload time of the pinned release.
    pub released: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: AuditStatus,
}

/// Look up every pin, at most `concurrency` requests in flight.
///
/// Each package is fetched once no matter how many pins name it. Entries come
/// back in the same order as `pins`.
pub async fn audit_pins<C: RegistryClient>(
    client: &C,
    pins: &[Pin],
    concurrency: usize,
) -> Vec<AuditEntry> {
    let mut names: Vec<String> = pins.iter().map(Pin::normalized_name).collect();
    names.sort();
    names.dedup();

    debug!(pins = pins.len(), packages = names.len(), concurrency, "auditing pins");

    let lookups: HashMap<String, Result<PackageInfo, RegistryError>> =
        stream::iter(names.into_iter().map(|name| async move {
            let result = client.get_package(&name).await;
            if let Err(e) = &result {
                warn!(package = %name, error = %e, "registry lookup failed");
            }
            (name, result)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect();

    pins.iter()
        .map(|pin| match lookups.get(&pin.normalized_name()) {
            Some(Ok(info)) => evaluate(pin, info),
            Some(Err(RegistryError::PackageNotFound(_))) => {
                entry(pin, None, None, AuditStatus::UnknownPackage)
            }
            Some(Err(e)) => entry(
                pin,
                None,
                None,
                AuditStatus::Failed {
                    error: e.to_string(),
                },
            ),
            None => entry(
                pin,
                None,
                None,
                AuditStatus::Failed {
                    error: "no lookup result".to_string(),
                },
            ),
        })
        .collect()
}

fn entry(
    pin: &Pin,
    latest: Option<String>,
    released: Option<DateTime<Utc>>,
    status: AuditStatus,
) -> AuditEntry {
    AuditEntry {
        name: pin.name.clone(),
        version: pin.version.clone(),
        latest,
        released,
        status,
    }
}

fn evaluate(pin: &Pin, info: &PackageInfo) -> AuditEntry {
    let latest = info.latest_version.clone();

    if pin.is_wildcard() {
        let matching = info.releases_matching_prefix(&pin.version);
        let status = if matching.is_empty() {
            AuditStatus::UnknownVersion
        } else if matching.iter().all(|r| r.yanked) {
            AuditStatus::Yanked { reason: None }
        } else {
            match &latest {
                Some(l) if !matching.iter().any(|r| r.version.eq_ignore_ascii_case(l)) => {
                    AuditStatus::Outdated { latest: l.clone() }
                }
                _ => AuditStatus::Current,
            }
        };
        return entry(pin, latest, None, status);
    }

    let Some(release) = info.release(&pin.version) else {
        return entry(pin, latest, None, AuditStatus::UnknownVersion);
    };

    let status = if release.yanked {
        AuditStatus::Yanked {
            reason: release.yanked_reason.clone(),
        }
    } else {
        match &latest {
            Some(l) if l.eq_ignore_ascii_case(&pin.version) => AuditStatus::Current,
            Some(l) if compare_release(&pin.version, l) == Some(Ordering::Greater) => {
                AuditStatus::Current
            }
            Some(l) => AuditStatus::Outdated { latest: l.clone() },
            None => AuditStatus::Current,
        }
    };

    entry(pin, latest, release.uploaded_at, status)
}

/// Compare plain dotted-numeric releases (`1.19.2` vs `1.20`). Anything with
/// pre/post/local segments is not compared.
fn compare_release(a: &str, b: &str) -> Option<Ordering> {
    fn parts(v: &str) -> Option<Vec<u64>> {
        v.split('.').map(|p| p.parse().ok()).collect()
    }

    let mut a = parts(a)?;
    let mut b = parts(b)?;
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    Some(a.cmp(&b))
}
