//! PyPI registry client (JSON API).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::client::{PackageInfo, RegistryClient, ReleaseInfo};
use super::error::RegistryError;

const PYPI_API: &str = "https://pypi.org/pypi";

/// PyPI registry client.
pub struct PypiClient {
    client: Client,
    api_url: String,
    token: Option<SecretString>,
}

impl PypiClient {
    pub fn new() -> Self {
        Self::with_api_url(PYPI_API.to_string())
    }

    pub fn with_api_url(api_url: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<SecretString>) -> Self {
        self.token = token;
        self
    }

    fn package_url(&self, name: &str) -> Result<Url, RegistryError> {
        Url::parse(&format!("{}/{}/json", self.api_url, name))
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {}", self.api_url, e)))
    }
}

impl Default for PypiClient {
    fn default() -> Self {
        Self::new()
    }
}

// PyPI API response types
#[derive(Debug, Deserialize)]
struct PypiPackageResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: BTreeMap<String, Vec<PypiFile>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    summary: Option<String>,
    version: String,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    #[serde(default)]
    upload_time_iso_8601: Option<DateTime<Utc>>,
    #[serde(default)]
    yanked: bool,
    #[serde(default)]
    yanked_reason: Option<String>,
}

impl RegistryClient for PypiClient {
    async fn get_package(&self, name: &str) -> Result<PackageInfo, RegistryError> {
        let url = self.package_url(name)?;
        debug!(package = name, url = %url, "fetching pypi package");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(RegistryError::PackageNotFound(name.to_string())),
            StatusCode::TOO_MANY_REQUESTS => return Err(RegistryError::RateLimited),
            _ => {}
        }

        let body = response.error_for_status()?.text().await?;
        let pypi_pkg: PypiPackageResponse = serde_json::from_str(&body)?;

        let releases: Vec<ReleaseInfo> = pypi_pkg
            .releases
            .into_iter()
            .filter(|(_, files)| !files.is_empty())
            .map(|(version, files)| to_release(version, &files))
            .collect();

        debug!(package = name, releases = releases.len(), "fetched pypi package");

        Ok(PackageInfo {
            name: pypi_pkg.info.name,
            summary: pypi_pkg.info.summary,
            latest_version: Some(pypi_pkg.info.version).filter(|v| !v.is_empty()),
            releases,
        })
    }
}

/// Collapse per-file metadata into one release record.
fn to_release(version: String, files: &[PypiFile]) -> ReleaseInfo {
    let yanked = !files.is_empty() && files.iter().all(|f| f.yanked);
    let yanked_reason = if yanked {
        files.iter().find_map(|f| f.yanked_reason.clone())
    } else {
        None
    };
    let uploaded_at = files.iter().filter_map(|f| f.upload_time_iso_8601).min();

    ReleaseInfo {
        version,
        yanked,
        yanked_reason,
        uploaded_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn requests_body() -> serde_json::Value {
        json!({
            "info": {
                "name": "requests",
                "summary": "Python HTTP for Humans.",
                "version": "2.25.1"
            },
            "releases": {
                "2.24.0": [
                    {"upload_time_iso_8601": "2020-06-17T14:40:53.120000Z", "yanked": false, "yanked_reason": null},
                    {"upload_time_iso_8601": "2020-06-17T14:40:50.000000Z", "yanked": false, "yanked_reason": null}
                ],
                "2.25.0": [
                    {"upload_time_iso_8601": "2020-11-11T19:20:00.000000Z", "yanked": true, "yanked_reason": "broken wheel"}
                ],
                "2.25.1": [
                    {"upload_time_iso_8601": "2020-12-16T18:51:02.000000Z", "yanked": false, "yanked_reason": null}
                ],
                "3.0.0.dev0": []
            }
        })
    }

    #[tokio::test]
    async fn test_get_package_parses_releases() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/pypi/requests/json");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(requests_body());
            })
            .await;

        let client = PypiClient::with_api_url(server.url("/pypi/"));
        let pkg = client.get_package("requests").await.unwrap();

        mock.assert_async().await;
        assert_eq!(pkg.name, "requests");
        assert_eq!(pkg.latest_version.as_deref(), Some("2.25.1"));
        // Releases without files are dropped
        assert_eq!(pkg.releases.len(), 3);
        assert!(pkg.release("3.0.0.dev0").is_none());

        let old = pkg.release("2.24.0").unwrap();
        assert!(!old.yanked);
        assert_eq!(
            old.uploaded_at.unwrap().to_rfc3339(),
            "2020-06-17T14:40:50+00:00"
        );

        let yanked = pkg.release("2.25.0").unwrap();
        assert!(yanked.yanked);
        assert_eq!(yanked.yanked_reason.as_deref(), Some("broken wheel"));
    }

    #[tokio::test]
    async fn test_get_package_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pypi/nope/json");
                then.status(404);
            })
            .await;

        let client = PypiClient::with_api_url(server.url("/pypi"));
        let err = client.get_package("nope").await.unwrap_err();
        assert!(matches!(err, RegistryError::PackageNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_get_package_rate_limited() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pypi/six/json");
                then.status(429);
            })
            .await;

        let client = PypiClient::with_api_url(server.url("/pypi"));
        let err = client.get_package("six").await.unwrap_err();
        assert!(matches!(err, RegistryError::RateLimited));
    }

    #[tokio::test]
    async fn test_get_package_server_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/pypi/six/json");
                then.status(500);
            })
            .await;

        let client = PypiClient::with_api_url(server.url("/pypi"));
        let err = client.get_package("six").await.unwrap_err();
        assert!(matches!(err, RegistryError::Http(_)));
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/simple-json/six/json")
                    .header("authorization", "Bearer s3cret");
                then.status(200).json_body(json!({
                    "info": {"name": "six", "summary": null, "version": "1.15.0"},
                    "releases": {"1.15.0": [{"yanked": false}]}
                }));
            })
            .await;

        let client = PypiClient::with_api_url(server.url("/simple-json"))
            .with_token(Some(SecretString::from("s3cret".to_string())));
        let pkg = client.get_package("six").await.unwrap();

        mock.assert_async().await;
        assert_eq!(pkg.releases.len(), 1);
        assert!(pkg.releases[0].uploaded_at.is_none());
    }

    #[test]
    fn test_invalid_api_url() {
        let client = PypiClient::with_api_url("not a url".to_string());
        assert!(matches!(
            client.package_url("six"),
            Err(RegistryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_to_release_partial_yank() {
        let files = vec![
            PypiFile {
                upload_time_iso_8601: None,
                yanked: true,
                yanked_reason: Some("bad".to_string()),
            },
            PypiFile {
                upload_time_iso_8601: None,
                yanked: false,
                yanked_reason: None,
            },
        ];
        let release = to_release("1.0".to_string(), &files);
        assert!(!release.yanked);
        assert!(release.yanked_reason.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_package_requests_live() {
        let client = PypiClient::new();
        let pkg = client.get_package("requests").await.unwrap();
        assert_eq!(pkg.name.to_lowercase(), "requests");
        assert!(!pkg.releases.is_empty());
    }
}
