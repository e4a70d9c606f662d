//! GitHub release metadata and download URLs for Bicep.

use crate::config::USER_AGENT;
use crate::platform::HostOs;
use crate::types::GitHubRelease;
use crate::version::BicepVersion;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseLookupError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned {status}")]
    RequestFailed { url: String, status: StatusCode },
    #[error("release metadata has no tag_name")]
    MissingTag,
}

/// Where the "latest" Bicep release is looked up.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    fn describe(&self) -> String;

    async fn latest_tag(&self) -> Result<String, ReleaseLookupError>;
}

pub struct GitHubReleases {
    client: reqwest::Client,
    latest_url: String,
    token: Option<String>,
}

impl GitHubReleases {
    pub fn new(client: reqwest::Client, latest_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            latest_url: latest_url.into(),
            token,
        }
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    fn describe(&self) -> String {
        self.latest_url.clone()
    }

    async fn latest_tag(&self) -> Result<String, ReleaseLookupError> {
        tracing::debug!("Fetching GitHub release info from: {}", self.latest_url);

        let mut request = self
            .client
            .get(&self.latest_url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT);

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
            tracing::debug!("Using GITHUB_TOKEN");
        }

        let http_err = |source| ReleaseLookupError::Http {
            url: self.latest_url.clone(),
            source,
        };

        let response = request.send().await.map_err(http_err)?;
        if !response.status().is_success() {
            return Err(ReleaseLookupError::RequestFailed {
                url: self.latest_url.clone(),
                status: response.status(),
            });
        }

        let release: GitHubRelease = response.json().await.map_err(http_err)?;
        release
            .tag_name
            .filter(|tag| !tag.trim().is_empty())
            .ok_or(ReleaseLookupError::MissingTag)
    }
}

/// Download location of the Bicep binary for `version` on `os`, together
/// with the executable extension used for that platform.
pub fn build_download_url(template: &str, version: &BicepVersion, os: HostOs) -> (String, &'static str) {
    let ext = os.executable_extension();
    let url = template
        .replace("{tag}", &version.release_tag())
        .replace("{version}", &version.to_string())
        .replace("{platform}", os.artifact_suffix())
        .replace("{ext}", ext);
    (url, ext)
}
