use crate::platform::HostOs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: HostOs,
    pub arch: String,
}

/// Everything a single installer run needs to know, after CLI and
/// environment overrides have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    pub version: Option<String>,
    pub tools_dir: PathBuf,
    pub temp_dir: Option<PathBuf>,
    pub latest_release_url: String,
    pub download_url_template: String,
    pub github_token: Option<String>,
}

/// The subset of the GitHub release payload we care about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    #[serde(default)]
    pub tag_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TelemetryRecord {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}
