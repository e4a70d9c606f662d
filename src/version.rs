//! Resolution of the Bicep version to install.

use crate::config::STABLE_BICEP_VERSION;
use crate::error::{InstallerError, Result};
use crate::install::github::ReleaseSource;
use std::fmt;

/// A sanitized semantic version of the Bicep CLI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BicepVersion(semver::Version);

impl BicepVersion {
    /// Loosely cleans user or tag input: surrounding whitespace and leading
    /// `=`/`v` markers are dropped before strict semver parsing.
    pub fn sanitize(input: &str) -> Result<Self> {
        let cleaned = input.trim().trim_start_matches(['=', 'v', 'V']).trim();
        semver::Version::parse(cleaned)
            .map(BicepVersion)
            .map_err(|_| InstallerError::InvalidVersion {
                input: input.to_string(),
            })
    }

    /// Release tag Bicep publishes this version under.
    pub fn release_tag(&self) -> String {
        format!("v{}", self.0)
    }
}

impl fmt::Display for BicepVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Requested,
    Latest,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: BicepVersion,
    pub source: VersionSource,
}

impl ResolvedVersion {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, VersionSource::Fallback { .. })
    }
}

pub fn is_latest_request(input: Option<&str>) -> bool {
    match input.map(str::trim) {
        None | Some("") => true,
        Some(v) => v.eq_ignore_ascii_case("latest"),
    }
}

pub async fn resolve_version(
    input: Option<&str>,
    source: &dyn ReleaseSource,
) -> Result<ResolvedVersion> {
    if let Some(requested) = input.filter(|_| !is_latest_request(input)) {
        return Ok(ResolvedVersion {
            version: BicepVersion::sanitize(requested)?,
            source: VersionSource::Requested,
        });
    }

    tracing::info!("Finding the latest Bicep version from {}", source.describe());

    let lookup = source
        .latest_tag()
        .await
        .map_err(|e| e.to_string())
        .and_then(|tag| {
            BicepVersion::sanitize(&tag)
                .map_err(|_| format!("release tag '{}' is not a semver version", tag))
        });

    match lookup {
        Ok(version) => {
            tracing::info!("Latest Bicep version is {}", version);
            Ok(ResolvedVersion {
                version,
                source: VersionSource::Latest,
            })
        }
        Err(reason) => {
            tracing::warn!(
                "Error fetching the latest Bicep version from {}: {}. Using the stable version {} instead",
                source.describe(),
                reason,
                STABLE_BICEP_VERSION
            );
            Ok(ResolvedVersion {
                version: BicepVersion::sanitize(STABLE_BICEP_VERSION)?,
                source: VersionSource::Fallback { reason },
            })
        }
    }
}
