//! Fetching, caching and installing the Bicep CLI
//!
//! This module provides:
//! - Download-and-cache of a resolved Bicep version
//! - The install flow: resolve, fetch, PATH update, verification

pub mod github;

use crate::cache::ToolCache;
use crate::config::TOOL_NAME;
use crate::download::Downloader;
use crate::env::Environment;
use crate::error::{InstallerError, Result};
use crate::pipeline;
use crate::platform::HostOs;
use crate::verify::verify_installation;
use crate::version::{resolve_version, BicepVersion, ResolvedVersion, VersionSource};
use github::{build_download_url, ReleaseSource};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub version: ResolvedVersion,
    pub executable_path: PathBuf,
}

pub struct Installer<'a> {
    pub releases: &'a dyn ReleaseSource,
    pub downloader: &'a dyn Downloader,
    pub cache: &'a dyn ToolCache,
    pub host_os: HostOs,
    pub download_url_template: String,
    pub temp_dir: Option<PathBuf>,
}

impl Installer<'_> {
    /// Returns the path of the Bicep executable for `version`, downloading
    /// it into the tool cache first if needed.
    pub async fn fetch_tool(&self, version: &BicepVersion) -> Result<PathBuf> {
        let version_key = version.to_string();
        let executable_name = self.host_os.executable_name(TOOL_NAME);

        let tool_dir = match self.cache.find(TOOL_NAME, &version_key) {
            Some(dir) => {
                tracing::info!(
                    "Bicep {} is already installed at {}",
                    version,
                    dir.display()
                );
                dir
            }
            None => {
                let (url, _) =
                    build_download_url(&self.download_url_template, version, self.host_os);
                let staging_dir = self.staging_dir()?;

                let downloaded = self
                    .downloader
                    .download(&url, staging_dir.path())
                    .await
                    .map_err(|source| InstallerError::DownloadFailed {
                        url: url.clone(),
                        source,
                    })?;

                let dir = self
                    .cache
                    .cache_file(&downloaded, &executable_name, TOOL_NAME, &version_key)?;
                tracing::info!(
                    "Successfully downloaded Bicep {} to {}",
                    version,
                    dir.display()
                );
                dir
            }
        };

        let executable_path = tool_dir.join(executable_name);
        make_executable(&executable_path)?;
        Ok(executable_path)
    }

    pub async fn install(
        &self,
        requested: Option<&str>,
        env: &mut dyn Environment,
    ) -> Result<InstallOutcome> {
        let resolved = resolve_version(requested, self.releases).await?;
        if let VersionSource::Fallback { reason } = &resolved.source {
            pipeline::log_warning(&format!(
                "Could not determine the latest Bicep version ({}); using {}",
                reason, resolved.version
            ));
        }

        let executable_path = self.fetch_tool(&resolved.version).await?;

        if let Some(tool_dir) = executable_path.parent() {
            if !env.path_starts_with(tool_dir) {
                env.prepend_path(tool_dir)?;
            }
        }

        verify_installation(env, TOOL_NAME).await?;

        Ok(InstallOutcome {
            version: resolved,
            executable_path,
        })
    }

    fn staging_dir(&self) -> Result<TempDir> {
        let dir = match &self.temp_dir {
            Some(root) => {
                fs::create_dir_all(root)?;
                TempDir::new_in(root)?
            }
            None => TempDir::new()?,
        };
        Ok(dir)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o777);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> Result<()> {
    fs::metadata(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalToolCache;
    use crate::config::DOWNLOAD_URL_TEMPLATE;
    use crate::download::DownloadError;
    use crate::env::fake::FakeEnvironment;
    use crate::install::github::ReleaseLookupError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const FAKE_BICEP: &str = "#!/bin/sh\necho \"Bicep CLI version 0.4.1008\"\n";

    struct UnreachableReleases;

    #[async_trait]
    impl ReleaseSource for UnreachableReleases {
        fn describe(&self) -> String {
            "unreachable".to_string()
        }

        async fn latest_tag(&self) -> std::result::Result<String, ReleaseLookupError> {
            Err(ReleaseLookupError::MissingTag)
        }
    }

    struct FakeDownloader {
        body: Option<&'static str>,
        urls: Mutex<Vec<String>>,
    }

    impl FakeDownloader {
        fn serving(body: &'static str) -> Self {
            Self {
                body: Some(body),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        async fn download(
            &self,
            url: &str,
            dest_dir: &Path,
        ) -> std::result::Result<PathBuf, DownloadError> {
            self.urls.lock().unwrap().push(url.to_string());
            let body = self
                .body
                .ok_or(DownloadError::Status(reqwest::StatusCode::NOT_FOUND))?;
            let path = dest_dir.join("bicep-download");
            std::fs::write(&path, body)?;
            Ok(path)
        }
    }

    struct CountingCache {
        inner: LocalToolCache,
        writes: AtomicUsize,
    }

    impl ToolCache for CountingCache {
        fn find(&self, tool: &str, version: &str) -> Option<PathBuf> {
            self.inner.find(tool, version)
        }

        fn cache_file(&self, source: &Path, file_name: &str, tool: &str, version: &str) -> Result<PathBuf> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.cache_file(source, file_name, tool, version)
        }
    }

    fn counting_cache(root: &Path) -> CountingCache {
        CountingCache {
            inner: LocalToolCache::new(root, "x64"),
            writes: AtomicUsize::new(0),
        }
    }

    fn installer<'a>(downloader: &'a FakeDownloader, cache: &'a CountingCache, temp: &Path) -> Installer<'a> {
        Installer {
            releases: &UnreachableReleases,
            downloader,
            cache,
            host_os: HostOs::Linux,
            download_url_template: DOWNLOAD_URL_TEMPLATE.to_string(),
            temp_dir: Some(temp.to_path_buf()),
        }
    }

    #[tokio::test]
    async fn test_fetch_twice_downloads_once() {
        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::serving("binary");
        let cache = counting_cache(&root.path().join("tools"));
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));
        let version = BicepVersion::sanitize("0.4.1008").unwrap();

        let first = installer.fetch_tool(&version).await.unwrap();
        let second = installer.fetch_tool(&version).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, root.path().join("tools/bicep/0.4.1008/x64/bicep"));
        assert_eq!(
            downloader.calls(),
            vec!["https://github.com/Azure/bicep/releases/download/v0.4.1008/bicep-linux-x64"]
        );
        assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fetch_marks_executable() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::serving("binary");
        let cache = counting_cache(root.path());
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));

        let path = installer
            .fetch_tool(&BicepVersion::sanitize("1.0.0").unwrap())
            .await
            .unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_cache_entry() {
        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::failing();
        let cache = counting_cache(root.path());
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));

        let err = installer
            .fetch_tool(&BicepVersion::sanitize("0.4.1008").unwrap())
            .await
            .unwrap_err();

        match err {
            InstallerError::DownloadFailed { url, .. } => assert!(url.contains("v0.4.1008")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
        assert!(cache.find(TOOL_NAME, "0.4.1008").is_none());
    }

    #[tokio::test]
    async fn test_invalid_version_touches_nothing() {
        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::serving(FAKE_BICEP);
        let cache = counting_cache(root.path());
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));
        let mut env = FakeEnvironment::default();

        let err = installer
            .install(Some("not-a-version"), &mut env)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::InvalidVersion { .. }));
        assert!(downloader.calls().is_empty());
        assert_eq!(cache.writes.load(Ordering::SeqCst), 0);
        assert_eq!(env.prepends, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_end_to_end() {
        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::serving(FAKE_BICEP);
        let cache = counting_cache(&root.path().join("tools"));
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));
        let mut env = FakeEnvironment {
            entries: vec![PathBuf::from("/usr/bin"), PathBuf::from("/bin")],
            ..Default::default()
        };

        let outcome = installer.install(Some("0.4.1008"), &mut env).await.unwrap();

        let tool_dir = root.path().join("tools/bicep/0.4.1008/x64");
        assert_eq!(outcome.version.source, VersionSource::Requested);
        assert_eq!(outcome.executable_path, tool_dir.join("bicep"));
        assert_eq!(env.entries[0], tool_dir);
        assert_eq!(env.prepends, 1);

        // Already first on PATH: no second prepend
        installer.install(Some("0.4.1008"), &mut env).await.unwrap();
        assert_eq!(env.prepends, 1);
        assert_eq!(downloader.calls().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_latest_falls_back_to_stable() {
        let root = TempDir::new().unwrap();
        let downloader = FakeDownloader::serving(FAKE_BICEP);
        let cache = counting_cache(root.path());
        let installer = installer(&downloader, &cache, &root.path().join("tmp"));
        let mut env = FakeEnvironment::default();

        let outcome = installer.install(None, &mut env).await.unwrap();

        assert!(outcome.version.is_fallback());
        assert_eq!(outcome.version.version.to_string(), "0.1.226-alpha");
        assert_eq!(
            downloader.calls(),
            vec!["https://github.com/Azure/bicep/releases/download/v0.1.226-alpha/bicep-linux-x64"]
        );
    }
}
