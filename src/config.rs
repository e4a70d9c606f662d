use crate::cli::Cli;
use crate::types::InstallerSettings;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "bicep-installer";
pub const TOOLS_DIR_NAME: &str = "tools";
pub const TOOL_NAME: &str = "bicep";

/// Used whenever the latest release cannot be determined.
pub const STABLE_BICEP_VERSION: &str = "0.1.226-alpha";

pub const LATEST_RELEASE_URL: &str = "https://api.github.com/repos/Azure/bicep/releases/latest";
pub const DOWNLOAD_URL_TEMPLATE: &str =
    "https://github.com/Azure/bicep/releases/download/{tag}/bicep-{platform}{ext}";

pub const USER_AGENT: &str = concat!("bicep-installer/", env!("CARGO_PKG_VERSION"));

pub fn get_user_data_dir() -> Result<PathBuf> {
    let path = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
        .join(APP_NAME);
    tracing::debug!("User data directory: {}", path.display());
    Ok(path)
}

pub fn get_default_tools_dir() -> Result<PathBuf> {
    Ok(get_user_data_dir()?.join(TOOLS_DIR_NAME))
}

/// Builds the run settings from the command line, falling back to the
/// variables the pipeline agent exports for task inputs and directories.
pub fn load_settings(cli: &Cli) -> Result<InstallerSettings> {
    let version = cli
        .version
        .clone()
        .or_else(|| non_empty_var("INPUT_VERSION"))
        .filter(|v| !v.trim().is_empty());

    let tools_dir = match cli
        .tools_dir
        .clone()
        .or_else(|| non_empty_var("AGENT_TOOLSDIRECTORY").map(PathBuf::from))
    {
        Some(dir) => dir,
        None => get_default_tools_dir()?,
    };
    fs::create_dir_all(&tools_dir)
        .with_context(|| format!("Could not create tools directory {}", tools_dir.display()))?;
    tracing::debug!("Tools directory: {}", tools_dir.display());

    let temp_dir = non_empty_var("AGENT_TEMPDIRECTORY").map(PathBuf::from);

    let latest_release_url =
        non_empty_var("BICEP_LATEST_RELEASE_URL").unwrap_or_else(|| LATEST_RELEASE_URL.to_string());
    let download_url_template = non_empty_var("BICEP_DOWNLOAD_URL_TEMPLATE")
        .unwrap_or_else(|| DOWNLOAD_URL_TEMPLATE.to_string());

    Ok(InstallerSettings {
        version,
        tools_dir,
        temp_dir,
        latest_release_url,
        download_url_template,
        github_token: non_empty_var("GITHUB_TOKEN"),
    })
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
