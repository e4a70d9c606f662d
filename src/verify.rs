use crate::env::Environment;
use crate::error::{InstallerError, Result};
use std::path::PathBuf;
use tokio::process::Command;

/// Locates `tool` on the environment's PATH and runs `<tool> --version`.
pub async fn verify_installation(env: &dyn Environment, tool: &str) -> Result<PathBuf> {
    tracing::info!("Verifying the Bicep installation...");

    let cwd = std::env::current_dir()?;
    let tool_path = which::which_in(tool, Some(env.search_path()?), cwd).map_err(|source| {
        InstallerError::ExecutableNotFound {
            name: tool.to_string(),
            source,
        }
    })?;

    tracing::debug!("Executing: {} --version", tool_path.display());
    let status = Command::new(&tool_path)
        .arg("--version")
        .status()
        .await
        .map_err(|e| InstallerError::VerificationFailed {
            path: tool_path.clone(),
            reason: e.to_string(),
        })?;

    if !status.success() {
        return Err(InstallerError::VerificationFailed {
            path: tool_path,
            reason: match status.code() {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by a signal".to_string(),
            },
        });
    }

    Ok(tool_path)
}
