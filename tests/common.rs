use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Agent variables that would leak the developer's or CI's setup into a run.
const AGENT_VARS: &[&str] = &[
    "INPUT_VERSION",
    "AGENT_TOOLSDIRECTORY",
    "AGENT_TEMPDIRECTORY",
    "BICEP_LATEST_RELEASE_URL",
    "BICEP_DOWNLOAD_URL_TEMPLATE",
    "GITHUB_TOKEN",
    "SYSTEM_JOBID",
    "RUST_LOG",
];

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub tools_dir: PathBuf,
    pub agent_temp_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tools_dir = temp_dir.path().join("tools");
        let agent_temp_dir = temp_dir.path().join("agent-tmp");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_bicep-installer"));

        Self {
            _temp_dir: temp_dir,
            tools_dir,
            agent_temp_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        for var in AGENT_VARS {
            cmd.env_remove(var);
        }
        cmd.env("AGENT_TOOLSDIRECTORY", &self.tools_dir);
        cmd.env("AGENT_TEMPDIRECTORY", &self.agent_temp_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_DATA_HOME", self._temp_dir.path().join("data"));
        cmd
    }

    /// Points both release endpoints at a mock server.
    pub fn cmd_against(&self, base_url: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.env(
            "BICEP_LATEST_RELEASE_URL",
            format!("{}/repos/Azure/bicep/releases/latest", base_url),
        );
        cmd.env(
            "BICEP_DOWNLOAD_URL_TEMPLATE",
            format!("{}/download/{{tag}}/bicep-{{platform}}{{ext}}", base_url),
        );
        cmd
    }

    /// Cached executables for `version`, one per architecture directory.
    pub fn cached_binaries(&self, version: &str) -> Vec<PathBuf> {
        let version_dir = self.tools_dir.join("bicep").join(version);
        let Ok(entries) = std::fs::read_dir(&version_dir) else {
            return Vec::new();
        };
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .map(|dir| dir.join(if cfg!(windows) { "bicep.exe" } else { "bicep" }))
            .filter(|path| path.is_file())
            .collect()
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stdout_lacks(&self, text: &str) -> &Self {
        assert!(
            !self.stdout.contains(text),
            "Stdout unexpectedly contained '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }
}
