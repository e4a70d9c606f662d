use crate::types::PlatformInfo;
use std::fmt;

/// Operating systems Bicep publishes distinct binaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Darwin,
    Windows,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        Self::from_rust_os(std::env::consts::OS)
    }

    pub fn from_rust_os(os: &str) -> Self {
        match os {
            "linux" => HostOs::Linux,
            "macos" => HostOs::Darwin,
            "windows" => HostOs::Windows,
            _ => HostOs::Other,
        }
    }

    /// Platform part of the release asset name.
    ///
    /// Anything that is not Linux or macOS gets the Windows build.
    pub fn artifact_suffix(self) -> &'static str {
        match self {
            HostOs::Linux => "linux-x64",
            HostOs::Darwin => "osx-x64",
            HostOs::Windows | HostOs::Other => "win-x64",
        }
    }

    pub fn executable_extension(self) -> &'static str {
        match self {
            HostOs::Linux | HostOs::Darwin => "",
            HostOs::Windows | HostOs::Other => ".exe",
        }
    }

    pub fn executable_name(self, tool_name: &str) -> String {
        format!("{}{}", tool_name, self.executable_extension())
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostOs::Linux => "Linux",
            HostOs::Darwin => "Darwin",
            HostOs::Windows => "Windows_NT",
            HostOs::Other => "unknown",
        };
        f.write_str(name)
    }
}

pub fn get_system_info() -> PlatformInfo {
    PlatformInfo {
        os: HostOs::current(),
        arch: normalize_arch(std::env::consts::ARCH),
    }
}

/// Architecture names as used by the agent tool cache directory layout.
pub fn normalize_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "x64".to_string(),
        "x86" => "ia32".to_string(),
        "aarch64" => "arm64".to_string(),
        "arm" => "arm".to_string(),
        _ => arch.to_string(),
    }
}
