use clap::Parser;
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("BICEP_INSTALLER_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("BICEP_INSTALLER_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("BICEP_INSTALLER_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser, Debug)]
#[command(name = "bicep-installer")]
#[command(about = "Installs the Azure Bicep CLI, caches it and puts it on PATH")]
#[command(
    version = get_version(),
    disable_version_flag = true,
    after_help = "Examples:\n  bicep-installer\n  bicep-installer --version 0.4.1008\n  INPUT_VERSION=latest bicep-installer -v"
)]
pub struct Cli {
    /// Bicep version to install: a semver version or 'latest' [env: INPUT_VERSION]
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Root of the local tool cache [env: AGENT_TOOLSDIRECTORY]
    #[arg(long, value_name = "DIR")]
    pub tools_dir: Option<PathBuf>,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the installer's own version
    #[arg(short = 'V', long = "installer-version", action = clap::ArgAction::Version)]
    pub installer_version: Option<bool>,
}
