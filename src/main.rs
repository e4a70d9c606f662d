mod cache;
mod cli;
mod config;
mod download;
mod env;
mod error;
mod install;
mod pipeline;
mod platform;
mod types;
mod verify;
mod version;


use anyhow::Result;
use cache::LocalToolCache;
use clap::Parser;
use cli::Cli;
use config::{load_settings, USER_AGENT};
use download::HttpDownloader;
use env::ProcessEnvironment;
use install::github::GitHubReleases;
use install::{InstallOutcome, Installer};
use pipeline::TaskResult;
use platform::get_system_info;
use types::TelemetryRecord;

const TELEMETRY_AREA: &str = "TaskEndpointId";
const TELEMETRY_FEATURE: &str = "AzureBicepToolInstaller";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    pipeline::publish_telemetry(
        TELEMETRY_AREA,
        TELEMETRY_FEATURE,
        &TelemetryRecord {
            job_id: std::env::var("SYSTEM_JOBID").ok(),
        },
    );

    match run(&cli).await {
        Ok(outcome) => {
            tracing::info!(
                "Bicep {} is ready at {}",
                outcome.version.version,
                outcome.executable_path.display()
            );
            if outcome.version.is_fallback() {
                tracing::warn!("Installed the built-in stable version; pass --version to pin a release");
            }
            pipeline::set_result(TaskResult::Succeeded, "");
        }
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::error!("{}", message);
            pipeline::set_result(TaskResult::Failed, &message);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<InstallOutcome> {
    let settings = load_settings(cli)?;
    let platform = get_system_info();
    tracing::debug!("Host platform: {} {}", platform.os, platform.arch);

    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let releases = GitHubReleases::new(
        client.clone(),
        settings.latest_release_url.clone(),
        settings.github_token.clone(),
    );
    let downloader = HttpDownloader::new(client);
    let cache = LocalToolCache::new(&settings.tools_dir, platform.arch.clone());

    let installer = Installer {
        releases: &releases,
        downloader: &downloader,
        cache: &cache,
        host_os: platform.os,
        download_url_template: settings.download_url_template.clone(),
        temp_dir: settings.temp_dir.clone(),
    };

    let mut env = ProcessEnvironment;
    Ok(installer.install(settings.version.as_deref(), &mut env).await?)
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "info"
    } else if cli.verbose == 1 {
        "debug"
    } else {
        "trace"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
