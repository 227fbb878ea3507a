//! Local Steel Browser runtime (`steel dev start|stop`)
//!
//! The runtime is a checkout of the steel-browser repository under the
//! config directory. Starting and stopping it is one Docker Compose call
//! each, run through [`run_with_output`].

use crate::runtime::command::run_with_output;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use url::Url;

const REPO_URL: &str = "https://github.com/steel-dev/steel-browser.git";
const COMPOSE_FILE: &str = "docker-compose.yml";
const DEFAULT_API_PORT: &str = "3000";

/// Environment variables naming the local API, checked in order
pub const API_URL_ENVS: [&str; 2] = ["STEEL_BROWSER_API_URL", "STEEL_LOCAL_API_URL"];

/// The two ways Docker Compose is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compose {
    /// Standalone `docker-compose`
    V1,
    /// The `docker compose` plugin
    V2,
}

impl Compose {
    pub fn program(&self) -> &'static str {
        match self {
            Compose::V1 => "docker-compose",
            Compose::V2 => "docker compose",
        }
    }

    /// `up -d` with the API port passed through the environment
    pub fn up_command(&self, api_port: &str) -> String {
        format!("API_PORT={} {} -f {} up -d", api_port, self.program(), COMPOSE_FILE)
    }

    pub fn down_command(&self) -> String {
        format!("{} -f {} down", self.program(), COMPOSE_FILE)
    }
}

/// Where the runtime checkout lives: `<config dir>/steel-browser`
pub fn repo_path(config_dir: &Path) -> PathBuf {
    let name = REPO_URL
        .rsplit('/')
        .next()
        .unwrap_or(REPO_URL)
        .trim_end_matches(".git");
    config_dir.join(name)
}

/// API port for `up`: an explicit port, else the port of the configured API
/// URL, else 3000
pub fn api_port(explicit: Option<u16>, configured_url: Option<&str>) -> String {
    if let Some(port) = explicit.filter(|p| *p > 0) {
        return port.to_string();
    }
    let Some(raw) = configured_url.map(str::trim).filter(|u| !u.is_empty()) else {
        return DEFAULT_API_PORT.to_string();
    };
    match Url::parse(raw) {
        Ok(url) => url
            .port_or_known_default()
            .map(|p| p.to_string())
            .unwrap_or_else(|| DEFAULT_API_PORT.to_string()),
        Err(_) => port_after_colon(raw).unwrap_or_else(|| DEFAULT_API_PORT.to_string()),
    }
}

/// `host:1234` or `host:1234/path` without a scheme
fn port_after_colon(raw: &str) -> Option<String> {
    let (_, rest) = raw.rsplit_once(':')?;
    let digits = rest.split('/').next()?;
    let numeric = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    numeric.then(|| digits.to_string())
}

/// First set value of [`API_URL_ENVS`]
pub fn configured_api_url() -> Option<String> {
    API_URL_ENVS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Whether a command exits successfully, ignoring its output
async fn succeeds(command: &str, cwd: &Path) -> bool {
    run_with_output(command, cwd, |_| {}).await.is_ok()
}

pub async fn docker_running(cwd: &Path) -> bool {
    succeeds("docker info", cwd).await
}

/// Prefer standalone `docker-compose`, then the plugin
pub async fn resolve_compose(cwd: &Path) -> Option<Compose> {
    for compose in [Compose::V1, Compose::V2] {
        if succeeds(&format!("{} version", compose.program()), cwd).await {
            return Some(compose);
        }
    }
    None
}

/// A `steel dev` subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevAction {
    Start {
        port: Option<u16>,
        /// Only report whether Docker is running
        docker_check: bool,
        verbose: bool,
    },
    Stop {
        verbose: bool,
    },
}

/// Options for [`start`]
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub port: Option<u16>,
    pub configured_url: Option<String>,
    pub skip_docker_check: bool,
}

/// What [`start`] brought up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    pub repo_path: PathBuf,
    pub api_port: String,
    pub compose: Compose,
}

fn ensure_installed(repo: &Path) -> Result<()> {
    if !repo.is_dir() {
        bail!(
            "Local browser runtime is not installed. Clone {} into {} first.",
            REPO_URL,
            repo.display()
        );
    }
    Ok(())
}

async fn compose_for(repo: &Path) -> Result<Compose> {
    match resolve_compose(repo).await {
        Some(compose) => Ok(compose),
        None => bail!(
            "Could not find Docker Compose. Install `docker compose` (v2) or `docker-compose`."
        ),
    }
}

/// Start the runtime containers, passing Compose output to `on_line`
pub async fn start<F: FnMut(&str)>(
    config_dir: &Path,
    options: &StartOptions,
    on_line: F,
) -> Result<Started> {
    let repo = repo_path(config_dir);
    ensure_installed(&repo)?;
    if !options.skip_docker_check && !docker_running(&repo).await {
        bail!("Docker is not running. Start Docker and try again.");
    }
    let compose = compose_for(&repo).await?;
    let api_port = api_port(options.port, options.configured_url.as_deref());
    log::info!("starting local runtime in {} on port {}", repo.display(), api_port);
    run_with_output(&compose.up_command(&api_port), &repo, on_line)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start local Steel Browser runtime: {}", e))?;
    Ok(Started {
        repo_path: repo,
        api_port,
        compose,
    })
}

/// Stop the runtime containers, returning the checkout path
pub async fn stop<F: FnMut(&str)>(config_dir: &Path, on_line: F) -> Result<PathBuf> {
    let repo = repo_path(config_dir);
    ensure_installed(&repo)?;
    let compose = compose_for(&repo).await?;
    log::info!("stopping local runtime in {}", repo.display());
    run_with_output(&compose.down_command(), &repo, on_line)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to stop local Steel Browser runtime: {}", e))?;
    Ok(repo)
}
