//! Interactive command runners

use crate::api::client::ApiClient;
use crate::api::dashboard::{call, download, entry_rows, fill_form, filter_entries, ApiCommand};
use crate::dev::{self, DevAction, StartOptions};
use crate::error::{ApiError, WizardError};
use crate::flow::FlowConfig;
use crate::links::Link;
use crate::prompt::{Choice, Prompter};
use crate::runtime::completion::CompletionMode;
use crate::session::{ConfigStore, Instance, Settings};
use crate::templates::{TemplateFetcher, TemplateSource};
use crate::tui::prompts::CliPrompter;
use crate::wizard::{Wizard, WizardOptions, WizardOutcome};
use anyhow::{Context, Result};
use serde_json::Map;
use std::path::PathBuf;

const USER_AGENT: &str = concat!("steel-cli/", env!("CARGO_PKG_VERSION"));

/// Offer a search box when a listing has more entries than this
const FILTER_THRESHOLD: usize = 10;

/// Arguments shared by `steel forge` and `steel cookbook`
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Local directory to use for templates instead of fetching from remote
    pub template_dir: Option<PathBuf>,

    /// Template value, label or alias
    pub template: Option<String>,

    /// Default project name
    pub name: Option<String>,

    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub openai_key: Option<String>,

    /// Do not write credentials into `.env`
    pub skip_auth: bool,

    pub completion: Option<CompletionMode>,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

impl From<CreateArgs> for WizardOptions {
    fn from(args: CreateArgs) -> Self {
        WizardOptions {
            name: args.name,
            template: args.template,
            api_url: args.api_url,
            api_key: args.api_key,
            openai_key: args.openai_key,
            skip_auth: args.skip_auth,
            completion: args.completion,
            yes: args.yes,
        }
    }
}

/// Run a scaffolding flow with interactive prompts
pub async fn run_wizard<F: FlowConfig>(flow: F, args: CreateArgs) -> Result<()> {
    cliclack::intro(flow.display_name())?;

    let source = TemplateSource::resolve(args.template_dir.as_deref())?;
    match &source {
        TemplateSource::Local(path) => {
            cliclack::log::info(format!("Using local templates from {}", path.display()))?
        }
        TemplateSource::Remote(url) => {
            cliclack::log::info(format!("Using template zips from {}", url))?
        }
        TemplateSource::Bundled => log::debug!("using bundled templates"),
    }
    let mut fetcher = TemplateFetcher::new(source, USER_AGENT);

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let wizard = Wizard::new(flow, args.into(), cwd, ConfigStore::from_env());

    let outcome = {
        let mut prompter = CliPrompter::new();
        wizard.run(&mut prompter, &mut fetcher).await?
    };

    match outcome {
        WizardOutcome::Completed {
            directory,
            run_commands,
        } => {
            print_next_steps(&run_commands);
            cliclack::outro(format!("Project ready in {}", directory.display()))?;
            Ok(())
        }
        WizardOutcome::Halted { step, message } => {
            cliclack::outro_cancel("Setup stopped")?;
            Err(WizardError::TaskFailed {
                label: step.label(),
                message,
            }
            .into())
        }
    }
}

fn print_next_steps(commands: &[String]) {
    if commands.is_empty() {
        return;
    }
    println!();
    println!("  Next steps");
    println!();
    for (i, step) in commands.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }
    println!();
}

/// Run one of the form-driven `sessions`, `files` or `tools` commands
pub async fn run_api(command: ApiCommand) -> Result<()> {
    let endpoint = command.endpoint();
    cliclack::intro(endpoint.description)?;

    let store = ConfigStore::from_env();
    let client = match ApiClient::from_store(&store) {
        Ok(client) => client,
        Err(ApiError::NotAuthenticated) => {
            cliclack::log::warning(ApiError::NotAuthenticated.to_string())?;
            cliclack::outro("Nothing to do")?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    log::debug!("using API at {}", client.base());

    let mut prompter = CliPrompter::new();
    let values = match &endpoint.form {
        Some(form) if !form.sections.is_empty() => {
            cliclack::log::step(form.title)?;
            fill_form(form, &mut prompter)?
        }
        _ => Map::new(),
    };

    let spinner = cliclack::spinner();
    spinner.start(format!("{} {}", endpoint.method, endpoint.path));

    if endpoint.save_as.is_some() {
        let file = match download(&client, &endpoint, values).await {
            Ok(file) => file,
            Err(e) => {
                spinner.error(e.to_string());
                return Err(e.into());
            }
        };
        let target = std::env::current_dir()?.join(&file.file_name);
        std::fs::write(&target, &file.bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        spinner.stop(format!("Saved {} bytes", file.bytes.len()));
        cliclack::outro(format!("Downloaded to {}", target.display()))?;
        return Ok(());
    }

    let entries = match call(&client, &endpoint, values).await {
        Ok(entries) => {
            spinner.stop(format!("{} result(s)", entries.len()));
            entries
        }
        Err(e) => {
            spinner.error(e.to_string());
            return Err(e.into());
        }
    };

    let search = if entries.len() > FILTER_THRESHOLD {
        prompter.input("Filter results (leave empty for all)", None)?
    } else {
        String::new()
    };
    for (i, entry) in filter_entries(&entries, &search).into_iter().enumerate() {
        let body = entry_rows(entry)
            .into_iter()
            .map(|(key, value)| {
                if key.is_empty() {
                    value
                } else {
                    format!("{}: {}", key, value)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        cliclack::note(format!("#{}", i + 1), body)?;
    }

    cliclack::outro("Done")?;
    Ok(())
}

/// Start or stop the local browser runtime
pub async fn run_dev(action: DevAction) -> Result<()> {
    let store = ConfigStore::from_env();
    let cwd = std::env::current_dir()?;
    match action {
        DevAction::Start {
            docker_check: true,
            ..
        } => {
            if dev::docker_running(&cwd).await {
                cliclack::log::success("Docker is running.")?;
                Ok(())
            } else {
                anyhow::bail!("Docker is not running.")
            }
        }
        DevAction::Start { port, verbose, .. } => {
            let options = StartOptions {
                port,
                configured_url: dev::configured_api_url(),
                skip_docker_check: false,
            };
            let spinner = cliclack::spinner();
            spinner.start("Starting local Steel Browser runtime");
            let started = dev::start(store.dir(), &options, |line| {
                if verbose {
                    println!("{}", line);
                }
            })
            .await;
            match started {
                Ok(started) => {
                    spinner.stop("Local Steel Browser runtime started.");
                    cliclack::log::info(format!("repo_path: {}", started.repo_path.display()))?;
                    cliclack::log::info(format!("api_port: {}", started.api_port))?;
                    Ok(())
                }
                Err(e) => {
                    spinner.error(e.to_string());
                    Err(e)
                }
            }
        }
        DevAction::Stop { verbose } => {
            let spinner = cliclack::spinner();
            spinner.start("Stopping local Steel Browser runtime");
            let stopped = dev::stop(store.dir(), |line| {
                if verbose {
                    println!("{}", line);
                }
            })
            .await;
            match stopped {
                Ok(repo) => {
                    spinner.stop("Local Steel Browser runtime stopped.");
                    cliclack::log::info(format!("repo_path: {}", repo.display()))?;
                    Ok(())
                }
                Err(e) => {
                    spinner.error(e.to_string());
                    Err(e)
                }
            }
        }
    }
}

/// Ask for the instance type and save it
pub fn run_settings() -> Result<()> {
    let store = ConfigStore::from_env();
    let current = store.get_settings().unwrap_or_default();

    cliclack::intro("Settings")?;
    let options = [Instance::Cloud, Instance::Local];
    let choices: Vec<Choice> = options
        .iter()
        .map(|i| {
            let hint = if *i == current.instance { "current" } else { "" };
            Choice::new(i.id(), hint)
        })
        .collect();
    let mut prompter = CliPrompter::new();
    let index = prompter.select("Instance type", &choices)?;

    store.set_settings(&Settings {
        instance: options[index],
    })?;
    cliclack::outro("Settings saved!")?;
    Ok(())
}

/// Print the config location and login state
pub fn show_config() -> Result<()> {
    let store = ConfigStore::from_env();
    cliclack::intro("Current Configuration")?;
    cliclack::log::info(format!("Config directory: {}", store.dir().display()))?;

    match store.get_api_key() {
        Some(credential) => {
            let mut lines = vec![
                format!("name: {}", credential.name),
                format!("apiKey: {}", credential.masked_key()),
            ];
            if let Some(settings) = store.get_settings() {
                lines.push(format!("instance: {}", settings.instance));
            }
            cliclack::note("Session", lines.join("\n"))?;
        }
        None => {
            cliclack::log::warning(
                "You are not logged in. Please run `steel login` to authenticate.",
            )?;
        }
    }

    cliclack::outro("")?;
    Ok(())
}

/// Forget the stored credential
pub fn logout() -> Result<()> {
    let store = ConfigStore::from_env();
    if store.logout()? {
        cliclack::log::success("Logged out")?;
    } else {
        cliclack::log::info("Not logged in")?;
    }
    Ok(())
}

/// Open one of the fixed pages
pub fn open_link(link: Link) -> Result<()> {
    cliclack::log::info(format!("Opening {} ({})", link.description(), link.url()))?;
    link.open()
}
