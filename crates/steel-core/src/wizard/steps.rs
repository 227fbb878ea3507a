//! Step transitions
//!
//! [`Wizard::reduce`] is a pure function of the current snapshot and one
//! event. It never touches the filesystem or the network; work that has
//! to happen outside is returned as an [`Effect`] for the driver to run.

use crate::error::WizardError;
use crate::flow::FlowConfig;
use crate::package_manager::PackageManager;
use crate::project_name::to_valid_project_name;
use crate::runtime::completion::{CompletionMode, DEPENDENCIES_DELAY, SCAFFOLD_DELAY};
use crate::session::ConfigStore;
use crate::templates::catalog::{available_aliases, find_template};
use crate::templates::{EnvVar, ExistingFiles, Template};
use crate::wizard::state::WizardState;
use crate::wizard::step::StepId;
use crate::wizard::task::TaskResult;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line inputs that preset parts of the wizard
#[derive(Debug, Clone, Default)]
pub struct WizardOptions {
    /// Default project name (forge `--name`, cookbook positional directory)
    pub name: Option<String>,
    /// Template identifier given on the command line
    pub template: Option<String>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub openai_key: Option<String>,
    /// Leave `.env` alone
    pub skip_auth: bool,
    /// Overrides the flow's default completion mode
    pub completion: Option<CompletionMode>,
    /// Answer confirmations with their non-destructive default
    pub yes: bool,
}

/// Fixed delays used in [`CompletionMode::Timer`]
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    pub dependencies: Duration,
    pub scaffold: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            dependencies: DEPENDENCIES_DELAY,
            scaffold: SCAFFOLD_DELAY,
        }
    }
}

/// Input to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Raw text typed at the project name prompt (may be empty)
    NameSubmitted(String),
    TemplateChosen(Template),
    PackageManagerChosen(PackageManager),
    /// The user settled what happens to an existing project directory
    DirectoryConfirmed(ExistingFiles),
    /// A step that needs no answer was entered
    Enter,
    /// `.env` has been written with these values
    EnvReady(BTreeMap<String, String>),
    /// Outcome of the effect started by the current step
    TaskFinished(Result<String, String>),
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::NameSubmitted(_) => "name",
            Event::TemplateChosen(_) => "template",
            Event::PackageManagerChosen(_) => "package manager",
            Event::DirectoryConfirmed(_) => "directory",
            Event::Enter => "enter",
            Event::EnvReady(_) => "env",
            Event::TaskFinished(_) => "task",
        }
    }
}

/// Work requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Copy a template into the project directory
    Scaffold {
        template_dir: String,
        directory: PathBuf,
        existing: ExistingFiles,
    },
    /// Create `.env`, write `presets`, then ask for the `required` vars still unset
    PrepareEnv {
        directory: PathBuf,
        presets: BTreeMap<String, String>,
        required: Vec<EnvVar>,
    },
    /// Write the stored API key into the project's `.env`
    ResolveApiKey { directory: PathBuf },
    /// Install dependencies
    Install {
        commands: Vec<String>,
        directory: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WizardState,
    pub effect: Effect,
}

impl Transition {
    fn to(state: WizardState) -> Self {
        Self {
            state,
            effect: Effect::None,
        }
    }

    fn with(state: WizardState, effect: Effect) -> Self {
        Self { state, effect }
    }
}

/// The scaffolding wizard for one flow
pub struct Wizard<F: FlowConfig> {
    pub(crate) flow: F,
    pub(crate) options: WizardOptions,
    pub(crate) cwd: PathBuf,
    pub(crate) store: ConfigStore,
    pub(crate) delays: Delays,
    install_commands: Option<Vec<String>>,
}

impl<F: FlowConfig> Wizard<F> {
    pub fn new(flow: F, options: WizardOptions, cwd: PathBuf, store: ConfigStore) -> Self {
        Self {
            flow,
            options,
            cwd,
            store,
            delays: Delays::default(),
            install_commands: None,
        }
    }

    pub fn with_delays(mut self, delays: Delays) -> Self {
        self.delays = delays;
        self
    }

    /// Run `commands` in the dependencies step instead of the package
    /// manager's install commands
    pub fn with_install_commands(mut self, commands: Vec<String>) -> Self {
        self.install_commands = Some(commands);
        self
    }

    pub fn completion(&self) -> CompletionMode {
        self.options
            .completion
            .unwrap_or_else(|| self.flow.default_completion())
    }

    /// First snapshot, with the command-line template resolved
    pub fn initial_state(&self) -> Result<WizardState, WizardError> {
        let state = WizardState::new(&self.flow, &self.cwd);
        match self.options.template.as_deref() {
            None => Ok(state),
            Some(id) => {
                let template = find_template(id).ok_or_else(|| WizardError::TemplateNotFound {
                    name: id.to_string(),
                    available: available_aliases(),
                })?;
                Ok(state.with_template(template.clone()))
            }
        }
    }

    /// Whether the template step can be passed without asking
    pub fn skips_template(&self, state: &WizardState) -> bool {
        self.flow.template_preset_skips() && state.template().is_some()
    }

    /// Whether the project name step can be passed without asking
    pub fn skips_name(&self) -> bool {
        self.flow.fallback_name().is_some() && self.default_name().is_some()
    }

    /// Normalized default name from the command line, if any
    pub fn default_name(&self) -> Option<String> {
        self.options
            .name
            .as_deref()
            .map(to_valid_project_name)
            .filter(|n| !n.is_empty())
    }

    /// Apply one event to a snapshot
    pub fn reduce(&self, state: &WizardState, event: Event) -> Result<Transition, WizardError> {
        let step = state.step();
        let state = state.clone();
        match (step, event) {
            (StepId::ProjectName, Event::NameSubmitted(raw)) => self.name_submitted(state, &raw),

            (StepId::Template, Event::TemplateChosen(template)) => {
                let label = template.label.clone();
                let state = state
                    .with_template(template)
                    .with_task(StepId::Template, TaskResult::Success(label))
                    .with_step(StepId::PackageManager)?;
                Ok(Transition::to(state))
            }
            (StepId::Template, Event::Enter) if self.skips_template(&state) => {
                let state = state
                    .with_skipped(StepId::Template)
                    .with_step(StepId::PackageManager)?;
                Ok(Transition::to(state))
            }

            (StepId::PackageManager, Event::PackageManagerChosen(pm)) => {
                let state = state
                    .with_package_manager(pm)
                    .with_task(StepId::PackageManager, TaskResult::Success(pm.to_string()))
                    .with_step(self.flow.after_package_manager())?;
                Ok(Transition::to(state))
            }

            (StepId::Directory | StepId::Scaffold, Event::DirectoryConfirmed(existing)) => {
                if state.task(step).is_success() {
                    return Ok(Transition::to(state));
                }
                let template_dir = state
                    .template()
                    .map(|t| t.dir.clone())
                    .ok_or(WizardError::MissingTemplate(step))?;
                let effect = Effect::Scaffold {
                    template_dir,
                    directory: state.directory().to_path_buf(),
                    existing,
                };
                Ok(Transition::with(
                    state.with_task(step, TaskResult::Loading),
                    effect,
                ))
            }

            (StepId::EnvVar, Event::Enter) => self.enter_env(state),
            (StepId::EnvVar, Event::EnvReady(env)) => {
                let summary = format!("{} variable(s) set", env.len());
                let state = state
                    .with_env(env)
                    .with_task(StepId::EnvVar, TaskResult::Success(summary))
                    .with_step(StepId::Dependencies)?;
                Ok(Transition::to(state))
            }

            (StepId::ApiKey, Event::Enter) => {
                if state.task(step).is_success() {
                    return Ok(Transition::to(state));
                }
                let effect = Effect::ResolveApiKey {
                    directory: state.directory().to_path_buf(),
                };
                Ok(Transition::with(
                    state.with_task(step, TaskResult::Loading),
                    effect,
                ))
            }

            (StepId::Dependencies, Event::Enter) => {
                if state.task(step).is_success() {
                    return Ok(Transition::to(state));
                }
                let commands = self
                    .install_commands
                    .clone()
                    .unwrap_or_else(|| state.package_manager().install_commands());
                let effect = Effect::Install {
                    commands,
                    directory: state.directory().to_path_buf(),
                };
                Ok(Transition::with(
                    state.with_task(step, TaskResult::Loading),
                    effect,
                ))
            }

            (_, Event::TaskFinished(result)) => self.task_finished(state, result),

            (StepId::Success, _) => Ok(Transition::to(state)),

            (step, event) => Err(WizardError::UnexpectedEvent {
                step,
                event: event.name(),
            }),
        }
    }

    fn name_submitted(&self, state: WizardState, raw: &str) -> Result<Transition, WizardError> {
        let typed = Some(to_valid_project_name(raw)).filter(|n| !n.is_empty());
        let name = typed
            .or_else(|| self.default_name())
            .or_else(|| self.flow.fallback_name().map(str::to_string));

        let state = match name {
            Some(name) => {
                let directory = self.flow.project_directory(&self.cwd, &name);
                state
                    .with_directory(directory)
                    .with_task(StepId::ProjectName, TaskResult::Success(name.clone()))
                    .with_project_name(name)
            }
            // Keep the default directory
            None => state,
        };
        Ok(Transition::to(state.with_step(StepId::Template)?))
    }

    fn enter_env(&self, state: WizardState) -> Result<Transition, WizardError> {
        if self.options.skip_auth {
            let state = state
                .with_skipped(StepId::EnvVar)
                .with_step(StepId::Dependencies)?;
            return Ok(Transition::to(state));
        }
        if state.task(StepId::EnvVar).is_loading() {
            return Ok(Transition::to(state));
        }
        let template = state
            .template()
            .ok_or(WizardError::MissingTemplate(StepId::EnvVar))?;
        let required = template
            .env
            .iter()
            .filter(|v| v.required)
            .cloned()
            .collect();
        let effect = Effect::PrepareEnv {
            directory: state.directory().to_path_buf(),
            presets: self.env_presets(),
            required,
        };
        Ok(Transition::with(
            state.with_task(StepId::EnvVar, TaskResult::Loading),
            effect,
        ))
    }

    /// `.env` values given on the command line
    fn env_presets(&self) -> BTreeMap<String, String> {
        let mut presets = BTreeMap::new();
        if let Some(url) = self.options.api_url.as_deref().filter(|u| !u.is_empty()) {
            presets.insert("STEEL_API_URL".to_string(), url.to_string());
            presets.insert("STEEL_CONNECT_URL".to_string(), connect_url(url));
        }
        if let Some(key) = self.options.api_key.as_deref().filter(|k| !k.is_empty()) {
            presets.insert("STEEL_API_KEY".to_string(), key.to_string());
        }
        if let Some(key) = self.options.openai_key.as_deref().filter(|k| !k.is_empty()) {
            presets.insert("OPENAI_API_KEY".to_string(), key.to_string());
        }
        presets
    }

    fn task_finished(
        &self,
        state: WizardState,
        result: Result<String, String>,
    ) -> Result<Transition, WizardError> {
        let step = state.step();
        // A late or duplicate completion must not advance anything
        if !state.task(step).is_loading() {
            log::debug!("ignoring completion for idle step {}", step);
            return Ok(Transition::to(state));
        }
        match result {
            Ok(message) => {
                let next = state.next_step().unwrap_or(StepId::Success);
                let state = state
                    .with_task(step, TaskResult::Success(message))
                    .with_step(next)?;
                Ok(Transition::to(state))
            }
            Err(message) => Ok(Transition::to(
                state.with_task(step, TaskResult::Error(message)),
            )),
        }
    }
}

/// WebSocket URL for an API URL: `ws:` followed by everything after the scheme
pub fn connect_url(api_url: &str) -> String {
    match api_url.split_once(':') {
        Some((_, rest)) => format!("ws:{}", rest),
        None => format!("ws://{}", api_url),
    }
}
