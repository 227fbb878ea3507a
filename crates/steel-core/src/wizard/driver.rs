//! The wizard event loop
//!
//! Each iteration renders the snapshot, gathers one event for the current
//! step (a prompt answer or nothing), reduces it, and runs the effect the
//! transition asked for. Effect outcomes are fed back as events.

use crate::flow::FlowConfig;
use crate::prompt::{Choice, Prompter};
use crate::runtime::command::{chain, launch, run_with_output};
use crate::runtime::completion::{wait_for_timer, CompletionMode};
use crate::templates::env_file::{
    promote_env_example, read_env_value, update_env_variable, ENV_FILE,
};
use crate::templates::{
    copy_template, directory_status, templates, DirectoryStatus, EnvVar, ExistingFiles,
    TemplateFetcher,
};
use crate::wizard::render::render;
use crate::wizard::state::WizardState;
use crate::wizard::step::StepId;
use crate::wizard::steps::{Effect, Event, Wizard};
use crate::wizard::task::TaskResult;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How a wizard run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    /// Reached the terminal step
    Completed {
        directory: PathBuf,
        run_commands: Vec<String>,
    },
    /// A step's task failed; the wizard stopped there
    Halted { step: StepId, message: String },
}

impl<F: FlowConfig> Wizard<F> {
    /// Run the wizard to completion or to the first failed step
    pub async fn run<P: Prompter>(
        &self,
        prompter: &mut P,
        fetcher: &mut TemplateFetcher,
    ) -> Result<WizardOutcome> {
        log::info!(
            "starting {} wizard ({:?} completion)",
            self.flow.name(),
            self.completion()
        );
        let mut state = self.initial_state()?;

        loop {
            prompter.render(&render(&state))?;

            let step = state.step();
            if let TaskResult::Error(message) = state.task(step) {
                return Ok(WizardOutcome::Halted {
                    step,
                    message: message.clone(),
                });
            }
            if step == StepId::Success {
                return Ok(WizardOutcome::Completed {
                    directory: state.directory().to_path_buf(),
                    run_commands: render(&state).run_commands,
                });
            }

            let event = self.gather(prompter, &state)?;
            let transition = self.reduce(&state, event)?;
            state = transition.state;

            if transition.effect != Effect::None {
                prompter.render(&render(&state))?;
                let outcome = self.execute(prompter, fetcher, transition.effect).await?;
                state = self.reduce(&state, outcome)?.state;
            }
        }
    }

    /// Collect the input the current step needs
    fn gather<P: Prompter>(&self, prompter: &mut P, state: &WizardState) -> Result<Event> {
        let event = match state.step() {
            StepId::ProjectName if self.skips_name() => Event::NameSubmitted(String::new()),
            StepId::ProjectName => {
                let placeholder = self
                    .default_name()
                    .or_else(|| self.flow.fallback_name().map(str::to_string));
                let answer = prompter.input("Project name", placeholder.as_deref())?;
                Event::NameSubmitted(answer)
            }
            StepId::Template if self.skips_template(state) => Event::Enter,
            StepId::Template => {
                let choices: Vec<Choice> = templates()
                    .iter()
                    .map(|t| Choice::new(&t.alias, format!("{} [{}]", t.label, t.language)))
                    .collect();
                let index = prompter.select("Select a template", &choices)?;
                Event::TemplateChosen(templates()[index].clone())
            }
            StepId::PackageManager => {
                let candidates = self.flow.package_managers(state.template());
                let choices: Vec<Choice> = candidates
                    .iter()
                    .map(|pm| Choice::new(pm.id(), ""))
                    .collect();
                let index = prompter.select("Pick your package manager", &choices)?;
                Event::PackageManagerChosen(candidates[index])
            }
            StepId::Directory | StepId::Scaffold => {
                Event::DirectoryConfirmed(self.existing_files(prompter, state.directory())?)
            }
            StepId::EnvVar | StepId::ApiKey | StepId::Dependencies | StepId::Success => {
                Event::Enter
            }
        };
        Ok(event)
    }

    /// Ask what to do with a non-empty project directory
    fn existing_files<P: Prompter>(
        &self,
        prompter: &mut P,
        directory: &Path,
    ) -> Result<ExistingFiles> {
        let resolved = self.resolve(directory);
        let DirectoryStatus::NonEmpty(count) = directory_status(&resolved) else {
            return Ok(ExistingFiles::Ignore);
        };
        if self.options.yes {
            return Ok(ExistingFiles::Ignore);
        }
        let prompt = format!(
            "Directory {} is not empty ({} entries). How would you like to proceed?",
            directory.display(),
            count
        );
        let choices = [
            Choice::new("Remove existing files", "deletes the directory first"),
            Choice::new("Ignore files", "writes the template on top"),
        ];
        Ok(match prompter.select(&prompt, &choices)? {
            0 => ExistingFiles::Remove,
            _ => ExistingFiles::Ignore,
        })
    }

    /// Project paths are relative to the wizard's working directory
    fn resolve(&self, directory: &Path) -> PathBuf {
        self.cwd.join(directory)
    }

    /// Run an effect and report its outcome as an event.
    ///
    /// Failures of the work itself become `TaskFinished(Err(..))`; only
    /// prompt errors (cancellation) are returned as `Err`.
    async fn execute<P: Prompter>(
        &self,
        prompter: &mut P,
        fetcher: &mut TemplateFetcher,
        effect: Effect,
    ) -> Result<Event> {
        let event = match effect {
            Effect::None => Event::Enter,
            Effect::Scaffold {
                template_dir,
                directory,
                existing,
            } => {
                let target = self.resolve(&directory);
                let copied = match fetcher.fetch_files(&template_dir).await {
                    Ok(files) => copy_template(&files, &target, existing).await,
                    Err(e) => Err(e),
                };
                match copied {
                    Ok(files) => {
                        log::debug!("copied {} files into {}", files.len(), target.display());
                        let message =
                            format!("Copied {} files to {}", files.len(), directory.display());
                        self.finish(self.delays.scaffold, message).await
                    }
                    Err(e) => Event::TaskFinished(Err(format!("{:#}", e))),
                }
            }
            Effect::PrepareEnv {
                directory,
                presets,
                required,
            } => self.prepare_env(prompter, &directory, presets, &required)?,
            Effect::ResolveApiKey { directory } => Event::TaskFinished(
                self.resolve_api_key(&directory)
                    .map_err(|e| format!("{:#}", e)),
            ),
            Effect::Install {
                commands,
                directory,
            } => {
                let target = self.resolve(&directory);
                let script = chain(&commands);
                match self.completion() {
                    CompletionMode::Timer => match launch(&script, &target) {
                        Ok(_child) => {
                            self.finish(
                                self.delays.dependencies,
                                format!("Started `{}`", script),
                            )
                            .await
                        }
                        Err(e) => Event::TaskFinished(Err(format!(
                            "Failed to start `{}`: {}",
                            script, e
                        ))),
                    },
                    CompletionMode::Await => {
                        let result =
                            run_with_output(&script, &target, |line| prompter.output_line(line))
                                .await;
                        Event::TaskFinished(
                            result
                                .map(|_| format!("Ran `{}`", script))
                                .map_err(|e| format!("{:#}", e)),
                        )
                    }
                }
            }
        };
        Ok(event)
    }

    /// Success event, after the fixed delay in timer mode
    async fn finish(&self, delay: std::time::Duration, message: String) -> Event {
        if self.completion() == CompletionMode::Await {
            return Event::TaskFinished(Ok(message));
        }
        if wait_for_timer(delay).await {
            Event::TaskFinished(Ok(message))
        } else {
            Event::TaskFinished(Err("Cancelled before completion".to_string()))
        }
    }

    fn prepare_env<P: Prompter>(
        &self,
        prompter: &mut P,
        directory: &Path,
        presets: BTreeMap<String, String>,
        required: &[EnvVar],
    ) -> Result<Event> {
        let target = self.resolve(directory);
        let mut env = presets;
        if !env.contains_key("STEEL_API_KEY") {
            if let Some(credential) = self.store.get_api_key() {
                env.insert("STEEL_API_KEY".to_string(), credential.api_key);
            }
        }

        if let Err(e) = write_env(&target, &env) {
            return Ok(Event::TaskFinished(Err(format!("{:#}", e))));
        }

        for var in required {
            if env.contains_key(var.value) || read_env_value(&target, var.value).is_some() {
                continue;
            }
            let answer = prompter.input(&format!("{} ({})", var.label, var.value), None)?;
            let answer = answer.trim();
            if answer.is_empty() {
                continue;
            }
            if let Err(e) = update_env_variable(&target, var.value, answer) {
                return Ok(Event::TaskFinished(Err(format!("{:#}", e))));
            }
            env.insert(var.value.to_string(), answer.to_string());
        }

        Ok(Event::EnvReady(env))
    }

    fn resolve_api_key(&self, directory: &Path) -> Result<String> {
        let target = self.resolve(directory);
        let Some(credential) = self.store.get_api_key() else {
            return Ok(format!("No stored API key, set STEEL_API_KEY in {}", ENV_FILE));
        };
        if !target.join(ENV_FILE).exists() {
            promote_env_example(&target)?;
        }
        update_env_variable(&target, "STEEL_API_KEY", &credential.api_key)?;
        Ok(format!("Using API key for {}", credential.name))
    }
}

fn write_env(directory: &Path, env: &BTreeMap<String, String>) -> Result<()> {
    promote_env_example(directory)?;
    for (key, value) in env {
        update_env_variable(directory, key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::{Cookbook, Forge};
    use crate::prompt::testing::{Answer, ScriptedPrompter};
    use crate::session::{ConfigStore, Credential};
    use crate::templates::TemplateSource;
    use crate::wizard::steps::{Delays, WizardOptions};
    use std::fs;
    use std::time::Duration;

    const SHORT: Delays = Delays {
        dependencies: Duration::from_millis(5),
        scaffold: Duration::from_millis(5),
    };

    struct Fixture {
        _tmp: tempfile::TempDir,
        cwd: PathBuf,
        templates: PathBuf,
        config: PathBuf,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("work");
        let templates = tmp.path().join("templates");
        let config = tmp.path().join("config");
        let starter = templates.join("steel-playwright-starter");
        fs::create_dir_all(&cwd).unwrap();
        fs::create_dir_all(starter.join("src")).unwrap();
        fs::write(
            starter.join("package.json"),
            r#"{"name": "steel-playwright-starter", "version": "1.0.0"}"#,
        )
        .unwrap();
        fs::write(starter.join("_gitignore"), "node_modules\n.env\n").unwrap();
        fs::write(starter.join(".env.example"), "# Steel\nSTEEL_API_KEY=\n").unwrap();
        fs::write(starter.join("src/index.ts"), "console.log('hi');\n").unwrap();
        Fixture {
            _tmp: tmp,
            cwd,
            templates,
            config,
        }
    }

    fn fetcher(fx: &Fixture) -> TemplateFetcher {
        TemplateFetcher::new(TemplateSource::Local(fx.templates.clone()), "steel-test")
    }

    /// Stand-in for package manager installs
    fn quiet_install() -> Vec<String> {
        vec!["true".to_string()]
    }

    fn forge(fx: &Fixture, options: WizardOptions) -> Wizard<Forge> {
        Wizard::new(Forge, options, fx.cwd.clone(), ConfigStore::new(&fx.config))
            .with_delays(SHORT)
            .with_install_commands(quiet_install())
    }

    #[tokio::test]
    async fn test_forge_end_to_end() {
        let fx = fixture();
        let wizard = forge(
            &fx,
            WizardOptions {
                name: Some("Demo".into()),
                template: Some("playwright".into()),
                api_key: Some("sk-test".into()),
                completion: Some(CompletionMode::Timer),
                ..Default::default()
            },
        );
        let mut prompter = ScriptedPrompter::new([Answer::Pick(0)]);

        let outcome = wizard.run(&mut prompter, &mut fetcher(&fx)).await.unwrap();

        assert_eq!(
            outcome,
            WizardOutcome::Completed {
                directory: PathBuf::from("demo"),
                run_commands: vec![
                    "cd demo".to_string(),
                    "npm run build".to_string(),
                    "node dist/index.js".to_string(),
                ],
            }
        );
        // Name and template came from arguments
        assert_eq!(prompter.prompts, vec!["Pick your package manager"]);

        let project = fx.cwd.join("demo");
        assert!(project.join(".gitignore").exists());
        assert!(!project.join(".env.example").exists());
        assert_eq!(
            read_env_value(&project, "STEEL_API_KEY").as_deref(),
            Some("sk-test")
        );
        let pkg = fs::read_to_string(project.join("package.json")).unwrap();
        assert!(pkg.contains(r#""name": "demo""#));

        let last = prompter.frames.last().unwrap();
        assert!(last.lines.iter().all(|l| l.step != StepId::Template));
        assert!(last.lines.iter().all(|l| !l.task.is_error()));
    }

    #[tokio::test]
    async fn test_cookbook_scaffold_failure_halts() {
        let fx = fixture();
        let wizard = Wizard::new(
            Cookbook,
            WizardOptions::default(),
            fx.cwd.clone(),
            ConfigStore::new(&fx.config),
        )
        .with_delays(SHORT)
        .with_install_commands(quiet_install());
        // puppeteer has no directory in the fixture
        let mut prompter = ScriptedPrompter::new([
            Answer::Text("bot".into()),
            Answer::Pick(1),
            Answer::Pick(0),
        ]);

        let outcome = wizard.run(&mut prompter, &mut fetcher(&fx)).await.unwrap();

        let WizardOutcome::Halted { step, message } = outcome else {
            panic!("expected the wizard to halt");
        };
        assert_eq!(step, StepId::Scaffold);
        assert!(message.contains("Template directory not found"));
        let last = prompter.frames.last().unwrap();
        assert_eq!(last.current().map(|l| l.step), Some(StepId::Scaffold));
    }

    #[tokio::test]
    async fn test_cookbook_writes_stored_api_key() {
        let fx = fixture();
        let store = ConfigStore::new(&fx.config);
        store
            .set_api_key(&Credential {
                api_key: "sk-stored".into(),
                name: "ada".into(),
            })
            .unwrap();
        let wizard = Wizard::new(Cookbook, WizardOptions::default(), fx.cwd.clone(), store)
            .with_delays(SHORT)
            .with_install_commands(quiet_install());
        let mut prompter = ScriptedPrompter::new([
            Answer::Text("My Bot".into()),
            Answer::Pick(0),
            Answer::Pick(2),
        ]);

        let outcome = wizard.run(&mut prompter, &mut fetcher(&fx)).await.unwrap();

        let project = fx.cwd.join("my-bot");
        assert!(matches!(
            outcome,
            WizardOutcome::Completed { ref directory, .. } if directory == &project
        ));
        assert_eq!(
            read_env_value(&project, "STEEL_API_KEY").as_deref(),
            Some("sk-stored")
        );
    }

    #[tokio::test]
    async fn test_install_launch_failure_is_reported() {
        let fx = fixture();
        let wizard = forge(
            &fx,
            WizardOptions {
                completion: Some(CompletionMode::Timer),
                ..Default::default()
            },
        );
        let mut prompter = ScriptedPrompter::default();
        let event = wizard
            .execute(
                &mut prompter,
                &mut fetcher(&fx),
                Effect::Install {
                    commands: quiet_install(),
                    directory: PathBuf::from("does-not-exist"),
                },
            )
            .await
            .unwrap();
        assert!(matches!(event, Event::TaskFinished(Err(ref m)) if m.contains("Failed to start")));
    }

    #[tokio::test]
    async fn test_await_mode_streams_output() {
        let fx = fixture();
        let wizard = forge(
            &fx,
            WizardOptions {
                completion: Some(CompletionMode::Await),
                ..Default::default()
            },
        );
        let mut prompter = ScriptedPrompter::default();
        let event = wizard
            .execute(
                &mut prompter,
                &mut fetcher(&fx),
                Effect::Install {
                    commands: vec!["echo installing".into(), "exit 3".into()],
                    directory: PathBuf::from("."),
                },
            )
            .await
            .unwrap();
        assert_eq!(prompter.output, vec!["installing"]);
        assert!(matches!(
            event,
            Event::TaskFinished(Err(ref m)) if m.contains("exited with code 3")
        ));
    }

    #[tokio::test]
    async fn test_required_env_vars_are_prompted() {
        let fx = fixture();
        let wizard = forge(&fx, WizardOptions::default());
        let mut prompter = ScriptedPrompter::new([Answer::Text("sk-openai".into())]);
        let event = wizard
            .execute(
                &mut prompter,
                &mut fetcher(&fx),
                Effect::PrepareEnv {
                    directory: PathBuf::from("."),
                    presets: BTreeMap::new(),
                    required: vec![EnvVar {
                        value: "OPENAI_API_KEY",
                        label: "OpenAI API key",
                        required: true,
                    }],
                },
            )
            .await
            .unwrap();
        let Event::EnvReady(env) = event else {
            panic!("expected EnvReady");
        };
        assert_eq!(env["OPENAI_API_KEY"], "sk-openai");
        assert_eq!(
            read_env_value(&fx.cwd, "OPENAI_API_KEY").as_deref(),
            Some("sk-openai")
        );
    }

    #[tokio::test]
    async fn test_non_empty_directory_can_be_cleared() {
        let fx = fixture();
        let project = fx.cwd.join("demo");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("stale.txt"), "old").unwrap();

        let wizard = forge(
            &fx,
            WizardOptions {
                name: Some("demo".into()),
                template: Some("playwright".into()),
                skip_auth: true,
                completion: Some(CompletionMode::Timer),
                ..Default::default()
            },
        );
        let mut prompter = ScriptedPrompter::new([Answer::Pick(0), Answer::Pick(0)]);
        wizard.run(&mut prompter, &mut fetcher(&fx)).await.unwrap();

        assert!(!project.join("stale.txt").exists());
        assert!(project.join("package.json").exists());
        // .env is left alone with --skip-auth
        assert!(project.join(".env.example").exists());
    }
}
