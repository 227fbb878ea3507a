//! Built-in catalog of starter templates

use crate::package_manager::PackageManager;
use std::path::Path;
use std::sync::OnceLock;

/// Runtime stack a starter is built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stack {
    Node,
    Python,
}

/// An environment variable a starter reads from its `.env`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub value: &'static str,
    pub label: &'static str,
    pub required: bool,
}

impl EnvVar {
    const fn optional(value: &'static str, label: &'static str) -> Self {
        Self {
            value,
            label,
            required: false,
        }
    }

    const fn required(value: &'static str, label: &'static str) -> Self {
        Self {
            value,
            label,
            required: true,
        }
    }
}

/// A catalog entry describing a starter project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Stable identifier
    pub value: String,
    /// Human-readable title
    pub label: String,
    /// Short name accepted on the command line
    pub alias: String,
    /// Language tag shown in the picker (TS, JS, PY)
    pub language: &'static str,
    /// Template directory name in the template source
    pub dir: String,
    /// Run commands shown after scaffolding; `{pm}` expands to the package manager
    pub commands: Vec<&'static str>,
    pub env: Vec<EnvVar>,
}

impl Template {
    /// Commands the user runs to start the scaffolded project
    pub fn display_run_commands(&self, directory: &Path, pm: PackageManager) -> Vec<String> {
        std::iter::once(format!("cd {}", directory.display()))
            .chain(self.commands.iter().map(|c| c.replace("{pm}", pm.id())))
            .collect()
    }

    /// Whether an identifier from the command line refers to this template
    pub fn matches(&self, identifier: &str) -> bool {
        self.value == identifier || self.label == identifier || self.alias == identifier
    }
}

const BASE_ENV: [EnvVar; 3] = [
    EnvVar::optional("STEEL_API_KEY", "Steel API key"),
    EnvVar::optional("STEEL_CONNECT_URL", "Steel Connect URL"),
    EnvVar::optional("STEEL_API_URL", "Steel API URL"),
];

fn env_with(extra: &[EnvVar]) -> Vec<EnvVar> {
    BASE_ENV.iter().chain(extra).cloned().collect()
}

fn entry(
    value: &str,
    label: &str,
    alias: &str,
    stack: Stack,
    typescript: bool,
    extra_env: &[EnvVar],
) -> Template {
    let (language, commands) = match (stack, typescript) {
        (Stack::Python, _) => ("PY", vec!["python main.py"]),
        (Stack::Node, true) => ("TS", vec!["{pm} run build", "node dist/index.js"]),
        (Stack::Node, false) => ("JS", vec!["node index.js"]),
    };
    Template {
        value: value.to_string(),
        label: label.to_string(),
        alias: alias.to_string(),
        language,
        dir: value.to_string(),
        commands,
        env: env_with(extra_env),
    }
}

/// All templates, in picker order
pub fn templates() -> &'static [Template] {
    static CATALOG: OnceLock<Vec<Template>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            entry(
                "steel-playwright-starter",
                "Steel + Playwright (TypeScript)",
                "playwright",
                Stack::Node,
                true,
                &[],
            ),
            entry(
                "steel-puppeteer-starter",
                "Steel + Puppeteer (JavaScript)",
                "puppeteer",
                Stack::Node,
                false,
                &[],
            ),
            entry(
                "steel-playwright-python-starter",
                "Steel + Playwright (Python)",
                "playwright-py",
                Stack::Python,
                false,
                &[],
            ),
            entry(
                "steel-browser-use-starter",
                "Steel + Browser Use Agent (Python)",
                "browser-use",
                Stack::Python,
                false,
                &[
                    EnvVar::required("OPENAI_API_KEY", "OpenAI API key"),
                    EnvVar::optional("TASK", "Task for the agent"),
                ],
            ),
            entry(
                "steel-magnitude-starter",
                "Steel + Magnitude (TypeScript)",
                "magnitude",
                Stack::Node,
                true,
                &[EnvVar::required("ANTHROPIC_API_KEY", "Anthropic API key")],
            ),
        ]
    })
}

/// Look a template up by value, label or alias
pub fn find_template(identifier: &str) -> Option<&'static Template> {
    templates().iter().find(|t| t.matches(identifier))
}

/// Comma-separated aliases, for error messages
pub fn available_aliases() -> String {
    templates()
        .iter()
        .map(|t| t.alias.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
