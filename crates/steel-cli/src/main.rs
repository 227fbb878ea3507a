//! steel - CLI for the Steel browser-automation service

use anyhow::Result;
use clap::{Parser, Subcommand};
use steel_core::api::ApiCommand;
use steel_core::dev::DevAction;
use steel_core::links::Link;
use steel_core::tui::{self, CreateArgs};
use steel_core::{CompletionMode, Cookbook, Forge};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "steel")]
#[command(about = "CLI for scaffolding Steel projects and managing browser sessions")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new project from a Steel starter template
    Forge(ForgeArgs),
    /// Scaffold a cookbook example into a new directory
    Cookbook(CookbookArgs),
    /// Manage browser sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Manage files of a session
    #[command(subcommand)]
    Files(FilesCommand),
    /// Scrape, screenshot or print a page to PDF
    #[command(subcommand)]
    Tools(ToolsCommand),
    /// Run Steel Browser locally with Docker
    #[command(subcommand)]
    Dev(DevCommand),
    /// Open the Steel documentation
    Docs,
    /// Star Steel Browser on GitHub
    Star,
    /// Get help on the Steel Discord
    Support,
    /// Choose between the cloud and a local Steel instance
    Settings,
    /// Display information about the current session
    Config,
    /// Remove the stored API key
    Logout,
    /// Build zip files for all templates in the template directory (for development use)
    BuildZips(BuildZipsArgs),
}

#[derive(Parser, Debug)]
pub struct ForgeArgs {
    /// Template value, label or alias (e.g. playwright, browser-use)
    pub template: Option<String>,

    /// Project name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Steel API URL written to .env
    #[arg(short = 'a', long = "api-url")]
    pub api_url: Option<String>,

    /// Steel API key written to .env
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// OpenAI API key written to .env
    #[arg(long = "openai-key")]
    pub openai_key: Option<String>,

    /// Leave .env untouched
    #[arg(long = "skip-auth")]
    pub skip_auth: bool,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// How install steps decide they are finished
    #[arg(long, value_enum)]
    pub completion: Option<CompletionMode>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<ForgeArgs> for CreateArgs {
    fn from(args: ForgeArgs) -> Self {
        CreateArgs {
            template_dir: args.template_dir,
            template: args.template,
            name: args.name,
            api_url: args.api_url,
            api_key: args.api_key,
            openai_key: args.openai_key,
            skip_auth: args.skip_auth,
            completion: args.completion,
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CookbookArgs {
    /// Project directory name
    pub directory: Option<String>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// How scaffold and install steps decide they are finished
    #[arg(long, value_enum)]
    pub completion: Option<CompletionMode>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CookbookArgs> for CreateArgs {
    fn from(args: CookbookArgs) -> Self {
        CreateArgs {
            template_dir: args.template_dir,
            name: args.directory,
            completion: args.completion,
            yes: args.yes,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum SessionsCommand {
    /// List all sessions
    List,
    /// Get a session by id
    Get,
    /// Get the context of a session
    Context,
    /// Get the recorded events of a session
    Events,
    /// Get the live details of a session
    Live,
    /// Create a session
    Create,
    /// Release a session by id
    Release,
    /// Release all sessions
    ReleaseAll,
}

impl From<SessionsCommand> for ApiCommand {
    fn from(command: SessionsCommand) -> Self {
        match command {
            SessionsCommand::List => ApiCommand::ListSessions,
            SessionsCommand::Get => ApiCommand::GetSession,
            SessionsCommand::Context => ApiCommand::SessionContext,
            SessionsCommand::Events => ApiCommand::SessionEvents,
            SessionsCommand::Live => ApiCommand::SessionLiveDetails,
            SessionsCommand::Create => ApiCommand::CreateSession,
            SessionsCommand::Release => ApiCommand::ReleaseSession,
            SessionsCommand::ReleaseAll => ApiCommand::ReleaseAllSessions,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum FilesCommand {
    /// List the files of a session
    List,
    /// Get a file by id
    Get,
    /// Download a file into the current directory
    Download,
    /// Delete a file by id
    Delete,
    /// Delete every file of a session
    DeleteAll {
        /// Session whose files are deleted (asked for when omitted)
        #[arg(long = "session-id")]
        session_id: Option<String>,
    },
}

impl From<FilesCommand> for ApiCommand {
    fn from(command: FilesCommand) -> Self {
        match command {
            FilesCommand::List => ApiCommand::ListFiles,
            FilesCommand::Get => ApiCommand::GetFile,
            FilesCommand::Download => ApiCommand::DownloadFile,
            FilesCommand::Delete => ApiCommand::DeleteFile,
            FilesCommand::DeleteAll { session_id } => ApiCommand::DeleteAllFiles { session_id },
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ToolsCommand {
    /// Scrape a page
    Scrape,
    /// Take a screenshot of a page
    Screenshot,
    /// Print a page to PDF
    Pdf,
}

impl From<ToolsCommand> for ApiCommand {
    fn from(command: ToolsCommand) -> Self {
        match command {
            ToolsCommand::Scrape => ApiCommand::Scrape,
            ToolsCommand::Screenshot => ApiCommand::Screenshot,
            ToolsCommand::Pdf => ApiCommand::Pdf,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DevCommand {
    /// Start the local Steel Browser runtime containers
    Start {
        /// API port for the local runtime
        #[arg(short, long)]
        port: Option<u16>,

        /// Only verify Docker availability and exit
        #[arg(short = 'd', long = "docker-check")]
        docker_check: bool,

        /// Print Docker Compose output
        #[arg(short = 'V', long)]
        verbose: bool,
    },
    /// Stop the local Steel Browser runtime containers
    Stop {
        /// Print Docker Compose output
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

impl From<DevCommand> for DevAction {
    fn from(command: DevCommand) -> Self {
        match command {
            DevCommand::Start {
                port,
                docker_check,
                verbose,
            } => DevAction::Start {
                port,
                docker_check,
                verbose,
            },
            DevCommand::Stop { verbose } => DevAction::Stop { verbose },
        }
    }
}

#[derive(Parser, Debug)]
pub struct BuildZipsArgs {
    /// Local directory containing templates to build zips from
    #[arg(long = "template-dir", default_value = "templates")]
    pub template_dir: PathBuf,
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Forge(args) => tui::run_wizard(Forge, args.into()).await,
        Command::Cookbook(args) => tui::run_wizard(Cookbook, args.into()).await,
        Command::Sessions(command) => tui::run_api(command.into()).await,
        Command::Files(command) => tui::run_api(command.into()).await,
        Command::Tools(command) => tui::run_api(command.into()).await,
        Command::Dev(command) => tui::run_dev(command.into()).await,
        Command::Docs => tui::open_link(Link::Docs),
        Command::Star => tui::open_link(Link::Star),
        Command::Support => tui::open_link(Link::Support),
        Command::Settings => tui::run_settings(),
        Command::Config => tui::show_config(),
        Command::Logout => tui::logout(),
        Command::BuildZips(args) => steel_core::templates::build_zips(&args.template_dir),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let result = dispatch(args.command).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if let Err(e) = result {
        if is_interrupted(&e) {
            std::process::exit(130);
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// cliclack reports Ctrl-C/Esc inside a prompt as an interrupted I/O error
fn is_interrupted(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forge_args() {
        let args = Args::try_parse_from([
            "steel",
            "forge",
            "playwright",
            "-n",
            "demo",
            "--skip-auth",
            "--completion",
            "await",
        ])
        .unwrap();
        let Command::Forge(forge) = args.command else {
            panic!("expected forge");
        };
        let create: CreateArgs = forge.into();
        assert_eq!(create.template.as_deref(), Some("playwright"));
        assert_eq!(create.name.as_deref(), Some("demo"));
        assert!(create.skip_auth);
        assert_eq!(create.completion, Some(CompletionMode::Await));
    }

    #[test]
    fn test_cookbook_positional_is_default_name() {
        let args = Args::try_parse_from(["steel", "cookbook", "my-bot"]).unwrap();
        let Command::Cookbook(cookbook) = args.command else {
            panic!("expected cookbook");
        };
        let create: CreateArgs = cookbook.into();
        assert_eq!(create.name.as_deref(), Some("my-bot"));
        assert!(create.template.is_none());
    }

    #[test]
    fn test_sessions_subcommands() {
        let args = Args::try_parse_from(["steel", "sessions", "release-all"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Sessions(SessionsCommand::ReleaseAll)
        ));

        let args = Args::try_parse_from(["steel", "sessions", "live"]).unwrap();
        let Command::Sessions(live) = args.command else {
            panic!("expected sessions");
        };
        assert_eq!(ApiCommand::from(live), ApiCommand::SessionLiveDetails);
    }

    #[test]
    fn test_files_delete_all_session_id() {
        let args =
            Args::try_parse_from(["steel", "files", "delete-all", "--session-id", "s-42"]).unwrap();
        let Command::Files(files) = args.command else {
            panic!("expected files");
        };
        assert_eq!(
            ApiCommand::from(files),
            ApiCommand::DeleteAllFiles {
                session_id: Some("s-42".to_string())
            }
        );
    }

    #[test]
    fn test_tools_subcommands() {
        let args = Args::try_parse_from(["steel", "tools", "pdf"]).unwrap();
        let Command::Tools(tools) = args.command else {
            panic!("expected tools");
        };
        assert_eq!(ApiCommand::from(tools), ApiCommand::Pdf);
    }

    #[test]
    fn test_dev_subcommands() {
        let args = Args::try_parse_from(["steel", "dev", "start", "--docker-check"]).unwrap();
        let Command::Dev(dev) = args.command else {
            panic!("expected dev");
        };
        assert_eq!(
            DevAction::from(dev),
            DevAction::Start {
                port: None,
                docker_check: true,
                verbose: false,
            }
        );

        let args = Args::try_parse_from(["steel", "dev", "stop", "-V"]).unwrap();
        let Command::Dev(dev) = args.command else {
            panic!("expected dev");
        };
        assert_eq!(DevAction::from(dev), DevAction::Stop { verbose: true });
    }
}
