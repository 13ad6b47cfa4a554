#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use ted_core::config::{Overrides, resolve_config};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ted: a plain-text todo vault",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Vault root directory (overrides TED_VAULT and the config file).
    #[arg(long, global = true, value_name = "DIR")]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the vault directories",
        long_about = "Create the vault root with todos/, done/, projects/, ref/, files/ and inbox/.",
        after_help = "EXAMPLES:\n    # Initialize the configured vault\n    ted init\n\n    # Initialize a vault somewhere else\n    ted --vault ~/notes/ted init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Todos",
        about = "Create a todo",
        long_about = "Create a todo with a goal and its first task.",
        after_help = "EXAMPLES:\n    # Create a todo\n    ted new \"Ship release\" --goal \"CI green\" --task \"write changelog\"\n\n    # File it under a project and tag it\n    ted new \"Fix login\" -g \"no timeouts\" -t \"reproduce\" --project P1 --tag work"
    )]
    New(cmd::new::NewArgs),

    #[command(
        next_help_heading = "Todos",
        name = "ls",
        alias = "list",
        about = "List active todos",
        long_about = "List active todos grouped by directory under todos/, or by tag.",
        after_help = "EXAMPLES:\n    # Group by directory\n    ted ls\n\n    # Group by tag with task lists\n    ted ls --by-tag --verbose"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Todos",
        about = "Show one todo",
        long_about = "Show a todo's status, goal, info log, blockers and references.",
        after_help = "EXAMPLES:\n    # Show a todo\n    ted show T00012\n\n    # The numeric part is enough\n    ted show 12 --verbose"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Todos",
        about = "Edit a todo",
        long_about = "Mark tasks done, add tasks, append to the info log or add tags.",
        after_help = "EXAMPLES:\n    # Mark task 0 done\n    ted update T00012 --done 0\n\n    # Add a task and a note\n    ted update 12 --task \"tag the release\" --info \"waiting on review\""
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Todos",
        about = "Record blocking todos",
        long_about = "Mark a todo as blocked until the given todos are done.",
        after_help = "EXAMPLES:\n    # T00012 waits on T00003\n    ted block T00012 --by T00003"
    )]
    Block(cmd::block::BlockArgs),

    #[command(
        next_help_heading = "Todos",
        about = "Complete a todo",
        long_about = "Stamp a todo completed and move it into done/.",
        after_help = "EXAMPLES:\n    # Complete a finished todo\n    ted done T00012\n\n    # Mark open tasks done without asking\n    ted done T00012 --yes"
    )]
    Done(cmd::done::DoneArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Create and list projects",
        after_help = "EXAMPLES:\n    # Create a project whose todos are numbered ENG001, ENG002, ...\n    ted project new Engineering --shorthand ENG -d \"platform work\"\n\n    # List projects\n    ted project list"
    )]
    Project {
        #[command(subcommand)]
        command: cmd::project::ProjectCommand,
    },

    #[command(
        next_help_heading = "Projects",
        name = "ref",
        about = "Attach references to todos",
        after_help = "EXAMPLES:\n    # Link docs to a todo\n    ted ref new T00012 --link docs.rs/clap --tldr \"derive reference\"\n\n    # Keep a copy of a file\n    ted ref new T00012 --file ./invoice.pdf"
    )]
    Ref {
        #[command(subcommand)]
        command: cmd::reference::RefCommand,
    },

    #[command(
        next_help_heading = "Vault",
        about = "Summarize the vault",
        after_help = "EXAMPLES:\n    # Counts only\n    ted status\n\n    # Include every active todo\n    ted status --verbose --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(next_help_heading = "Inbox", about = "List imported inbox items")]
    Inbox,

    #[command(
        next_help_heading = "Inbox",
        about = "Import items from the intake server",
        long_about = "Fetch captured items and their attachments from the intake server into inbox/ and files/.",
        after_help = "EXAMPLES:\n    # Import from the configured server\n    ted import\n\n    # Import and empty the server afterwards\n    ted import --url http://phone.local:5000 --clear"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    ted completions bash > ~/.local/share/bash-completion/completions/ted"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TED_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "ted=debug,info"
        } else {
            "ted=info,warn"
        })
    });

    let format = env::var("TED_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let config = resolve_config(Overrides {
        vault_dir: cli.vault,
        intake_url: None,
        json: cli.json,
    })?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(vault = %config.vault_dir.display(), ?output, "resolved config");

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &config, output),
        Commands::New(args) => cmd::new::run_new(args, &config, output),
        Commands::List(args) => cmd::list::run_list(args, &config, output),
        Commands::Show(args) => cmd::show::run_show(args, &config, output),
        Commands::Update(args) => cmd::update::run_update(args, &config, output),
        Commands::Block(args) => cmd::block::run_block(args, &config, output),
        Commands::Done(args) => cmd::done::run_done(args, &config, output),
        Commands::Project { command } => cmd::project::run_project(command, &config, output),
        Commands::Ref { command } => cmd::reference::run_ref(command, &config, output),
        Commands::Status(args) => cmd::status::run_status(args, &config, output),
        Commands::Inbox => cmd::inbox::run_inbox(&config, output),
        Commands::Import(args) => cmd::import::run_import(args, &config, output),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let fallback = OutputMode::fallback(cli.json);

    if let Err(err) = run(cli) {
        // Nothing left to report to if stderr itself fails.
        let _ = render_error(fallback, &CliError::from_anyhow(&err));
        std::process::exit(1);
    }
}
