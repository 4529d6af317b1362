use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ghsync::commands::push::{self, PushOptions};
use ghsync::commands::{pull, resolve_account, status};
use ghsync::config::{Config, ConfigOverrides};
use ghsync::git::{self, GitCli};
use ghsync::interactive::TerminalPrompter;
use ghsync::{identity, ui, PullOutcome, PushOutcome, RemoteProtocol, SyncError, TargetIdentity};

#[derive(Parser)]
#[command(name = "ghsync")]
#[command(about = "Sync a working directory with its GitHub repository")]
#[command(version)]
#[command(
    long_about = "Sync a working directory with its GitHub repository.\n\n\
    'push' commits everything and pushes it; 'pull' clones or merges the remote into the directory. \
    The repository name defaults to the directory name, lower-cased with spaces and underscores turned into hyphens. \
    Destructive steps (force push, hard reset, fresh re-initialisation) are only taken after you confirm them."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Account that owns the remote repository
    #[arg(long, global = true)]
    account: Option<String>,
    /// Git host for remote URLs
    #[arg(long, global = true)]
    host: Option<String>,
    /// Remote URL style
    #[arg(long, value_enum, global = true)]
    protocol: Option<RemoteProtocol>,
    /// Base for remote URLs, replacing host and protocol
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Branch used when the repository has none checked out
    #[arg(long, global = true)]
    branch: Option<String>,
    /// Config file (defaults to <config dir>/ghsync/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory to sync (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,
    /// More log output on stderr (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit all local changes and push them to the remote
    Push {
        /// Repository name (defaults to one derived from the directory name)
        name: Option<String>,
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
        /// Do not create a default .gitignore
        #[arg(long)]
        no_gitignore: bool,
    },
    /// Clone or update the directory from the remote
    Pull {
        /// Repository name (defaults to one derived from the directory name)
        name: Option<String>,
    },
    /// Show how the directory relates to its remote repository
    Status {
        /// Repository name (defaults to one derived from the directory name)
        name: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let sync_err = err.downcast_ref::<SyncError>();
            if sync_err.is_some_and(SyncError::is_user_choice) {
                ui::print_warning(&format!("⏹  {err}"));
            } else {
                ui::print_error(&format!("❌ {err:#}"));
            }
            let code = sync_err.map_or(1, SyncError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ghsync={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    git::check_git_availability()?;

    let workdir = resolve_workdir(cli.global.dir.as_deref())?;
    let config = load_config(&cli)?;
    let mut prompter = TerminalPrompter::terminal();
    let vcs = GitCli::new(&workdir);

    match cli.command {
        Commands::Push { name, message, .. } => {
            let identity = target(&config, &mut prompter, name.as_deref(), &workdir)?;
            ui::print_banner(&format!("Push sync: {identity}"));
            let outcome = push::sync_push(
                &vcs,
                &mut prompter,
                &identity,
                &config,
                &PushOptions { message },
            )?;
            match outcome {
                PushOutcome::Pushed => ui::print_success("✅ Pushed to the remote"),
                PushOutcome::ForcePushed => ui::print_warning("✅ Force pushed to the remote"),
                PushOutcome::UpToDate => ui::print_success("✅ Nothing to push"),
            }
        }
        Commands::Pull { name } => {
            let identity = target(&config, &mut prompter, name.as_deref(), &workdir)?;
            ui::print_banner(&format!("Pull sync: {identity}"));
            let outcome = pull::sync_pull(&vcs, &mut prompter, &identity, &config)?;
            match outcome {
                PullOutcome::Cloned => ui::print_success("✅ Cloned the remote repository"),
                PullOutcome::Pulled => ui::print_success("✅ Merged remote changes"),
                PullOutcome::ForceReset => {
                    ui::print_warning("✅ Local branch overwritten from the remote");
                }
            }
        }
        Commands::Status { name } => {
            let identity = target(&config, &mut prompter, name.as_deref(), &workdir)?;
            let report = status::collect_status(&vcs, &identity, &config)?;
            status::print_status(&report);
        }
    }

    Ok(())
}

fn resolve_workdir(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("Directory not found: {}", dir.display()))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.global.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;

    let no_gitignore = matches!(cli.command, Commands::Push { no_gitignore: true, .. });
    config.apply_overrides(&ConfigOverrides {
        account: cli.global.account.clone(),
        host: cli.global.host.clone(),
        protocol: cli.global.protocol,
        base_url: cli.global.base_url.clone(),
        branch: cli.global.branch.clone(),
        no_gitignore,
    })?;
    Ok(config)
}

fn target(
    config: &Config,
    prompter: &mut TerminalPrompter,
    name: Option<&str>,
    workdir: &Path,
) -> Result<TargetIdentity> {
    let account = resolve_account(config, prompter)?;
    Ok(identity::resolve(name, workdir, &account, config))
}
