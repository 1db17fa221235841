//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use jobseek_session::config;
use tracing_subscriber::EnvFilter;

mod commands;
mod notice;

#[derive(Parser)]
#[command(name = "jobseek")]
#[command(version)]
#[command(about = "Jobseek account client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(short, long, env = "JOBSEEK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Refresh the access token using the saved session
    Refresh,

    /// Show the logged-in user
    Whoami,

    /// Log out and forget the saved session
    Logout,

    /// Manage the jobseeker profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Update profile fields and optionally upload a new avatar or CV
    Edit {
        #[arg(long)]
        name: Option<String>,
        /// Date of birth
        #[arg(long)]
        dob: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        about: Option<String>,
        /// Image file to upload as the new avatar
        #[arg(long, value_name = "PATH")]
        avatar: Option<PathBuf>,
        /// Document to upload as the new CV
        #[arg(long, value_name = "PATH")]
        cv: Option<PathBuf>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Installs the stderr subscriber; level comes from `JOBSEEK_LOG` (default `warn`).
fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_env("JOBSEEK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
    guard
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&config, &email, password).await
        }
        Commands::Refresh => commands::auth::refresh(&config).await,
        Commands::Whoami => commands::auth::whoami(&config).await,
        Commands::Logout => commands::auth::logout(&config).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Edit {
                name,
                dob,
                phone,
                address,
                about,
                avatar,
                cv,
            } => {
                let edits = commands::profile::ProfileEdits {
                    name,
                    dob,
                    phone,
                    address,
                    about,
                    avatar,
                    cv,
                };
                commands::profile::edit(&config, edits).await
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
