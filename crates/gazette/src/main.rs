//! Gazette CLI - static blog generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gazette_static::Task;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "gazette")]
#[command(about = "Static blog generator with incremental builds and git history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to gazette.toml config file
    #[arg(short, long, default_value = "gazette.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the index page (runs resources first)
    Index,

    /// Copy resources, then render every post
    Posts,

    /// Render every post, ignoring the modification cache
    PostsNoDeps,

    /// Render posts whose source changed since their last build
    PostsContentChanged,

    /// Copy static resources into the build directory
    Resources,

    /// Build the whole site
    Build,

    /// Build, serve with live reload, and rebuild on change
    Watch {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Preview the build directory
    Serve {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory to serve (defaults to the build directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

impl Commands {
    fn task(&self) -> Option<Task> {
        match self {
            Commands::Index => Some(Task::Index),
            Commands::Posts => Some(Task::Posts),
            Commands::PostsNoDeps => Some(Task::PostsNoDeps),
            Commands::PostsContentChanged => Some(Task::PostsContentChanged),
            Commands::Resources => Some(Task::Resources),
            Commands::Build => Some(Task::Build),
            Commands::Watch { .. } | Commands::Serve { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    if let Some(task) = cli.command.task() {
        return commands::build::run(&cli.config, task).await;
    }

    match cli.command {
        Commands::Watch { port, no_open } => {
            commands::watch::run(&cli.config, port, !no_open).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(&cli.config, port, dir).await?;
        }
        _ => {}
    }

    Ok(())
}
