mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::publish::Exit;

#[derive(Parser)]
#[command(name = "pages-publish")]
#[command(about = "Publish a static site through the GitHub Contents API and preview it locally")]
struct Cli {
    /// Config file (defaults to ~/.config/pages-publish/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload every eligible file to the configured repository and branch
    Publish {
        /// List the files that would be published and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the source directory for local preview
    Serve {
        /// Port to listen on
        #[arg(default_value_t = 8000)]
        port: u16,
        /// Directory to serve (defaults to the publish source directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "pages_publish=info,pages_publish_github=info,pages_publish_cli=info,tower_http=info"
                .into()
        }))
        .init();
}

async fn run(cli: Cli) -> Result<Exit> {
    let cwd = std::env::current_dir().context("could not determine the current directory")?;
    let file = config::load_file(cli.config.as_deref())?;
    let env = config::process_env;

    match cli.command {
        Command::Publish { dry_run: true } => commands::publish::dry_run(&env, &file, &cwd),
        Command::Publish { dry_run: false } => commands::publish::run(&env, &file, &cwd).await,
        Command::Serve { port, dir } => {
            let root = dir.unwrap_or_else(|| config::resolve_source_dir(&env, &file, &cwd));
            commands::serve::run(&root, port).await?;
            Ok(Exit::Success)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            Exit::Fatal.into()
        }
    }
}
