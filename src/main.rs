//! Name Request asset server
//!
//! Serves the built wizard front-end with security headers and a status
//! page, and manages saved drafts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use namerequest::config::ServerConfig;
use namerequest::server;
use namerequest::store::DraftStore;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the per-user one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory containing the built front-end
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// URL prefix to serve under
    #[arg(long)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the front-end (default)
    Serve,
    /// List saved drafts
    Drafts,
    /// Delete a saved draft
    DeleteDraft { id: Uuid },
}

impl Args {
    fn overrides(&self) -> ServerConfig {
        ServerConfig {
            listen_address: self.listen.clone(),
            static_dir: self.static_dir.clone(),
            path_prefix: self.prefix.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "namerequest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let file_config = match &args.config {
        Some(path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };
    let settings = file_config
        .with_env()?
        .merge(args.overrides())
        .resolve()?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            server::run(settings).await?;
        }
        Command::Drafts => {
            let drafts = DraftStore::resolve(settings.draft_dir.as_deref())?;
            for id in drafts.list()? {
                let session = drafts
                    .load(id)
                    .with_context(|| format!("loading draft {id}"))?;
                let applicant = session.state().applicant.display_name();
                println!(
                    "{id}  {}  {}  {}  {}",
                    session.created_at().format("%Y-%m-%d %H:%M"),
                    session.phase(),
                    session.state().step.label(),
                    if applicant.is_empty() { "-" } else { applicant.as_str() }
                );
            }
        }
        Command::DeleteDraft { id } => {
            let drafts = DraftStore::resolve(settings.draft_dir.as_deref())?;
            if drafts.delete(id)? {
                info!(%id, "deleted draft");
            } else {
                println!("no draft {id}");
            }
        }
    }

    Ok(())
}
