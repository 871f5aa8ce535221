//! # Console commands
//!
//! Every mutating command checks the local session first and fails with
//! "session invalid" before any network traffic when there is none.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use folio_common::auth::{FileSessionStore, SessionManager, SessionState};
use folio_common::config::ClientConfig;
use folio_common::db::models::{NewProject, ProjectPatch};

use crate::client::GatewayClient;

/// Console subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in as the admin and store a session locally.
    Login {
        #[arg(long, env = "FOLIO_ADMIN_EMAIL")]
        email: String,
        #[arg(long, env = "FOLIO_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Erase the local session.
    Logout,

    /// Show the session state; with --watch, re-check it periodically.
    Status {
        #[arg(long)]
        watch: bool,
        /// Seconds between checks (defaults to session.poll_interval_secs).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// List projects, newest first.
    List {
        #[arg(long)]
        featured: bool,
    },

    /// Show one project.
    Get { id: i64 },

    /// Create a project.
    Create(CreateArgs),

    /// Update fields of a project.
    Update {
        id: i64,
        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Delete a project.
    Delete { id: i64 },

    /// Upload an image for a project and print its public URL.
    Upload { id: i64, file: PathBuf },

    /// Remove an image by its public URL.
    RemoveImage { url: String },

    /// Insert the sample projects into an empty table.
    Seed,

    /// Check that the gateway and its store are reachable.
    Check,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: String,
    #[arg(long, default_value = "")]
    pub image: String,
    /// Comma-separated technologies.
    #[arg(long, value_delimiter = ',')]
    pub tech: Vec<String>,
    #[arg(long)]
    pub github: Option<String>,
    #[arg(long)]
    pub demo: Option<String>,
    #[arg(long)]
    pub featured: bool,
}

impl From<CreateArgs> for NewProject {
    fn from(args: CreateArgs) -> Self {
        NewProject {
            title: args.title,
            description: args.description,
            image: args.image,
            tech: args.tech,
            github: args.github,
            demo: args.demo,
            featured: args.featured,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub tech: Option<Vec<String>>,
    #[arg(long)]
    pub github: Option<String>,
    #[arg(long)]
    pub demo: Option<String>,
    /// true or false
    #[arg(long)]
    pub featured: Option<bool>,
}

impl From<UpdateArgs> for ProjectPatch {
    fn from(args: UpdateArgs) -> Self {
        ProjectPatch {
            title: args.title,
            description: args.description,
            image: args.image,
            tech: args.tech,
            github: args.github,
            demo: args.demo,
            featured: args.featured,
        }
    }
}

/// What the commands run against
pub struct Console {
    pub config: ClientConfig,
    pub session: Arc<SessionManager>,
    pub gateway: GatewayClient,
}

impl Console {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(&config.session.path));
        let session = Arc::new(SessionManager::new(
            store,
            config.admin.clone(),
            config.session.ttl(),
        ));
        let gateway = GatewayClient::new(&config.gateway)?;

        Ok(Self {
            config,
            session,
            gateway,
        })
    }

    /// Token of the current session
    fn token(&self) -> Result<String> {
        Ok(self.session.require()?)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dispatch one command and return the process exit code
pub async fn run(command: Command, console: &Console) -> Result<u8> {
    match command {
        Command::Login { email, password } => {
            console.session.login(&email, &password)?;
            print_json(&console.session.state())?;
        }

        Command::Logout => {
            console.session.logout()?;
            println!("logged out");
        }

        Command::Status { watch, interval } => {
            if watch {
                let interval = interval
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| console.config.session.poll_interval());
                watch_session(console, interval).await?;
            } else {
                let state = console.session.state();
                print_json(&state)?;
                if state == SessionState::Anonymous {
                    return Ok(1);
                }
            }
        }

        Command::List { featured } => {
            print_json(&console.gateway.list(featured).await?)?;
        }

        Command::Get { id } => {
            print_json(&console.gateway.get(id).await?)?;
        }

        Command::Create(args) => {
            let token = console.token()?;
            let created = console.gateway.create(&token, &args.into()).await?;
            print_json(&created)?;
        }

        Command::Update { id, fields } => {
            let token = console.token()?;
            let patch = ProjectPatch::from(fields);
            if patch.is_empty() {
                anyhow::bail!("nothing to update: pass at least one field");
            }
            print_json(&console.gateway.update(&token, id, &patch).await?)?;
        }

        Command::Delete { id } => {
            let token = console.token()?;
            console.gateway.delete(&token, id).await?;
            println!("deleted project {}", id);
        }

        Command::Upload { id, file } => {
            let token = console.token()?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .context("image path has no file name")?;
            let url = console
                .gateway
                .upload_image(&token, id, file_name, bytes)
                .await?;
            println!("{}", url);
        }

        Command::RemoveImage { url } => {
            let token = console.token()?;
            console.gateway.delete_image(&token, &url).await?;
            println!("removed {}", url);
        }

        Command::Seed => {
            let token = console.token()?;
            print_json(&console.gateway.seed(&token).await?)?;
        }

        Command::Check => {
            let report = console.gateway.ready().await?;
            print_json(&report)?;
            if report["status"] != "ready" {
                return Ok(1);
            }
        }
    }

    Ok(0)
}

/// Print the session state each time it changes until it lapses or Ctrl+C
async fn watch_session(console: &Console, interval: Duration) -> Result<()> {
    let mut session = console.session.watch(interval)?;
    print_json(&console.session.state())?;

    loop {
        if !*session.receiver.borrow_and_update() {
            println!("session ended");
            break;
        }

        tokio::select! {
            changed = session.receiver.changed() => {
                if changed.is_err() {
                    break;
                }
                print_json(&console.session.state())?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.handle.abort();
    Ok(())
}
