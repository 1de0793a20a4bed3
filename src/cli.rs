// src/cli.rs
use crate::app_log;
use crate::controller::SyncStatus;
use crate::core::ConfigManager;
use crate::render::render_page;
use crate::web::{start_web_server, Services};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cvfolio")]
#[command(about = "Personal resume site with a GitHub-mirrored document store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to CV_CONFIG, then config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the web server (front stage and admin API)
    Serve,
    /// Render the front-stage page from the local document
    Render {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the local document with the published one
    Pull,
    /// Publish the local document to the remote repository
    Publish,
    /// Upload an image and print its public URL
    UploadAsset { file: PathBuf },
    /// Upload an image and use it as the profile avatar
    Avatar { file: PathBuf },
    /// Manage the remote credential
    Token {
        #[command(subcommand)]
        action: TokenCommand,
    },
    /// Show document counters and the remote settings
    Stats,
    /// Clear the local document; the next load seeds defaults
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Store a token in the local slot
    Set { token: String },
    /// Remove the stored token
    Clear,
    /// Verify the active token against the remote
    Check,
}

async fn read_upload(file: &Path) -> Result<(String, Vec<u8>)> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", file.display()))?
        .to_string();
    Ok((name, bytes))
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = ConfigManager::load_from(cli.config)?;
    let services = Services::wire(&config).await?;

    match cli.command {
        Command::Serve => start_web_server(&config, services).await?,

        Command::Render { output } => {
            let doc = services.controller.front_document().await;
            let ctx = services.render.clone().with_cache_bust(Utc::now().timestamp_millis());
            let html = render_page(&doc, &ctx);

            match output {
                Some(path) => {
                    tokio::fs::write(&path, html)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    app_log!(info, "✅ Page written to {}", path.display());
                }
                None => println!("{}", html),
            }
        }

        Command::Pull => {
            let snapshot = services.controller.pull_remote().await?;
            app_log!(info, "✅ Local document replaced with the remote copy");
            app_log!(
                info,
                "   Experience: {}, achievements: {}, projects: {}",
                snapshot.stats.experience,
                snapshot.stats.achievements,
                snapshot.stats.projects
            );
        }

        Command::Publish => {
            let receipt = services.controller.publish_now().await?;
            app_log!(info, "✅ Document published");
            app_log!(info, "   Commit: {}", receipt.commit);
            if let Some(revision) = receipt.revision {
                app_log!(info, "   Revision: {}", revision);
            }
        }

        Command::UploadAsset { file } => {
            let (name, bytes) = read_upload(&file).await?;
            let uploaded = services.controller.upload_photo(&name, &bytes).await?;
            app_log!(info, "✅ Uploaded {}", name);
            match uploaded.sync {
                SyncStatus::Published { commit, .. } => app_log!(info, "   Published: {}", commit),
                other => app_log!(warn, "❌ Document not published: {:?}", other),
            }
            println!("{}", uploaded.url);
        }

        Command::Avatar { file } => {
            let (name, bytes) = read_upload(&file).await?;
            let snapshot = services.controller.upload_avatar(&name, &bytes).await?;
            app_log!(
                info,
                "✅ Avatar set to {}",
                snapshot.document.profile.avatar_path.unwrap_or_default()
            );
        }

        Command::Token { action } => match action {
            TokenCommand::Set { token } => {
                if token.trim().is_empty() {
                    anyhow::bail!("Token must not be empty");
                }
                services.session.set_credential(&token).await?;
                app_log!(info, "✅ Token stored");
                if config.remote_token.is_some() {
                    app_log!(warn, "CV_GITHUB_TOKEN is set and takes precedence over the stored token");
                }
            }
            TokenCommand::Clear => {
                services.session.clear_credential().await?;
                app_log!(info, "✅ Stored token removed");
            }
            TokenCommand::Check => {
                let token = services
                    .session
                    .credential()
                    .await
                    .context("No token configured; use `token set` or CV_GITHUB_TOKEN")?;
                let status = services.remote.verify_credential(&token).await?;
                app_log!(info, "✅ Token belongs to {}", status.login);
                app_log!(info, "   Push: {}, pull: {}", status.can_push, status.can_pull);
                if !status.can_push {
                    app_log!(warn, "❌ Token cannot write to {}/{}", config.mirror.owner, config.mirror.repo);
                }
            }
        },

        Command::Stats => {
            let stats = services.store.load().await.stats();
            let token_state = match services.session.credential().await {
                Some(_) => "configured",
                None => "missing",
            };
            app_log!(info, "Environment: {}", config.environment);
            app_log!(info, "Storage: {:?} at {}", config.storage.backend, config.storage.path.display());
            app_log!(info, "Mirror: {}", config.mirror.cdn_url(&config.mirror.data_path));
            app_log!(info, "Experience: {}", stats.experience);
            app_log!(info, "Achievements: {}", stats.achievements);
            app_log!(info, "Projects: {}", stats.projects);
            app_log!(info, "Remote token: {}", token_state);
        }

        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset without --yes");
            }
            services.store.reset().await?;
            app_log!(info, "✅ Local document cleared");
        }
    }

    Ok(())
}
