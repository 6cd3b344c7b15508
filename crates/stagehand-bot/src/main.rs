use anyhow::Context;
use clap::Parser;
use claude_client::ClaudeClient;
use stagehand_bot::{ClaudeCompletion, Handler, TelegramClient};
use stagehand_core::{GitPublisher, Stagehand, StagehandConfig};
use std::path::PathBuf;
use tracing::{error, info};

/// How long getUpdates blocks server-side waiting for traffic.
const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Parser)]
#[command(
    name = "stagehand",
    about = "Chat-driven content staging: edit, preview, confirm, deploy",
    version
)]
struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: String,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: String,

    /// Path to the site's git repository
    #[arg(long, env = "REPO_PATH")]
    repo_path: PathBuf,

    /// Telegram user ids allowed to drive the bot (empty = anyone)
    #[arg(long, env = "ALLOWED_USERS", value_delimiter = ',', num_args = 0..)]
    allowed_users: Vec<i64>,

    /// Model used for content generation
    #[arg(long, env = "CLAUDE_MODEL", default_value = "claude-sonnet-4-20250514")]
    model: String,

    /// Git remote pushed on deploy
    #[arg(long, env = "GIT_REMOTE", default_value = "origin")]
    remote: String,

    /// Git branch pushed on deploy
    #[arg(long, env = "GIT_BRANCH", default_value = "main")]
    branch: String,

    /// Optional brand/style guidance passed to the generator
    #[arg(long, env = "STYLE_NOTES")]
    style_notes: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = StagehandConfig::new(&cli.repo_path);
    config.remote = cli.remote.clone();
    config.branch = cli.branch.clone();
    config.style_notes = cli.style_notes.clone();
    stagehand_core::io::ensure_dir(&config.staged_root())
        .with_context(|| format!("creating staged dir under {}", cli.repo_path.display()))?;

    let claude = ClaudeClient::new(&cli.anthropic_api_key, &cli.model)
        .context("building Anthropic client")?;
    let publisher = GitPublisher::new(&cli.repo_path, &cli.remote, &cli.branch);
    let stagehand = Stagehand::new(
        &config,
        Box::new(ClaudeCompletion::new(claude)),
        Box::new(publisher),
    );
    let default_target = config.default_target.clone();
    let mut handler = Handler::new(stagehand, default_target, cli.allowed_users.clone());

    let telegram = TelegramClient::new(&cli.telegram_token);
    info!(repo = %cli.repo_path.display(), model = %cli.model, "stagehand starting");

    let mut offset: i64 = 0;
    loop {
        let updates = match telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                error!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else { continue };
            let Some(text) = message.text.as_deref() else { continue };
            let user_id = message.from.as_ref().map(|u| u.id);

            let replies = handler.handle(message.chat.id, user_id, text).await;
            for reply in replies {
                if let Err(e) = telegram.send_chunked(message.chat.id, &reply).await {
                    error!(chat_id = message.chat.id, error = %e, "failed to send reply");
                }
            }
        }
    }
}
