use anyhow::Result;
use clap::{Parser, Subcommand};
use instabot_common::observability::init_logging;
use instabot_config::{InstabotConfig, InstabotConfigLoader};
use std::path::PathBuf;

mod commands;
mod wiring;

const DEFAULT_CONFIG: &str = "instabot.yaml";

/// Review blog posts and draft comments for them.
#[derive(Debug, Parser)]
#[command(name = "instabot", version, about)]
struct Cli {
    /// Configuration file (YAML). Defaults to ./instabot.yaml when present.
    #[arg(long, short, global = true, env = "INSTABOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract the readable article text behind a URL.
    Extract {
        url: String,
        /// Print the full article (metadata and cleaned HTML) as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List posts from the configured WordPress site.
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List comments, optionally for one post.
    Comments {
        #[arg(long)]
        post: Option<u64>,
    },
    /// Extract an article and suggest comments for it.
    Suggest {
        url: String,
        #[arg(long)]
        tone: Option<String>,
    },
    /// Publish an approved comment.
    Reply { post_id: u64, content: String },
    /// Walk recent posts, extracting each and suggesting comments.
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
        #[arg(long)]
        tone: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<InstabotConfig> {
    let loader = match path {
        Some(path) => InstabotConfigLoader::new().with_file(path),
        None => InstabotConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    Ok(loader.load()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg = load_config(cli.config.as_ref())?;

    // 2) Logging as configured
    let log_path = init_logging(wiring::log_config(&cfg.logging))?;
    tracing::debug!(target: "app", log = %log_path.display(), command = ?cli.command, "starting");

    match &cli.command {
        Command::Extract { url, json } => commands::extract(&cfg, url, *json).await,
        Command::Posts { page } => commands::posts(&cfg, *page).await,
        Command::Comments { post } => commands::comments(&cfg, *post).await,
        Command::Suggest { url, tone } => commands::suggest(&cfg, url, tone.as_deref()).await,
        Command::Reply { post_id, content } => commands::reply(&cfg, *post_id, content).await,
        Command::Feed { pages, tone } => commands::feed(&cfg, *pages, tone.as_deref()).await,
    }
}
