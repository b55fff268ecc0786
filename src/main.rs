//! Herald — relay Trello board activity into a Telegram chat.
//!
//! Polls the Trello notification feed on an interval, filters to the watched
//! board, and mirrors new activity as chat messages. Slash commands let chat
//! users inspect and mutate the board.

mod boards;
mod bot;
mod channel;
mod commands;
mod config;
mod cursor;
mod format;
mod notification;
mod state;
mod trello;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};

use crate::bot::Bot;
use crate::config::Config;

/// Herald — Trello → Telegram notification relay.
#[derive(Parser)]
#[command(name = "herald", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, global = true, default_value = "herald.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay daemon (poll on interval, serve commands).
    Run,

    /// Single poll-and-deliver cycle, then exit.
    Once,

    /// Print the boards the configured account can watch.
    Boards,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let cwd = std::env::current_dir().wrap_err("failed to get current directory")?;

    // Missing or incomplete configuration is fatal; herald does not run
    // degraded.
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Run => cmd_run(config, &cwd).await,
        Command::Once => cmd_once(config, &cwd).await,
        Command::Boards => cmd_boards(config).await,
    }
}

/// Run the daemon until a shutdown signal arrives.
async fn cmd_run(config: Config, cwd: &Path) -> Result<()> {
    let mut bot = Bot::new(config, cwd);
    bot.init_board().await;
    bot.run().await
}

/// One poll cycle, for cron-driven setups and smoke testing.
async fn cmd_once(config: Config, cwd: &Path) -> Result<()> {
    let mut bot = Bot::new(config, cwd);
    bot.init_board().await;
    bot.tick().await
}

/// List the boards available to the configured account.
async fn cmd_boards(config: Config) -> Result<()> {
    let trello = trello::TrelloClient::new(config.trello.api_key, config.trello.api_token);
    let boards = trello.member_boards().await?;

    if boards.is_empty() {
        println!("No boards available.");
    } else {
        for board in &boards {
            println!("{} ({})", board.name, board.id);
        }
    }

    Ok(())
}
