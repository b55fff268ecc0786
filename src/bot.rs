//! Bot runner — the poll-and-deliver loop plus interactive command handling.
//!
//! Runs a `tokio::select!` loop over three sources:
//! 1. Telegram commands (via mpsc channel from the background long-poll)
//! 2. The notification poll timer (plus one immediate poll at startup)
//! 3. Shutdown signals (SIGTERM/SIGINT)
//!
//! The poll-and-deliver tick takes `&mut self` and runs inline in the loop,
//! so two ticks can never overlap; `MissedTickBehavior::Skip` drops timer
//! fires that would have queued behind a slow poll.

use std::path::Path;
use std::sync::Arc;

use color_eyre::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::boards::{BoardStore, resolve_active};
use crate::channel::telegram::{TelegramChannel, escape_markdown};
use crate::channel::{Channel, ChannelEvent, OutboundMessage};
use crate::commands;
use crate::config::Config;
use crate::cursor::NotificationCursor;
use crate::format::format_notification;
use crate::notification::BoardRef;
use crate::trello::TrelloClient;

/// Notifications fetched per poll. The fetch window also bounds how far a
/// gap can reach back, so keep it small.
const FETCH_LIMIT: u32 = 10;

pub struct Bot {
    config: Config,
    trello: TrelloClient,
    channel: Arc<TelegramChannel>,
    boards: BoardStore,
    cursor: NotificationCursor,
    /// The board currently being watched. Captured once per tick; a switch
    /// that lands mid-poll applies from the next tick.
    active: Option<BoardRef>,
}

impl Bot {
    pub fn new(config: Config, base: &Path) -> Self {
        let trello = TrelloClient::new(
            config.trello.api_key.clone(),
            config.trello.api_token.clone(),
        );
        let channel = Arc::new(TelegramChannel::new(
            config.telegram.bot_token.clone(),
            config.telegram.allowed_user_ids.clone(),
        ));
        let boards = BoardStore::load(&config.resolved_boards_path(base));

        Self {
            config,
            trello,
            channel,
            boards,
            cursor: NotificationCursor::new(),
            active: None,
        }
    }

    /// Resolve the board to watch. No valid board is a warning, not fatal:
    /// polling still runs and `/boards <id>` can fix it later.
    pub async fn init_board(&mut self) {
        self.active =
            resolve_active(&mut self.boards, self.config.board_override(), &self.trello).await;
        if self.active.is_none() {
            eprintln!(
                "[herald] warning: no valid board resolved — nothing will be delivered until /boards <id>"
            );
        }
    }

    /// Run the event loop until a shutdown signal arrives.
    pub async fn run(&mut self) -> Result<()> {
        let cancel = CancellationToken::new();

        // Set up SIGTERM/SIGINT handler.
        let shutdown_cancel = cancel.clone();
        tokio::spawn(async move {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                let mut sigterm =
                    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                        .expect("failed to install SIGTERM handler");
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = ctrl_c.await;
            }
            eprintln!("\n[herald] Shutdown signal received");
            shutdown_cancel.cancel();
        });

        // Start the Telegram polling loop in a background task.
        let (tx, mut rx) = mpsc::channel::<ChannelEvent>(64);
        let channel_clone = self.channel.clone();
        let poll_cancel = cancel.clone();
        tokio::spawn(async move {
            channel_clone.run(tx, poll_cancel).await;
        });

        let interval = std::time::Duration::from_secs(self.config.poll_interval_secs.max(1));
        let mut poll_timer = tokio::time::interval(interval);
        poll_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The interval's first tick fires immediately: that is the startup poll.

        eprintln!(
            "[herald] Ready. Polling every {}s, delivering to chat {}.",
            self.config.poll_interval_secs, self.config.telegram.chat_id
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    eprintln!("[herald] Shutting down...");
                    break;
                }

                event = rx.recv() => {
                    match event {
                        Some(ChannelEvent::Command { chat_id, user_name, command, args, .. }) => {
                            eprintln!("[herald] Command from {user_name}: /{command} {args}");
                            if let Err(e) = self.handle_command(chat_id, &command, &args).await {
                                eprintln!("[herald] Error handling /{command}: {e}");
                            }
                        }
                        None => {
                            eprintln!("[herald] Channel closed, shutting down.");
                            break;
                        }
                    }
                }

                _ = poll_timer.tick() => {
                    if let Err(e) = self.tick().await {
                        // Transient: the watermark is untouched and the next
                        // scheduled tick is the retry.
                        eprintln!("[herald] poll error: {e}");
                    }
                }
            }
        }

        Ok(())
    }

    /// One poll-and-deliver cycle.
    pub async fn tick(&mut self) -> Result<()> {
        // Capture the active board once; the whole window filters against it.
        let Some(board) = self.active.clone() else {
            return Ok(());
        };

        let window = self.trello.recent_notifications(FETCH_LIMIT).await?;
        let fresh = self.cursor.advance(&window, &board.id);
        if fresh.is_empty() {
            return Ok(());
        }

        eprintln!(
            "[herald] delivering {} notification(s) for board {}",
            fresh.len(),
            board.id
        );

        for notification in &fresh {
            let msg = format_notification(notification);
            let text = format!("*{}*\n{}", msg.title, escape_markdown(&msg.body));
            if let Err(e) = self.send(self.config.telegram.chat_id, &text).await {
                // The watermark already advanced past this event; it will not
                // be retried.
                eprintln!(
                    "[herald] failed to deliver notification {}: {e}",
                    notification.id
                );
            }
        }

        Ok(())
    }

    /// Handle a slash command. Failures reply with a short message and never
    /// touch the board store.
    async fn handle_command(&mut self, chat_id: i64, command: &str, args: &str) -> Result<()> {
        match command {
            "start" | "help" => self.send(chat_id, &commands::help_text()).await,

            "board" => match &self.active {
                Some(active) => match self.trello.board(&active.id).await {
                    Ok(Some(board)) => {
                        self.send(chat_id, &commands::format_board_overview(&board))
                            .await
                    }
                    Ok(None) => {
                        self.send(chat_id, "❌ The watched board no longer exists.")
                            .await
                    }
                    Err(e) => {
                        eprintln!("[herald] /board failed: {e}");
                        self.send(chat_id, "❌ Could not fetch the board.").await
                    }
                },
                None => {
                    self.send(chat_id, "No board is being watched. Use /boards to pick one.")
                        .await
                }
            },

            "boards" if !args.is_empty() => self.select_board(chat_id, args).await,

            "boards" => match self.trello.member_boards().await {
                Ok(boards) => {
                    let active_id = self.active.as_ref().map(|b| b.id.as_str());
                    self.send(chat_id, &commands::format_board_list(&boards, active_id))
                        .await
                }
                Err(e) => {
                    eprintln!("[herald] /boards failed: {e}");
                    self.send(chat_id, "❌ Could not fetch your boards.").await
                }
            },

            "lists" => match &self.active {
                Some(active) => match self.trello.board_lists(&active.id).await {
                    Ok(lists) => {
                        self.send(chat_id, &commands::format_lists(&active.name, &lists))
                            .await
                    }
                    Err(e) => {
                        eprintln!("[herald] /lists failed: {e}");
                        self.send(chat_id, "❌ Could not fetch lists.").await
                    }
                },
                None => {
                    self.send(chat_id, "No board is being watched. Use /boards to pick one.")
                        .await
                }
            },

            "cards" => {
                if args.is_empty() {
                    return self.send(chat_id, "Usage: /cards <list-id>").await;
                }
                match self.trello.list_cards(args).await {
                    Ok(cards) => self.send(chat_id, &commands::format_cards(&cards)).await,
                    Err(e) => {
                        eprintln!("[herald] /cards failed: {e}");
                        self.send(chat_id, "❌ Could not fetch cards for that list.")
                            .await
                    }
                }
            }

            "card" => {
                let Some((list_id, name)) = args.split_once(' ') else {
                    return self.send(chat_id, "Usage: /card <list-id> <name>").await;
                };
                let name = name.trim();
                if name.is_empty() {
                    return self.send(chat_id, "Usage: /card <list-id> <name>").await;
                }
                match self.trello.create_card(list_id, name, "").await {
                    Ok(card) => {
                        self.send(chat_id, &commands::format_card_created(&card))
                            .await
                    }
                    Err(e) => {
                        eprintln!("[herald] /card failed: {e}");
                        self.send(chat_id, "❌ Could not create the card.").await
                    }
                }
            }

            _ => {
                self.send(
                    chat_id,
                    &format!("Unknown command: /{command}\nSend /help for available commands."),
                )
                .await
            }
        }
    }

    /// Validate-then-commit board selection: the store and the active slot
    /// only change once the id has been confirmed against the remote.
    async fn select_board(&mut self, chat_id: i64, board_id: &str) -> Result<()> {
        match self.trello.board(board_id).await {
            Ok(Some(board)) => {
                let board_ref = board.to_ref();
                if let Err(e) = self.boards.select(&board_ref.id, &board_ref.name) {
                    eprintln!("[herald] failed to persist board selection: {e}");
                    return self
                        .send(chat_id, "❌ Could not save the board selection.")
                        .await;
                }
                // The next poll filters against the new board.
                self.active = Some(board_ref.clone());
                self.send(chat_id, &commands::format_board_selected(&board_ref))
                    .await
            }
            Ok(None) => {
                self.send(
                    chat_id,
                    &format!("❌ No board with id `{board_id}`. Use /boards to list them."),
                )
                .await
            }
            Err(e) => {
                eprintln!("[herald] board validation failed: {e}");
                self.send(chat_id, "❌ Could not reach Trello to validate that board.")
                    .await
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        self.channel
            .send_message(&OutboundMessage {
                chat_id,
                text: text.to_owned(),
            })
            .await
    }
}
