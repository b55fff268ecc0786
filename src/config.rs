//! Configuration loaded from `herald.toml`.
//!
//! # Configuration file format
//!
//! ```toml
//! # How often to poll for notifications, in seconds (default: 300).
//! # Legacy deployments polled hourly; set 3600 for that behavior.
//! poll_interval_secs = 300
//!
//! # Optional explicit board override — highest-priority resolution tier.
//! # board_id = "5f2b8..."
//!
//! # Where the board selection is persisted (default: .herald/boards.json).
//! # boards_path = ".herald/boards.json"
//!
//! [trello]
//! api_key = "..."      # required
//! api_token = "..."    # required
//!
//! [telegram]
//! bot_token = "..."    # required, from @BotFather
//! chat_id = 123456789  # required — where notifications are delivered
//! # allowed_user_ids = []  # optional command allow-list (empty = everyone)
//! ```

use std::path::{Path, PathBuf};

use color_eyre::Result;
use color_eyre::eyre::{bail, eyre};
use serde::Deserialize;

/// Top-level herald configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How often to poll for notifications, in seconds (default: 300).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Explicit board override — wins over the persisted selection.
    #[serde(default)]
    pub board_id: Option<String>,

    /// Where the board selection is persisted.
    #[serde(default = "default_boards_path")]
    pub boards_path: PathBuf,

    /// Trello API credentials.
    pub trello: TrelloConfig,

    /// Telegram bot configuration.
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrelloConfig {
    /// API key from https://trello.com/power-ups/admin.
    pub api_key: String,
    /// Member token authorized for the watched account.
    pub api_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token from @BotFather.
    pub bot_token: String,

    /// Chat where board activity is delivered.
    pub chat_id: i64,

    /// User IDs allowed to run commands. Empty = allow all users.
    #[serde(default)]
    pub allowed_user_ids: Vec<i64>,
}

fn default_poll_interval() -> u64 {
    300
}

fn default_boards_path() -> PathBuf {
    PathBuf::from(".herald/boards.json")
}

impl Config {
    /// Load and validate configuration from a TOML file.
    ///
    /// Missing file or missing required credentials are startup errors;
    /// herald exits rather than running degraded.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                eyre!(
                    "no config found at {}\n\n\
                     Create herald.toml with:\n\n\
                     [trello]\n\
                     api_key = \"...\"\n\
                     api_token = \"...\"\n\n\
                     [telegram]\n\
                     bot_token = \"...\"\n\
                     chat_id = 123456789\n",
                    path.display()
                )
            } else {
                eyre!("failed to read {}: {e}", path.display())
            }
        })?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| eyre!("failed to parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable required fields; warn about suspicious ones.
    fn validate(&self) -> Result<()> {
        if self.trello.api_key.is_empty() {
            bail!("trello.api_key is empty");
        }
        if self.trello.api_token.is_empty() {
            bail!("trello.api_token is empty");
        }
        if self.telegram.bot_token.is_empty() {
            bail!("telegram.bot_token is empty");
        }
        if self.telegram.chat_id == 0 {
            bail!("telegram.chat_id is not set");
        }
        if self.poll_interval_secs == 0 {
            eprintln!("[herald] warning: poll_interval_secs is 0, this will poll as fast as possible");
        }
        if let Some(board_id) = &self.board_id
            && board_id.is_empty()
        {
            eprintln!("[herald] warning: board_id is empty — override tier will be skipped");
        }
        Ok(())
    }

    /// Resolve the boards file relative to `base` unless it is absolute.
    pub fn resolved_boards_path(&self, base: &Path) -> PathBuf {
        if self.boards_path.is_absolute() {
            self.boards_path.clone()
        } else {
            base.join(&self.boards_path)
        }
    }

    /// The board override tier, skipping an empty string.
    pub fn board_override(&self) -> Option<&str> {
        self.board_id.as_deref().filter(|id| !id.is_empty())
    }
}
