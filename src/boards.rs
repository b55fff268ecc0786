//! Board selection — which board the relay is watching.
//!
//! The active board is resolved from three tiers, first valid wins:
//! an explicit config override, the persisted selection in `boards.json`,
//! or the first board discovered from the remote service. Every candidate is
//! validated against the remote before acceptance; a candidate whose
//! validation fails transiently is rejected for that call rather than trusted
//! blindly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

use crate::notification::BoardRef;
use crate::state::{load_state, save_state};

/// Cap on the most-recently-used board history.
const MAX_RECENT: usize = 10;

/// Remote lookup seam — implemented by the Trello client, mocked in tests.
#[async_trait]
pub trait BoardDirectory: Send + Sync {
    /// Look up one board. `Ok(None)` means the id is not valid for this
    /// account; `Err` means the lookup itself failed (transient).
    async fn board(&self, id: &str) -> Result<Option<BoardRef>>;

    /// All open boards for the authenticated member, excluding archived ones.
    async fn boards(&self) -> Result<Vec<BoardRef>>;
}

/// One entry in the most-recently-used history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentBoard {
    pub id: String,
    pub name: String,
    pub last_used: DateTime<Utc>,
}

/// On-disk format for `boards.json`. An absent file is just empty defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardStoreState {
    #[serde(default)]
    active_board_id: Option<String>,
    #[serde(default)]
    recent_boards: Vec<RecentBoard>,
}

/// File-backed board selection: one active slot plus an MRU history.
pub struct BoardStore {
    path: PathBuf,
    state: BoardStoreState,
}

impl BoardStore {
    /// Load the store from `path`. A missing or unreadable file starts empty.
    pub fn load(path: &Path) -> Self {
        let state = match load_state(path) {
            Ok(state) => state,
            Err(e) => {
                eprintln!("[boards] failed to load {}: {e}", path.display());
                BoardStoreState::default()
            }
        };
        Self {
            path: path.to_path_buf(),
            state,
        }
    }

    /// The persisted active board id, if one has been selected.
    pub fn active_id(&self) -> Option<&str> {
        self.state.active_board_id.as_deref()
    }

    /// Most-recently-used history, newest first.
    pub fn recent(&self) -> &[RecentBoard] {
        &self.state.recent_boards
    }

    /// Select a board: update the active slot and the MRU history, then
    /// persist synchronously.
    pub fn select(&mut self, id: &str, name: &str) -> Result<()> {
        self.state.active_board_id = Some(id.to_owned());

        let recents = &mut self.state.recent_boards;
        if let Some(pos) = recents.iter().position(|b| b.id == id) {
            let mut entry = recents.remove(pos);
            entry.last_used = Utc::now();
            if !name.is_empty() {
                entry.name = name.to_owned();
            }
            recents.insert(0, entry);
        } else {
            recents.insert(
                0,
                RecentBoard {
                    id: id.to_owned(),
                    name: name.to_owned(),
                    last_used: Utc::now(),
                },
            );
            recents.truncate(MAX_RECENT);
        }

        save_state(&self.path, &self.state)
    }
}

/// Resolve the board to watch: override > persisted > first discovered.
///
/// A discovered board is persisted through [`BoardStore::select`] so the
/// choice sticks across restarts. Returns `None` when no tier produces a
/// valid board — the caller keeps polling, the board filter just yields
/// nothing.
pub async fn resolve_active(
    store: &mut BoardStore,
    override_id: Option<&str>,
    directory: &dyn BoardDirectory,
) -> Option<BoardRef> {
    if let Some(id) = override_id {
        match directory.board(id).await {
            Ok(Some(board)) => {
                eprintln!("[boards] using configured board {id}");
                return Some(board);
            }
            Ok(None) => eprintln!("[boards] configured board id {id:?} is not valid, skipping"),
            Err(e) => eprintln!("[boards] could not validate configured board {id}: {e}"),
        }
    }

    if let Some(id) = store.active_id().map(str::to_owned) {
        match directory.board(&id).await {
            Ok(Some(board)) => {
                eprintln!("[boards] using persisted board {id}");
                return Some(board);
            }
            Ok(None) => eprintln!("[boards] persisted board id {id:?} is not valid, skipping"),
            Err(e) => eprintln!("[boards] could not validate persisted board {id}: {e}"),
        }
    }

    match directory.boards().await {
        Ok(boards) => {
            let first = boards.into_iter().next()?;
            eprintln!(
                "[boards] auto-selected first available board: {} ({})",
                first.name, first.id
            );
            if let Err(e) = store.select(&first.id, &first.name) {
                eprintln!("[boards] failed to persist auto-selected board: {e}");
            }
            Some(first)
        }
        Err(e) => {
            eprintln!("[boards] board discovery failed: {e}");
            None
        }
    }
}
