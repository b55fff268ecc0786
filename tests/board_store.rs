//! Integration tests for board selection: store persistence round-trips and
//! the three-tier resolution order against a mock directory.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::bail;
use herald::boards::{BoardDirectory, BoardStore, resolve_active};
use herald::notification::BoardRef;
use tempfile::TempDir;

fn board(id: &str, name: &str) -> BoardRef {
    BoardRef {
        id: id.into(),
        name: name.into(),
    }
}

/// Directory stub: a fixed set of valid boards, optional forced failures.
#[derive(Default)]
struct MockDirectory {
    known: HashMap<String, BoardRef>,
    discovered: Vec<BoardRef>,
    validation_down: bool,
    discovery_down: bool,
}

impl MockDirectory {
    fn with_known(mut self, b: BoardRef) -> Self {
        self.known.insert(b.id.clone(), b);
        self
    }

    fn with_discovered(mut self, boards: Vec<BoardRef>) -> Self {
        self.discovered = boards;
        self
    }
}

#[async_trait]
impl BoardDirectory for MockDirectory {
    async fn board(&self, id: &str) -> Result<Option<BoardRef>> {
        if self.validation_down {
            bail!("validation endpoint unreachable");
        }
        Ok(self.known.get(id).cloned())
    }

    async fn boards(&self) -> Result<Vec<BoardRef>> {
        if self.discovery_down {
            bail!("discovery endpoint unreachable");
        }
        Ok(self.discovered.clone())
    }
}

fn store_at(dir: &TempDir) -> BoardStore {
    BoardStore::load(&dir.path().join("boards.json"))
}

// ---- Selection persists and round-trips ----

#[test]
fn select_then_reload_returns_the_selection() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("b7", "Roadmap").unwrap();

    let reloaded = store_at(&dir);
    assert_eq!(reloaded.active_id(), Some("b7"));
    assert_eq!(reloaded.recent()[0].id, "b7");
    assert_eq!(reloaded.recent()[0].name, "Roadmap");
}

#[test]
fn repeated_selection_refreshes_the_front_entry() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("b1", "One").unwrap();
    store.select("b2", "Two").unwrap();
    let first_ts = store.recent().iter().find(|b| b.id == "b1").unwrap().last_used;

    store.select("b1", "One").unwrap();
    assert_eq!(store.recent()[0].id, "b1");
    assert!(store.recent()[0].last_used >= first_ts);
    // Still two distinct entries.
    assert_eq!(store.recent().len(), 2);
}

#[test]
fn missing_store_file_is_empty_defaults() {
    let store = BoardStore::load(Path::new("/nonexistent/herald/boards.json"));
    assert!(store.active_id().is_none());
    assert!(store.recent().is_empty());
}

// ---- Resolution tiers ----

#[tokio::test]
async fn override_tier_wins_when_valid() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("persisted", "Persisted").unwrap();

    let directory = MockDirectory::default()
        .with_known(board("override", "Override"))
        .with_known(board("persisted", "Persisted"));

    let resolved = resolve_active(&mut store, Some("override"), &directory).await;
    assert_eq!(resolved.unwrap().id, "override");
}

#[tokio::test]
async fn invalid_override_falls_through_to_persisted() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("persisted", "Persisted").unwrap();

    let directory = MockDirectory::default().with_known(board("persisted", "Persisted"));

    let resolved = resolve_active(&mut store, Some("bogus"), &directory).await;
    assert_eq!(resolved.unwrap().id, "persisted");
}

#[tokio::test]
async fn invalid_persisted_falls_through_to_discovery() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("stale", "Gone").unwrap();

    let directory = MockDirectory::default()
        .with_discovered(vec![board("d1", "Discovered"), board("d2", "Ignored")]);

    let resolved = resolve_active(&mut store, None, &directory).await;
    assert_eq!(resolved.unwrap().id, "d1");
}

#[tokio::test]
async fn discovered_board_is_persisted() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);

    let directory = MockDirectory::default().with_discovered(vec![board("d1", "Discovered")]);

    let resolved = resolve_active(&mut store, None, &directory).await;
    assert_eq!(resolved.unwrap().id, "d1");

    // The choice sticks across restarts.
    let reloaded = store_at(&dir);
    assert_eq!(reloaded.active_id(), Some("d1"));
}

#[tokio::test]
async fn transient_validation_failure_fails_closed() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);
    store.select("persisted", "Persisted").unwrap();

    // Validation is down but discovery works: both validated tiers are
    // rejected for this call and discovery decides.
    let directory = MockDirectory {
        validation_down: true,
        ..MockDirectory::default()
    }
    .with_discovered(vec![board("d1", "Discovered")]);

    let resolved = resolve_active(&mut store, Some("override"), &directory).await;
    assert_eq!(resolved.unwrap().id, "d1");
}

#[tokio::test]
async fn nothing_resolves_when_every_tier_is_empty_or_down() {
    let dir = TempDir::new().unwrap();
    let mut store = store_at(&dir);

    let directory = MockDirectory {
        discovery_down: true,
        ..MockDirectory::default()
    };
    assert!(resolve_active(&mut store, None, &directory).await.is_none());

    let directory = MockDirectory::default(); // discovery up, but empty
    assert!(resolve_active(&mut store, None, &directory).await.is_none());
}
