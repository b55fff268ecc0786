//! Notification cursor — decides which notifications in a poll window are new.
//!
//! The cursor tracks the id of the newest notification already processed (the
//! watermark). Poll responses arrive newest-first, so "new since last poll"
//! is everything ahead of the watermark's position in the window. Ids are
//! opaque: the boundary is found by equality, never by comparing ids.

use crate::notification::Notification;

/// Watermark state for one watched feed.
///
/// Lives for the process lifetime only: a restart starts fresh and the
/// window between shutdown and the first poll is never replayed.
#[derive(Debug, Default)]
pub struct NotificationCursor {
    watermark: Option<String>,
}

impl NotificationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of the newest notification already processed, if any.
    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_deref()
    }

    /// Consume a newest-first poll window and return the notifications to
    /// deliver for `active_board`, oldest first.
    ///
    /// The watermark advances to the newest id in the window even when the
    /// board filter leaves nothing to deliver; a burst of other-board
    /// activity must not be re-scanned on every subsequent poll. Advancing
    /// happens before any delivery is attempted; a failed send is not
    /// retried on the next tick.
    pub fn advance(&mut self, window: &[Notification], active_board: &str) -> Vec<Notification> {
        let Some(newest) = window.first() else {
            return Vec::new();
        };
        let newest_id = newest.id.clone();

        // Same newest id as last poll: nothing happened since.
        if self.watermark.as_deref() == Some(newest_id.as_str()) {
            return Vec::new();
        }

        // Collect everything ahead of the old watermark's position.
        let mut candidates: Vec<&Notification> = Vec::new();
        let mut boundary_found = false;
        for notification in window {
            if self.watermark.as_deref() == Some(notification.id.as_str()) {
                boundary_found = true;
                break;
            }
            candidates.push(notification);
        }

        if let Some(old) = &self.watermark
            && !boundary_found
        {
            // The old watermark fell outside the fetch window. Everything in
            // the window is treated as new; anything between the watermark
            // and the window's tail is skipped silently.
            eprintln!(
                "[cursor] watermark {old} not in fetch window of {} event(s), treating whole window as new",
                window.len()
            );
        }

        let mut fresh: Vec<Notification> = candidates
            .into_iter()
            .filter(|n| n.board_id() == Some(active_board))
            .cloned()
            .collect();

        // Delivery reads top-to-bottom as "what happened, in order".
        fresh.reverse();

        self.watermark = Some(newest_id);
        fresh
    }
}
