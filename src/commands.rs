//! Reply formatting for the interactive commands.
//!
//! These are pure text builders — the bot runner fetches the data and sends
//! the replies. Dynamic names go through `escape_markdown` so board titles
//! with underscores don't break Telegram's parser.

use crate::channel::telegram::escape_markdown;
use crate::notification::BoardRef;
use crate::trello::{Board, Card, List};

/// Cards shown per /cards reply before truncating.
const MAX_CARDS_SHOWN: usize = 25;

pub fn help_text() -> String {
    "Commands:\n\
     /board — Show the watched board\n\
     /boards — List available boards\n\
     /boards <id> — Switch the watched board\n\
     /lists — Lists on the watched board\n\
     /cards <list-id> — Cards in a list\n\
     /card <list-id> <name> — Create a card\n\
     /help — Show this message"
        .to_owned()
}

pub fn format_board_overview(board: &Board) -> String {
    let mut text = format!("*{}*\n`{}`", escape_markdown(&board.name), board.id);
    if let Some(desc) = board.desc.as_deref().filter(|d| !d.is_empty()) {
        text.push_str(&format!("\n{}", escape_markdown(desc)));
    }
    if let Some(url) = &board.url {
        text.push_str(&format!("\n{url}"));
    }
    text
}

pub fn format_board_list(boards: &[Board], active_id: Option<&str>) -> String {
    if boards.is_empty() {
        return "No boards available.".to_owned();
    }

    let mut text = format!("{} board(s):\n", boards.len());
    for board in boards {
        let marker = if active_id == Some(board.id.as_str()) {
            " ← watching"
        } else {
            ""
        };
        text.push_str(&format!(
            "\n• {} — `{}`{marker}",
            escape_markdown(&board.name),
            board.id
        ));
    }
    text.push_str("\n\nUse /boards <id> to switch.");
    text
}

pub fn format_board_selected(board: &BoardRef) -> String {
    format!(
        "✅ Now watching *{}* (`{}`)",
        escape_markdown(&board.name),
        board.id
    )
}

pub fn format_lists(board_name: &str, lists: &[List]) -> String {
    if lists.is_empty() {
        return format!("No lists on {}.", escape_markdown(board_name));
    }

    let mut text = format!(
        "{} list(s) on *{}*:\n",
        lists.len(),
        escape_markdown(board_name)
    );
    for list in lists {
        text.push_str(&format!(
            "\n• {} — `{}`",
            escape_markdown(&list.name),
            list.id
        ));
    }
    text
}

pub fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "No cards in this list.".to_owned();
    }

    let mut text = format!("{} card(s):\n", cards.len());
    for card in cards.iter().take(MAX_CARDS_SHOWN) {
        text.push_str(&format!(
            "\n• {} — `{}`",
            escape_markdown(&card.name),
            card.id
        ));
        if let Some(due) = &card.due {
            text.push_str(&format!(" (due {due})"));
        }
    }
    if cards.len() > MAX_CARDS_SHOWN {
        text.push_str(&format!(
            "\n\n…and {} more not shown.",
            cards.len() - MAX_CARDS_SHOWN
        ));
    }
    text
}

pub fn format_card_created(card: &Card) -> String {
    let mut text = format!("✅ Created *{}* (`{}`)", escape_markdown(&card.name), card.id);
    if let Some(url) = &card.url {
        text.push_str(&format!("\n{url}"));
    }
    text
}
