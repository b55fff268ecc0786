//! Formatting — turn one notification into channel-ready message content.
//!
//! Pure functions only: no network, no state. Missing optional fields render
//! as "unknown" so the message shape is stable whatever the source populated.

use crate::notification::{CardRef, Notification, Payload};

/// Channel-ready message content for one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub title: String,
    pub body: String,
}

fn card_name(card: &Option<CardRef>) -> &str {
    match card {
        Some(c) if !c.name.is_empty() => &c.name,
        _ => "unknown",
    }
}

fn actor_name(notification: &Notification) -> &str {
    if notification.actor.full_name.is_empty() {
        "unknown"
    } else {
        &notification.actor.full_name
    }
}

/// Render a notification for delivery.
pub fn format_notification(notification: &Notification) -> ChannelMessage {
    let actor = actor_name(notification);

    match &notification.payload {
        Payload::CommentAdded { card, text, .. } => ChannelMessage {
            title: "💬 New comment".into(),
            body: format!("{actor} on \"{}\": {text}", card_name(card)),
        },
        Payload::MemberAdded { card, member, .. } => {
            let member = member
                .as_ref()
                .filter(|m| !m.full_name.is_empty())
                .map_or("unknown", |m| m.full_name.as_str());
            ChannelMessage {
                title: "👤 Member added".into(),
                body: format!("{member} was added to \"{}\"", card_name(card)),
            }
        }
        Payload::CardCreated { card, list, .. } => {
            let mut body = format!("{actor} created \"{}\"", card_name(card));
            if let Some(list) = list
                && !list.name.is_empty()
            {
                body.push_str(&format!(" in {}", list.name));
            }
            ChannelMessage {
                title: "➕ Card created".into(),
                body,
            }
        }
        Payload::CardUpdated {
            card,
            list_before: Some(before),
            list_after: Some(after),
            ..
        } => ChannelMessage {
            title: "📋 Card moved".into(),
            body: format!(
                "\"{}\" moved from {} to {}",
                card_name(card),
                before.name,
                after.name
            ),
        },
        Payload::CardUpdated { card, .. } if card.as_ref().is_some_and(|c| c.closed) => {
            ChannelMessage {
                title: "🗑 Card archived".into(),
                body: format!("\"{}\" was archived by {actor}", card_name(card)),
            }
        }
        Payload::CardUpdated { card, .. } => ChannelMessage {
            title: "✏️ Card updated".into(),
            body: format!("\"{}\" was updated by {actor}", card_name(card)),
        },
        Payload::Other { kind, .. } => ChannelMessage {
            title: "📢 Board activity".into(),
            body: format!("{actor}: {kind}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Actor, BoardRef, ListRef, MemberRef};
    use chrono::Utc;

    fn base(actor: &str, payload: Payload) -> Notification {
        Notification {
            id: "n1".into(),
            occurred_at: Utc::now(),
            actor: Actor {
                full_name: actor.into(),
                avatar_url: None,
            },
            payload,
        }
    }

    fn card(name: &str) -> Option<CardRef> {
        Some(CardRef {
            id: "c1".into(),
            name: name.into(),
            closed: false,
        })
    }

    fn board() -> Option<BoardRef> {
        Some(BoardRef {
            id: "b1".into(),
            name: "Sprint".into(),
        })
    }

    #[test]
    fn comment_includes_actor_card_and_text() {
        let msg = format_notification(&base(
            "Aoi",
            Payload::CommentAdded {
                board: board(),
                card: card("Fix login"),
                text: "done".into(),
            },
        ));
        assert_eq!(msg.title, "💬 New comment");
        assert_eq!(msg.body, "Aoi on \"Fix login\": done");
    }

    #[test]
    fn member_added_names_member_and_card() {
        let msg = format_notification(&base(
            "Aoi",
            Payload::MemberAdded {
                board: board(),
                card: card("Fix login"),
                member: Some(MemberRef {
                    full_name: "Ren".into(),
                }),
            },
        ));
        assert_eq!(msg.body, "Ren was added to \"Fix login\"");
    }

    #[test]
    fn created_card_mentions_list_when_present() {
        let msg = format_notification(&base(
            "Aoi",
            Payload::CardCreated {
                board: board(),
                card: card("Ship it"),
                list: Some(ListRef {
                    id: "l1".into(),
                    name: "Todo".into(),
                }),
            },
        ));
        assert_eq!(msg.body, "Aoi created \"Ship it\" in Todo");

        let msg = format_notification(&base(
            "Aoi",
            Payload::CardCreated {
                board: board(),
                card: card("Ship it"),
                list: None,
            },
        ));
        assert_eq!(msg.body, "Aoi created \"Ship it\"");
    }

    #[test]
    fn moved_card_shows_both_lists() {
        let msg = format_notification(&base(
            "Ren",
            Payload::CardUpdated {
                board: board(),
                card: card("Ship it"),
                list_before: Some(ListRef {
                    id: "l1".into(),
                    name: "Doing".into(),
                }),
                list_after: Some(ListRef {
                    id: "l2".into(),
                    name: "Done".into(),
                }),
            },
        ));
        assert_eq!(msg.title, "📋 Card moved");
        assert_eq!(msg.body, "\"Ship it\" moved from Doing to Done");
    }

    #[test]
    fn archived_card_takes_priority_over_generic_update() {
        let msg = format_notification(&base(
            "Ren",
            Payload::CardUpdated {
                board: board(),
                card: Some(CardRef {
                    id: "c1".into(),
                    name: "Old task".into(),
                    closed: true,
                }),
                list_before: None,
                list_after: None,
            },
        ));
        assert_eq!(msg.title, "🗑 Card archived");
    }

    #[test]
    fn generic_update_fallback() {
        let msg = format_notification(&base(
            "Ren",
            Payload::CardUpdated {
                board: board(),
                card: card("Ship it"),
                list_before: None,
                list_after: None,
            },
        ));
        assert_eq!(msg.title, "✏️ Card updated");
        assert_eq!(msg.body, "\"Ship it\" was updated by Ren");
    }

    #[test]
    fn unknown_type_names_actor_and_raw_tag() {
        let msg = format_notification(&base(
            "Yui",
            Payload::Other {
                kind: "makeAdminOfBoard".into(),
                board: board(),
            },
        ));
        assert_eq!(msg.body, "Yui: makeAdminOfBoard");
    }

    #[test]
    fn missing_fields_render_as_unknown() {
        let msg = format_notification(&base(
            "",
            Payload::CommentAdded {
                board: None,
                card: None,
                text: "hi".into(),
            },
        ));
        assert_eq!(msg.body, "unknown on \"unknown\": hi");

        let msg = format_notification(&base(
            "Aoi",
            Payload::MemberAdded {
                board: None,
                card: card("X"),
                member: None,
            },
        ));
        assert_eq!(msg.body, "unknown was added to \"X\"");
    }
}
