//! Notification types — the Trello activity records the relay pipeline consumes.
//!
//! The wire shape is a loosely-typed `data` object whose fields depend on the
//! `type` tag. Deserialization goes through [`RawNotification`] (which mirrors
//! the wire) and converts into [`Notification`] with a [`Payload`] sum type,
//! so downstream code matches exhaustively instead of probing optional fields.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A board reference as it appears inside notification data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoardRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A card reference. `closed` is set when the card has been archived.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CardRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

/// A list reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A member reference (the person added to a card, not the actor).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    #[serde(default)]
    pub full_name: String,
}

/// Who triggered the notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Typed notification payload, one variant per wire `type` tag.
#[derive(Debug, Clone)]
pub enum Payload {
    /// `commentCard` — someone commented on a card.
    CommentAdded {
        board: Option<BoardRef>,
        card: Option<CardRef>,
        text: String,
    },
    /// `addedToCard` — a member was added to a card.
    MemberAdded {
        board: Option<BoardRef>,
        card: Option<CardRef>,
        member: Option<MemberRef>,
    },
    /// `createCard` — a card was created (optionally in a known list).
    CardCreated {
        board: Option<BoardRef>,
        card: Option<CardRef>,
        list: Option<ListRef>,
    },
    /// `updateCard` — moved between lists, archived, or a generic edit.
    CardUpdated {
        board: Option<BoardRef>,
        card: Option<CardRef>,
        list_before: Option<ListRef>,
        list_after: Option<ListRef>,
    },
    /// Any other type tag — kept so the formatter can name it.
    Other {
        kind: String,
        board: Option<BoardRef>,
    },
}

/// One activity record, newest-first within a poll response.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawNotification")]
pub struct Notification {
    /// Opaque id — compared only for equality, never ordered.
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub actor: Actor,
    pub payload: Payload,
}

impl Notification {
    /// The board this notification belongs to, if any.
    pub fn board_id(&self) -> Option<&str> {
        let board = match &self.payload {
            Payload::CommentAdded { board, .. }
            | Payload::MemberAdded { board, .. }
            | Payload::CardCreated { board, .. }
            | Payload::CardUpdated { board, .. }
            | Payload::Other { board, .. } => board,
        };
        board.as_ref().map(|b| b.id.as_str())
    }
}

// --- Wire format ---

/// Raw notification exactly as the API returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNotification {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    date: DateTime<Utc>,
    #[serde(default)]
    member_creator: Actor,
    #[serde(default)]
    data: RawData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawData {
    board: Option<BoardRef>,
    card: Option<CardRef>,
    list: Option<ListRef>,
    list_before: Option<ListRef>,
    list_after: Option<ListRef>,
    member: Option<MemberRef>,
    text: Option<String>,
}

impl From<RawNotification> for Notification {
    fn from(raw: RawNotification) -> Self {
        let data = raw.data;
        let payload = match raw.kind.as_str() {
            "commentCard" => Payload::CommentAdded {
                board: data.board,
                card: data.card,
                text: data.text.unwrap_or_default(),
            },
            "addedToCard" => Payload::MemberAdded {
                board: data.board,
                card: data.card,
                member: data.member,
            },
            "createCard" => Payload::CardCreated {
                board: data.board,
                card: data.card,
                list: data.list,
            },
            "updateCard" => Payload::CardUpdated {
                board: data.board,
                card: data.card,
                list_before: data.list_before,
                list_after: data.list_after,
            },
            _ => Payload::Other {
                kind: raw.kind,
                board: data.board,
            },
        };

        Self {
            id: raw.id,
            occurred_at: raw.date,
            actor: raw.member_creator,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_comment() {
        let json = r#"{
            "id": "n1",
            "type": "commentCard",
            "date": "2025-01-15T10:00:00.000Z",
            "memberCreator": {"fullName": "Aoi", "avatarUrl": "https://example/a.png"},
            "data": {
                "board": {"id": "b1", "name": "Sprint"},
                "card": {"id": "c1", "name": "Fix login"},
                "text": "done, please review"
            }
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.id, "n1");
        assert_eq!(n.actor.full_name, "Aoi");
        assert_eq!(n.board_id(), Some("b1"));
        match n.payload {
            Payload::CommentAdded { text, card, .. } => {
                assert_eq!(text, "done, please review");
                assert_eq!(card.unwrap().name, "Fix login");
            }
            other => panic!("expected CommentAdded, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_card_moved() {
        let json = r#"{
            "id": "n2",
            "type": "updateCard",
            "date": "2025-01-15T10:05:00.000Z",
            "memberCreator": {"fullName": "Ren"},
            "data": {
                "board": {"id": "b1", "name": "Sprint"},
                "card": {"id": "c2", "name": "Ship it"},
                "listBefore": {"id": "l1", "name": "Doing"},
                "listAfter": {"id": "l2", "name": "Done"}
            }
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        match n.payload {
            Payload::CardUpdated {
                list_before,
                list_after,
                ..
            } => {
                assert_eq!(list_before.unwrap().name, "Doing");
                assert_eq!(list_after.unwrap().name, "Done");
            }
            other => panic!("expected CardUpdated, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_archived_card() {
        let json = r#"{
            "id": "n3",
            "type": "updateCard",
            "date": "2025-01-15T10:06:00.000Z",
            "memberCreator": {"fullName": "Ren"},
            "data": {
                "card": {"id": "c3", "name": "Old task", "closed": true}
            }
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.board_id(), None);
        match n.payload {
            Payload::CardUpdated { card, .. } => assert!(card.unwrap().closed),
            other => panic!("expected CardUpdated, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_becomes_other() {
        let json = r#"{
            "id": "n4",
            "type": "makeAdminOfBoard",
            "date": "2025-01-15T10:07:00.000Z",
            "memberCreator": {"fullName": "Yui"},
            "data": {"board": {"id": "b9", "name": "Ops"}}
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        match n.payload {
            Payload::Other { kind, board } => {
                assert_eq!(kind, "makeAdminOfBoard");
                assert_eq!(board.unwrap().id, "b9");
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn missing_optional_fields_default() {
        // Minimal record: no memberCreator, no data.
        let json = r#"{"id": "n5", "type": "commentCard", "date": "2025-01-15T10:08:00.000Z"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.actor.full_name, "");
        assert!(n.board_id().is_none());
        match n.payload {
            Payload::CommentAdded { text, .. } => assert!(text.is_empty()),
            other => panic!("expected CommentAdded, got {other:?}"),
        }
    }
}
