//! Trello REST API client using raw reqwest (no framework).
//!
//! Auth is the key+token query-parameter scheme. The notification feed is the
//! relay pipeline's only input; the board/list/card calls back the interactive
//! commands. Base URL is injectable so tests can point the client elsewhere.

use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::bail;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::boards::BoardDirectory;
use crate::notification::{BoardRef, Notification};

const API_BASE_URL: &str = "https://api.trello.com/1";

/// A board as returned by the boards endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

impl Board {
    pub fn to_ref(&self) -> BoardRef {
        BoardRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// A list on a board.
#[derive(Debug, Clone, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

/// A card.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
}

/// Trello API client. One instance is shared by reference and reuses its
/// connection pool across polls.
pub struct TrelloClient {
    base_url: String,
    api_key: String,
    api_token: String,
    client: reqwest::Client,
}

impl TrelloClient {
    pub fn new(api_key: String, api_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: API_BASE_URL.to_owned(),
            api_key,
            api_token,
            client,
        }
    }

    /// Point the client at a different base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", self.api_token.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            bail!("Trello API returned {status} for {path}: {body}");
        }

        Ok(response.json().await?)
    }

    /// Fetch the newest notifications for the authenticated member,
    /// newest first. May return fewer than `limit`, or none.
    pub async fn recent_notifications(&self, limit: u32) -> Result<Vec<Notification>> {
        self.get_json(
            "/members/me/notifications",
            &[
                ("limit", &limit.to_string()),
                ("filter", "all"),
                ("read_filter", "unread"),
                ("memberCreator", "true"),
                ("memberCreator_fields", "fullName,avatarUrl"),
                ("board", "true"),
                ("board_fields", "name"),
                ("card", "true"),
                ("card_fields", "name,closed"),
                ("list", "true"),
            ],
        )
        .await
    }

    /// All boards the member can access, excluding archived ones.
    pub async fn member_boards(&self) -> Result<Vec<Board>> {
        let boards: Vec<Board> = self
            .get_json("/members/me/boards", &[("fields", "name,url,desc,closed")])
            .await?;
        Ok(boards.into_iter().filter(|b| !b.closed).collect())
    }

    /// Look up one board. `Ok(None)` when the id is unknown or malformed;
    /// `Err` only for transport failures and server-side errors.
    pub async fn board(&self, board_id: &str) -> Result<Option<Board>> {
        let url = format!("{}/boards/{board_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", self.api_token.as_str()),
                ("fields", "name,url,desc,closed"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            return Ok(None);
        }
        if !status.is_success() {
            bail!("Trello API returned {status} for /boards/{board_id}");
        }
        Ok(Some(response.json().await?))
    }

    /// Open lists on a board.
    pub async fn board_lists(&self, board_id: &str) -> Result<Vec<List>> {
        let lists: Vec<List> = self
            .get_json(
                &format!("/boards/{board_id}/lists"),
                &[("fields", "name,closed")],
            )
            .await?;
        Ok(lists.into_iter().filter(|l| !l.closed).collect())
    }

    /// Cards in a list.
    pub async fn list_cards(&self, list_id: &str) -> Result<Vec<Card>> {
        self.get_json(
            &format!("/lists/{list_id}/cards"),
            &[("fields", "name,desc,url,due")],
        )
        .await
    }

    /// Create a card in a list and return it.
    pub async fn create_card(&self, list_id: &str, name: &str, desc: &str) -> Result<Card> {
        let url = format!("{}/cards", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("token", self.api_token.as_str()),
            ])
            .json(&serde_json::json!({
                "idList": list_id,
                "name": name,
                "desc": desc,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            bail!("Trello API returned {status} creating card in list {list_id}");
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BoardDirectory for TrelloClient {
    async fn board(&self, id: &str) -> Result<Option<BoardRef>> {
        Ok(TrelloClient::board(self, id).await?.map(|b| b.to_ref()))
    }

    async fn boards(&self) -> Result<Vec<BoardRef>> {
        Ok(self
            .member_boards()
            .await?
            .iter()
            .map(Board::to_ref)
            .collect())
    }
}
