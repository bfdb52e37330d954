//! Client for the game server's admin HTTP API.
//!
//! JSON over HTTP.  Login sets a session cookie, so the underlying
//! `reqwest::Client` keeps a cookie store and every later call is
//! authenticated by it.
//!
//! Any non-2xx response becomes [`AdminApiError::Server`] carrying the
//! body's `message` field, or `"Request failed."` when there is none.

use reqwest::{Client, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use big2_core::domain::toast::Severity;

/// Fallback error text when the server gives none.
pub const DEFAULT_ERROR_MESSAGE: &str = "Request failed.";

/// Reason sent with every admin room close.
pub const CLOSE_ROOM_REASON: &str = "Room closed by admin for maintenance.";

/// Announcement lifetime when none is given.
pub const DEFAULT_ANNOUNCEMENT_DURATION_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid admin API URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with an error status.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminRoomPlayer {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRoom {
    pub name: String,
    #[serde(default)]
    pub player_count: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub players: Vec<AdminRoomPlayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPlayer {
    pub name: String,
    #[serde(default)]
    pub socket_id: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default, rename = "isAI")]
    pub is_ai: bool,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl AdminPlayer {
    /// "Human" or "AI (<difficulty>)".
    pub fn kind_label(&self) -> String {
        if self.is_ai {
            format!("AI ({})", self.difficulty.as_deref().unwrap_or("standard"))
        } else {
            "Human".to_string()
        }
    }
}

/// Server-side AI model settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub llm_model: String,
    #[serde(default)]
    pub default_llm_model: String,
    #[serde(default)]
    pub has_open_router_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub message: String,
    #[serde(rename = "type", default)]
    pub severity: Severity,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default)]
    pub expires_at: Option<u64>,
}

/// Body of `POST /admin/api/announcement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub message: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub duration_ms: u64,
}

impl NewAnnouncement {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self { message: message.into(), severity, duration_ms: DEFAULT_ANNOUNCEMENT_DURATION_MS }
    }
}

#[derive(Deserialize)]
struct SessionBody {
    #[serde(default)]
    authenticated: bool,
}

#[derive(Deserialize)]
struct RoomsBody {
    #[serde(default)]
    rooms: Vec<AdminRoom>,
}

#[derive(Deserialize)]
struct PlayersBody {
    #[serde(default)]
    players: Vec<AdminPlayer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelBody {
    llm_model: String,
}

#[derive(Deserialize)]
struct AnnouncementBody {
    #[serde(default)]
    announcement: Option<Announcement>,
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct AdminApi {
    client: Client,
    base_url: String,
}

impl AdminApi {
    /// # Errors
    ///
    /// Returns [`AdminApiError::Url`] for an unparsable base URL and
    /// [`AdminApiError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, AdminApiError> {
        Url::parse(base_url)?;
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the current cookie belongs to a logged-in admin.
    pub async fn session(&self) -> Result<bool, AdminApiError> {
        let body: SessionBody = self.request(Method::GET, "/admin/api/session", None).await?;
        Ok(body.authenticated)
    }

    pub async fn login(&self, password: &str) -> Result<(), AdminApiError> {
        let _: IgnoredAny = self
            .request(Method::POST, "/admin/api/login", Some(json!({ "password": password })))
            .await?;
        info!("admin login succeeded");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AdminApiError> {
        let _: IgnoredAny = self.request(Method::POST, "/admin/api/logout", None).await?;
        Ok(())
    }

    pub async fn rooms(&self) -> Result<Vec<AdminRoom>, AdminApiError> {
        let body: RoomsBody = self.request(Method::GET, "/admin/api/rooms", None).await?;
        Ok(body.rooms)
    }

    pub async fn players(&self) -> Result<Vec<AdminPlayer>, AdminApiError> {
        let body: PlayersBody = self.request(Method::GET, "/admin/api/players", None).await?;
        Ok(body.players)
    }

    /// Closes a room, kicking everyone in it.
    pub async fn close_room(&self, room_name: &str) -> Result<(), AdminApiError> {
        let body = json!({ "roomName": room_name, "reason": CLOSE_ROOM_REASON });
        let _: IgnoredAny = self.request(Method::POST, "/admin/api/rooms/close", Some(body)).await?;
        info!(room = room_name, "room closed");
        Ok(())
    }

    pub async fn ai_settings(&self) -> Result<AiSettings, AdminApiError> {
        self.request(Method::GET, "/admin/api/ai", None).await
    }

    /// Switches the AI model.  Returns the model now in effect.
    pub async fn set_ai_model(&self, model: &str) -> Result<String, AdminApiError> {
        let body: ModelBody = self
            .request(Method::POST, "/admin/api/ai/model", Some(json!({ "model": model })))
            .await?;
        Ok(body.llm_model)
    }

    pub async fn announcement(&self) -> Result<Option<Announcement>, AdminApiError> {
        let body: AnnouncementBody = self.request(Method::GET, "/admin/api/announcement", None).await?;
        Ok(body.announcement)
    }

    pub async fn publish_announcement(
        &self,
        announcement: &NewAnnouncement,
    ) -> Result<Option<Announcement>, AdminApiError> {
        let body = serde_json::to_value(announcement)?;
        let body: AnnouncementBody = self
            .request(Method::POST, "/admin/api/announcement", Some(body))
            .await?;
        Ok(body.announcement)
    }

    pub async fn clear_announcement(&self) -> Result<(), AdminApiError> {
        let _: IgnoredAny = self.request(Method::DELETE, "/admin/api/announcement", None).await?;
        Ok(())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, AdminApiError> {
        let url = Url::parse(&format!("{}{path}", self.base_url))?;
        debug!(%method, %url, "admin request");

        let mut request = self.client.request(method, url);
        request = match body {
            Some(body) => request.json(&body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(AdminApiError::Server { status: status.as_u16(), message: error_message(&payload) });
        }
        Ok(serde_json::from_value(payload)?)
    }
}

/// The `message` of an error body, or the generic fallback.
pub fn error_message(payload: &Value) -> String {
    payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
        .to_string()
}
