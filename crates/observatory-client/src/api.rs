//! Typed wrapper over the Observatory HTTP API.
//!
//! One method per endpoint. Methods make a single attempt; retrying is
//! left to callers ([`EventFeed`](crate::feed::EventFeed),
//! [`StatsPoller`](crate::poller::StatsPoller)) so that authentication
//! calls are never repeated.

use std::time::Duration;

use observatory_core::dashboard::DashboardSnapshot;
use observatory_core::pagination::EventPage;
use observatory_core::refresh::RefreshStatus;
use observatory_core::share::{CardKind, ShareCard};
use observatory_core::tension::TensionReading;
use observatory_types::{
    Agent, AgentId, AgentStatus, Artifact, Briefing, Era, Event, EventType, LeaderboardEntry,
    Mood, Quote, SimplifyTextRequest, SimplifyTextResponse, VerifyPasswordRequest,
    VerifyPasswordResponse, World, WorldId,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClientError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    /// Always `ok` when the server answers.
    pub status: String,
    /// Data source kind.
    pub source: String,
    /// `ok` or `unreachable`.
    pub database: String,
    /// RFC 3339 time of the last successful refresh.
    pub last_refresh: Option<String>,
}

/// Body of `GET /api/worlds`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldList {
    /// Number of worlds.
    pub count: usize,
    /// World the dashboard should open on.
    pub default_world_id: Option<WorldId>,
    /// Worlds, newest first.
    pub worlds: Vec<World>,
}

/// Body of `GET /api/worlds/:id/share/:kind`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SharedCard {
    /// Structured card.
    pub card: ShareCard,
    /// Plain-text rendering.
    pub text: String,
}

/// Body of `GET /api/admin/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminStatus {
    /// Refresher state.
    pub refresh: RefreshStatus,
    /// Data source kind.
    pub source: String,
    /// Worlds with a cached dashboard.
    pub cached_worlds: usize,
    /// Outstanding admin tokens.
    pub active_sessions: usize,
    /// Whether simplify-text can reach an API.
    pub simplifier_configured: bool,
}

/// Acknowledgement from an admin control endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminAck {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable message.
    pub message: String,
}

/// Parameters for one event page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Cursor from the previous page.
    pub cursor: Option<String>,
    /// Page size; the server defaults to 20.
    pub limit: Option<u32>,
    /// Restrict to one event type.
    pub event_type: Option<EventType>,
}

/// HTTP client for the Observatory API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Client for the server at `base_url` with [`DEFAULT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the TLS backend fails to initialize.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    /// Server root URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    // ==================== Read API ====================

    /// `GET /api/health`
    pub async fn health(&self) -> Result<Health, ClientError> {
        send_json(self.http.get(self.url("/api/health"))).await
    }

    /// `GET /api/worlds`
    pub async fn worlds(&self) -> Result<WorldList, ClientError> {
        send_json(self.http.get(self.url("/api/worlds"))).await
    }

    /// `GET /api/worlds/:id`
    pub async fn world(&self, world_id: WorldId) -> Result<World, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}"));
        send_json(self.http.get(url)).await
    }

    /// `GET /api/worlds/:id/events`
    pub async fn events(
        &self,
        world_id: WorldId,
        query: &EventQuery,
    ) -> Result<EventPage, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(cursor) = &query.cursor {
            params.push(("cursor", cursor.clone()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(event_type) = query.event_type {
            params.push(("type", event_type.as_str().to_owned()));
        }
        let url = self.url(&format!("/api/worlds/{world_id}/events"));
        send_json(self.http.get(url).query(&params)).await
    }

    /// `GET /api/worlds/:id/agents`
    pub async fn agents(
        &self,
        world_id: WorldId,
        status: Option<AgentStatus>,
    ) -> Result<Vec<Agent>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/agents"));
        let mut request = self.http.get(url);
        if let Some(status) = status {
            request = request.query(&[("status", status.as_str())]);
        }
        send_field(request, "agents").await
    }

    /// `GET /api/worlds/:id/agents/:agent_id/events`
    pub async fn agent_events(
        &self,
        world_id: WorldId,
        agent_id: AgentId,
        limit: u32,
    ) -> Result<Vec<Event>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/agents/{agent_id}/events"));
        send_field(self.http.get(url).query(&[("limit", limit)]), "events")
            .await
    }

    /// `GET /api/worlds/:id/artifacts`
    pub async fn artifacts(&self, world_id: WorldId, limit: u32) -> Result<Vec<Artifact>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/artifacts"));
        send_field(self.http.get(url).query(&[("limit", limit)]), "artifacts")
            .await
    }

    /// `GET /api/worlds/:id/eras`
    pub async fn eras(&self, world_id: WorldId) -> Result<Vec<Era>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/eras"));
        send_field(self.http.get(url), "eras").await
    }

    /// `GET /api/worlds/:id/briefings`
    pub async fn briefings(&self, world_id: WorldId, limit: u32) -> Result<Vec<Briefing>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/briefings"));
        send_field(self.http.get(url).query(&[("limit", limit)]), "briefings")
            .await
    }

    /// `GET /api/worlds/:id/quotes`
    pub async fn quotes(&self, world_id: WorldId, limit: u32) -> Result<Vec<Quote>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/quotes"));
        send_field(self.http.get(url).query(&[("limit", limit)]), "quotes")
            .await
    }

    /// `GET /api/worlds/:id/mood`
    pub async fn mood(&self, world_id: WorldId) -> Result<Option<Mood>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/mood"));
        send_json(self.http.get(url)).await
    }

    /// `GET /api/worlds/:id/leaderboard`
    pub async fn leaderboard(
        &self,
        world_id: WorldId,
        category: Option<&str>,
    ) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/leaderboard"));
        let mut request = self.http.get(url);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        send_field(request, "entries").await
    }

    /// `GET /api/worlds/:id/dashboard`
    pub async fn dashboard(&self, world_id: WorldId) -> Result<DashboardSnapshot, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/dashboard"));
        send_json(self.http.get(url)).await
    }

    /// `GET /api/worlds/:id/tension`
    pub async fn tension(&self, world_id: WorldId) -> Result<TensionReading, ClientError> {
        let url = self.url(&format!("/api/worlds/{world_id}/tension"));
        send_json(self.http.get(url)).await
    }

    /// `GET /api/worlds/:id/share/:kind`
    pub async fn share_card(
        &self,
        world_id: WorldId,
        kind: CardKind,
        handle: Option<&str>,
        record_id: Option<Uuid>,
    ) -> Result<SharedCard, ClientError> {
        let kind = match kind {
            CardKind::Quote => "quote",
            CardKind::Era => "era",
            CardKind::Event => "event",
            CardKind::Tension => "tension",
        };
        let url = self.url(&format!("/api/worlds/{world_id}/share/{kind}"));
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(handle) = handle {
            params.push(("handle", handle.to_owned()));
        }
        if let Some(id) = record_id {
            params.push(("id", id.to_string()));
        }
        send_json(self.http.get(url).query(&params)).await
    }

    // ==================== Functions ====================

    /// `POST /functions/verify-admin-password`
    ///
    /// # Errors
    ///
    /// A rejected password is [`ClientError::Unauthorized`] carrying the
    /// server's message; a missing server password is
    /// [`ClientError::Server`].
    pub async fn verify_password(&self, password: &str) -> Result<VerifyPasswordResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/functions/verify-admin-password"))
            .json(&VerifyPasswordRequest {
                password: password.to_owned(),
            })
            .send()
            .await?;
        let status = response.status();
        let body: VerifyPasswordResponse = response.json().await?;
        if body.success {
            return Ok(body);
        }
        let message = body.error.unwrap_or_else(|| status.to_string());
        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// `POST /functions/simplify-text`
    pub async fn simplify(&self, request: &SimplifyTextRequest) -> Result<String, ClientError> {
        let request = self
            .http
            .post(self.url("/functions/simplify-text"))
            .json(request);
        let body: SimplifyTextResponse = send_json(request).await?;
        Ok(body.simplified)
    }

    // ==================== Admin API ====================

    /// `GET /api/admin/status`
    pub async fn admin_status(&self, token: &str) -> Result<AdminStatus, ClientError> {
        let request = self.http.get(self.url("/api/admin/status")).bearer_auth(token);
        send_json(request).await
    }

    /// `POST /api/admin/refresh`
    pub async fn admin_refresh(&self, token: &str) -> Result<AdminAck, ClientError> {
        self.admin_post(token, "/api/admin/refresh").await
    }

    /// `POST /api/admin/pause`
    pub async fn admin_pause(&self, token: &str) -> Result<AdminAck, ClientError> {
        self.admin_post(token, "/api/admin/pause").await
    }

    /// `POST /api/admin/resume`
    pub async fn admin_resume(&self, token: &str) -> Result<AdminAck, ClientError> {
        self.admin_post(token, "/api/admin/resume").await
    }

    /// `POST /api/admin/interval`
    pub async fn admin_set_interval(&self, token: &str, interval_ms: u64) -> Result<(), ClientError> {
        let request = self
            .http
            .post(self.url("/api/admin/interval"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "interval_ms": interval_ms }));
        let _: serde_json::Value = send_json(request).await?;
        Ok(())
    }

    /// `POST /api/admin/logout`
    pub async fn admin_logout(&self, token: &str) -> Result<AdminAck, ClientError> {
        self.admin_post(token, "/api/admin/logout").await
    }

    async fn admin_post(&self, token: &str, path: &str) -> Result<AdminAck, ClientError> {
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .header(header::CONTENT_LENGTH, 0);
        send_json(request).await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;
    handle_response(response).await
}

/// Send `request` and decode one field of a `{count, <key>: [...]}` body.
async fn send_field<T: DeserializeOwned>(request: RequestBuilder, key: &str) -> Result<T, ClientError> {
    let mut body: serde_json::Value = send_json(request).await?;
    let field = body
        .get_mut(key)
        .map(serde_json::Value::take)
        .unwrap_or_default();
    Ok(serde_json::from_value(field)?)
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or(raw);

    Err(match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        other => ClientError::Server {
            status: other.as_u16(),
            message,
        },
    })
}
