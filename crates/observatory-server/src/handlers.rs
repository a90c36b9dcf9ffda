//! REST API endpoint handlers for the Observatory server.
//!
//! Record endpoints query the [`DataSource`](observatory_db::DataSource)
//! directly; `dashboard` serves the refresher's cache. Everything is
//! read-only.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/health` | Liveness and last refresh time |
//! | `GET` | `/api/worlds` | List worlds |
//! | `GET` | `/api/worlds/:id` | Single world |
//! | `GET` | `/api/worlds/:id/events` | Cursor-paged events (`cursor`, `limit`, `type`) |
//! | `GET` | `/api/worlds/:id/agents` | Agents (`status`) |
//! | `GET` | `/api/worlds/:id/agents/:agent_id/events` | One agent's recent events |
//! | `GET` | `/api/worlds/:id/artifacts` | Artifacts (`limit`) |
//! | `GET` | `/api/worlds/:id/eras` | Eras |
//! | `GET` | `/api/worlds/:id/briefings` | Briefings (`limit`) |
//! | `GET` | `/api/worlds/:id/quotes` | Quotes (`limit`) |
//! | `GET` | `/api/worlds/:id/mood` | Latest mood or `null` |
//! | `GET` | `/api/worlds/:id/leaderboard` | Leaderboard (`category`) |
//! | `GET` | `/api/worlds/:id/dashboard` | Cached dashboard snapshot |
//! | `GET` | `/api/worlds/:id/tension` | Live tension reading |
//! | `GET` | `/api/worlds/:id/share/:kind` | Share card (`handle`, `id`) |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use observatory_core::dashboard::DashboardSnapshot;
use observatory_core::pagination::{Cursor, MAX_PAGE_SIZE, clamp_limit};
use observatory_core::share::{CardBuilder, CardKind};
use observatory_core::tension::{TENSION_WINDOW, score_events};
use observatory_types::{AgentId, AgentStatus, EventId, EventType, QuoteId, World, WorldId};
use uuid::Uuid;

use crate::error::ObserverError;
use crate::refresher::fetch_inputs;
use crate::state::AppState;

/// Default row count for list endpoints that take a `limit`.
const DEFAULT_LIST_LIMIT: u32 = 10;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/worlds/:id/events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Opaque cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size (default 20, max 100).
    pub limit: Option<u32>,
    /// Restrict to one event type.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// Query parameters for `GET /api/worlds/:id/agents`.
#[derive(Debug, serde::Deserialize)]
pub struct AgentsQuery {
    /// `alive`, `dead`, or `all` (default).
    pub status: Option<String>,
}

/// Query parameters for endpoints that only take a `limit`.
#[derive(Debug, serde::Deserialize)]
pub struct LimitQuery {
    /// Maximum rows to return.
    pub limit: Option<u32>,
}

/// Query parameters for `GET /api/worlds/:id/leaderboard`.
#[derive(Debug, serde::Deserialize)]
pub struct LeaderboardQuery {
    /// Restrict to one category.
    pub category: Option<String>,
}

/// Query parameters for `GET /api/worlds/:id/share/:kind`.
#[derive(Debug, serde::Deserialize)]
pub struct ShareQuery {
    /// Social handle to credit, with or without a leading `@`.
    pub handle: Option<String>,
    /// Specific quote, era, or event to share. Defaults to the latest.
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page listing cached worlds and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rows: String = state
        .dashboards
        .read()
        .await
        .values()
        .map(|d| {
            format!(
                r#"<tr><td><a href="/api/worlds/{id}/dashboard">{name}</a></td><td>{turn}</td><td>{pop}</td><td>{tension}</td></tr>"#,
                id = d.world.id,
                name = escape_html(&d.world.name),
                turn = d.stats.current_turn,
                pop = d.stats.population,
                tension = d.tension.level.label(),
            )
        })
        .collect();
    let status = state.refresh.status().await;
    let refresher = if status.paused { "PAUSED" } else { "RUNNING" };
    let last_refresh = status.last_refresh.unwrap_or_else(|| "never".to_owned());

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Observatory</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border-bottom: 1px solid #30363d; padding: 0.4rem; text-align: left; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Observatory</h1>
    <p class="subtitle">Read-only dashboard API</p>

    <p>Refresher: <span class="status">{refresher}</span> (last refresh: {last_refresh})</p>

    <table>
        <tr><th>World</th><th>Turn</th><th>Population</th><th>Tension</th></tr>
        {rows}
    </table>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/health">/api/health</a> -- Liveness</li>
        <li><a href="/api/worlds">/api/worlds</a> -- List worlds</li>
        <li>/api/worlds/:id/events -- Paged events (?cursor=&amp;limit=&amp;type=)</li>
        <li>/api/worlds/:id/dashboard -- Cached dashboard</li>
        <li>/api/worlds/:id/tension -- Tension reading</li>
        <li>/api/worlds/:id/share/:kind -- Share card (quote, era, event, tension)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

/// Report liveness, data source reachability, and the last refresh time.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = match state.source.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check ping failed");
            "unreachable"
        }
    };
    let last_refresh = state.refresh.last_refresh().await.map(|t| t.to_rfc3339());

    Json(serde_json::json!({
        "status": "ok",
        "source": state.source.kind(),
        "database": database,
        "last_refresh": last_refresh,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/worlds
// ---------------------------------------------------------------------------

/// List every world, newest first, plus the world the dashboard should
/// open on.
pub async fn list_worlds(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let worlds = state.source.worlds().await?;
    let default_world_id = state
        .default_world_id
        .or_else(|| worlds.first().map(|w| w.id));

    Ok(Json(serde_json::json!({
        "count": worlds.len(),
        "default_world_id": default_world_id,
        "worlds": worlds,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id
// ---------------------------------------------------------------------------

/// Return a single world.
pub async fn get_world(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let world = require_world(&state, &id_str).await?;
    Ok(Json(world))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/events
// ---------------------------------------------------------------------------

/// Return one page of events, newest first.
///
/// # Query Parameters
///
/// - `cursor`: `next_cursor` from the previous page
/// - `limit`: page size, clamped to `1..=100` (default 20)
/// - `type`: event type tag
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let cursor = params
        .cursor
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(Cursor::decode)
        .transpose()
        .map_err(|e| ObserverError::InvalidQuery(e.to_string()))?;
    let event_type = params
        .event_type
        .as_deref()
        .map(str::parse::<EventType>)
        .transpose()
        .map_err(|e| ObserverError::InvalidQuery(e.to_string()))?;
    let limit = clamp_limit(params.limit);

    let page = state
        .source
        .event_page(world_id, cursor, limit, event_type)
        .await?;
    tracing::debug!(%world_id, count = page.events.len(), has_more = page.has_more, "served event page");
    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/agents
// ---------------------------------------------------------------------------

/// List agents, optionally filtered by status.
///
/// # Query Parameters
///
/// - `status`: `alive` | `dead` | `all` (default: `all`)
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<AgentsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let status = match params.status.as_deref() {
        None | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<AgentStatus>()
                .map_err(|e| ObserverError::InvalidQuery(e.to_string()))?,
        ),
    };

    let agents = state.source.agents(world_id, status).await?;
    Ok(Json(serde_json::json!({
        "count": agents.len(),
        "agents": agents,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/agents/:agent_id/events
// ---------------------------------------------------------------------------

/// Return the most recent events involving one agent.
pub async fn list_agent_events(
    State(state): State<Arc<AppState>>,
    Path((id_str, agent_str)): Path<(String, String)>,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let agent_id = AgentId::from(parse_uuid(&agent_str)?);
    let limit = clamp_limit(params.limit);

    let events = state.source.agent_events(world_id, agent_id, limit).await?;
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/artifacts
// ---------------------------------------------------------------------------

/// List the most recent artifacts.
pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let artifacts = state
        .source
        .artifacts(world_id, list_limit(params.limit))
        .await?;
    Ok(Json(serde_json::json!({
        "count": artifacts.len(),
        "artifacts": artifacts,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/eras
// ---------------------------------------------------------------------------

/// List every era, latest first.
pub async fn list_eras(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let eras = state.source.eras(world_id).await?;
    Ok(Json(serde_json::json!({
        "count": eras.len(),
        "eras": eras,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/briefings
// ---------------------------------------------------------------------------

/// List the most recent briefings (default 10).
pub async fn list_briefings(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let briefings = state
        .source
        .briefings(world_id, list_limit(params.limit))
        .await?;
    Ok(Json(serde_json::json!({
        "count": briefings.len(),
        "briefings": briefings,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/quotes
// ---------------------------------------------------------------------------

/// List the most recent quotes (default 10).
pub async fn list_quotes(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<LimitQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let quotes = state
        .source
        .quotes(world_id, list_limit(params.limit))
        .await?;
    Ok(Json(serde_json::json!({
        "count": quotes.len(),
        "quotes": quotes,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/mood
// ---------------------------------------------------------------------------

/// Return the latest mood reading, or `null` if none was recorded.
pub async fn get_mood(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let mood = state.source.latest_mood(world_id).await?;
    Ok(Json(mood))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/leaderboard
// ---------------------------------------------------------------------------

/// Return leaderboard rows ordered by category then rank.
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let entries = state
        .source
        .leaderboard(world_id, params.category.as_deref())
        .await?;
    Ok(Json(serde_json::json!({
        "count": entries.len(),
        "entries": entries,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/dashboard
// ---------------------------------------------------------------------------

/// Return the cached dashboard.
///
/// A world created since the last refresh is built on demand (and not
/// cached) so the first visit never sees a 404.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    if let Some(snapshot) = state.dashboard(world_id).await {
        return Ok(Json(snapshot));
    }

    let world = require_world(&state, &id_str).await?;
    let inputs = fetch_inputs(&state.source, world).await?;
    Ok(Json(DashboardSnapshot::assemble(inputs, chrono::Utc::now())))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/tension
// ---------------------------------------------------------------------------

/// Score the most recent events.
pub async fn get_tension(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let world_id = parse_world_id(&id_str)?;
    let window = u32::try_from(TENSION_WINDOW).unwrap_or(u32::MAX);
    let events = state.source.recent_events(world_id, window).await?;
    Ok(Json(score_events(&events)))
}

// ---------------------------------------------------------------------------
// GET /api/worlds/:id/share/:kind
// ---------------------------------------------------------------------------

/// Build a share card.
///
/// # Query Parameters
///
/// - `handle`: social handle to credit (1-15 of `[A-Za-z0-9_]`, optional `@`)
/// - `id`: the quote, era, or event to share; `event` requires it
pub async fn get_share_card(
    State(state): State<Arc<AppState>>,
    Path((id_str, kind_str)): Path<(String, String)>,
    Query(params): Query<ShareQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let kind = parse_card_kind(&kind_str)?;
    let world = require_world(&state, &id_str).await?;
    let record_id = params.id.as_deref().map(parse_uuid).transpose()?;

    let builder = CardBuilder::new(&world, &state.public_url)
        .credit(params.handle.as_deref())
        .map_err(|e| ObserverError::InvalidQuery(format!("handle: {e}")))?;

    let card = match kind {
        CardKind::Quote => {
            let quote = match record_id {
                Some(id) => state.source.quote(world.id, QuoteId::from(id)).await?,
                None => state.source.quotes(world.id, 1).await?.into_iter().next(),
            }
            .ok_or_else(|| ObserverError::NotFound("quote".to_owned()))?;
            builder.quote(&quote)
        }
        CardKind::Era => {
            let eras = state.source.eras(world.id).await?;
            let era = match record_id {
                Some(id) => eras.iter().find(|e| e.id.into_inner() == id),
                None => eras.iter().find(|e| e.is_current()).or_else(|| eras.first()),
            }
            .ok_or_else(|| ObserverError::NotFound("era".to_owned()))?;
            builder.era(era)
        }
        CardKind::Event => {
            let id = record_id.ok_or_else(|| {
                ObserverError::InvalidQuery("event cards require an id".to_owned())
            })?;
            let event = state
                .source
                .event(world.id, EventId::from(id))
                .await?
                .ok_or_else(|| ObserverError::NotFound(format!("event {id}")))?;
            builder.event(&event)
        }
        CardKind::Tension => {
            let window = u32::try_from(TENSION_WINDOW).unwrap_or(u32::MAX);
            let events = state.source.recent_events(world.id, window).await?;
            builder.tension(&score_events(&events))
        }
    };

    let text = card.to_text();
    Ok(Json(serde_json::json!({
        "card": card,
        "text": text,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID from a string, returning an [`ObserverError`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}

fn parse_world_id(s: &str) -> Result<WorldId, ObserverError> {
    parse_uuid(s).map(WorldId::from)
}

fn parse_card_kind(s: &str) -> Result<CardKind, ObserverError> {
    match s {
        "quote" => Ok(CardKind::Quote),
        "era" => Ok(CardKind::Era),
        "event" => Ok(CardKind::Event),
        "tension" => Ok(CardKind::Tension),
        other => Err(ObserverError::NotFound(format!("share card kind {other}"))),
    }
}

async fn require_world(state: &AppState, id_str: &str) -> Result<World, ObserverError> {
    let world_id = parse_world_id(id_str)?;
    state
        .source
        .world(world_id)
        .await?
        .ok_or_else(|| ObserverError::NotFound(format!("world {world_id}")))
}

fn list_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_PAGE_SIZE)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
