//! HTTP surface: room index, per-room calendars and a status endpoint.
//!
//! | route        | response                                        |
//! |--------------|-------------------------------------------------|
//! | `GET /`      | HTML index linking every document               |
//! | `GET /_status` | refresh health and snapshot summary as JSON   |
//! | `GET /{room}`  | the room's calendar document                  |

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use roomcal_core::CALENDAR_CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::cache::{RenderedDocument, SharedCache, Snapshot};
use crate::error::{ServerError, ServerResult};
use crate::refresh::{RefreshHealth, SharedHealth};
use crate::signals::ShutdownSignal;

/// Response for a room without a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownRoomPolicy {
    /// 404 Not Found.
    #[default]
    NotFound,
    /// 200 with an empty calendar body.
    #[serde(rename = "empty")]
    EmptyDocument,
}

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    cache: SharedCache,
    health: SharedHealth,
    unknown_room: UnknownRoomPolicy,
}

impl AppState {
    pub fn new(cache: SharedCache, health: SharedHealth, unknown_room: UnknownRoomPolicy) -> Self {
        Self {
            cache,
            health,
            unknown_room,
        }
    }
}

/// Path segment of the status endpoint; no room document can use it.
pub const STATUS_KEY: &str = "_status";

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(&format!("/{STATUS_KEY}"), get(status))
        .route("/{*room}", get(room_document))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves `app` on `listener` until `shutdown` fires.
pub async fn serve(listener: TcpListener, app: Router, shutdown: ShutdownSignal) -> ServerResult<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Binds the listen address.
pub async fn bind(addr: std::net::SocketAddr) -> ServerResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::bind(addr.to_string(), e))
}

/// GET / - links to every document of the current snapshot
async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.cache.snapshot().await;
    Html(render_index(&snapshot))
}

/// Renders the HTML room index, one link per document in key order.
pub fn render_index(snapshot: &Snapshot) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Rooms</title></head>\n<body>\n",
    );
    for room in snapshot.rooms() {
        html.push_str(&format!(
            "<a href=\"/{}\">{}</a><br/>\n",
            urlencoding::encode(room),
            html_escape(room)
        ));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// GET /{room} - the room's calendar
async fn room_document(State(state): State<AppState>, Path(room): Path<String>) -> Response {
    match state.cache.lookup(&room).await {
        Some(document) => calendar_response(&document),
        None => {
            debug!(room = %room, policy = ?state.unknown_room, "Unknown room");
            match state.unknown_room {
                UnknownRoomPolicy::NotFound => {
                    (StatusCode::NOT_FOUND, format!("unknown room: {room}\n")).into_response()
                }
                UnknownRoomPolicy::EmptyDocument => calendar_response(&RenderedDocument::default()),
            }
        }
    }
}

fn calendar_response(document: &RenderedDocument) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CALENDAR_CONTENT_TYPE.to_string()),
            (header::CONTENT_LENGTH, document.len().to_string()),
        ],
        Body::from(document.bytes()),
    )
        .into_response()
}

/// Summary of the published snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotSummary {
    pub generation: u64,
    pub generated_at: Option<DateTime<Utc>>,
    pub event_count: usize,
    pub rooms: Vec<String>,
}

/// Body of `GET /_status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// True once a snapshot has been published.
    pub ready: bool,
    pub refresh: RefreshHealth,
    pub snapshot: SnapshotSummary,
}

/// GET /_status - refresh health as JSON
async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    let snapshot: Arc<Snapshot> = state.cache.snapshot().await;
    let refresh = state.health.read().await.clone();

    Json(StatusReport {
        ready: snapshot.generation() > 0,
        refresh,
        snapshot: SnapshotSummary {
            generation: snapshot.generation(),
            generated_at: snapshot.generated_at(),
            event_count: snapshot.event_count(),
            rooms: snapshot.rooms().map(str::to_owned).collect(),
        },
    })
}
