//! `ParleyServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{State, WebSocketUpgrade};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::directory::Directory;
use crate::error::ServerError;
use crate::health::HealthResponse;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::run_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Room registry.
    pub directory: Arc<Directory>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
}

/// The relay server: directory, shutdown coordination, and HTTP surface.
pub struct ParleyServer {
    config: Arc<ServerConfig>,
    directory: Arc<Directory>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl ParleyServer {
    /// Create a server. The default room's loop starts here, strictly
    /// before the listener accepts anything.
    pub fn new(config: ServerConfig) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let directory = Arc::new(Directory::new(&config.default_room, shutdown.token()));
        Self {
            config: Arc::new(config),
            directory,
            shutdown,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            directory: Arc::clone(&self.directory),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler));

        if let Some(dir) = &self.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        router.layer(TraceLayer::new_for_http()).with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// The serving task is tracked by the shutdown coordinator; cancel
    /// and await it through [`ShutdownCoordinator::drain`].
    pub async fn listen(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;
        let local_addr = listener.local_addr()?;

        let app = self.router();
        let token = self.shutdown.token();
        self.shutdown.track(tokio::spawn(async move {
            let shutdown = async move { token.cancelled().await };
            if let Err(error) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
                error!(%error, "server task failed");
            }
        }));

        info!(addr = %local_addr, "listening");
        Ok(local_addr)
    }

    /// Get the room directory.
    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::gather(state.start_time, &state.directory))
}

/// GET /ws — WebSocket upgrade.
async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    if !origin_allowed(origin, state.config.public_url.as_deref()) {
        warn!(origin = origin.unwrap_or("<none>"), "websocket upgrade rejected: origin not allowed");
        return StatusCode::FORBIDDEN.into_response();
    }

    let connection_id = Uuid::now_v7().simple().to_string();
    let max_message_size = state.config.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| {
            run_session(socket, connection_id, state.directory, state.config)
        })
        .into_response()
}

/// Evaluate the one-time origin check for an upgrade request.
///
/// Allowed when no public URL is configured, when the request carries no
/// Origin header (non-browser client), or when the origin's host matches
/// the configured public host. A leading `www.` is ignored on both sides.
fn origin_allowed(origin: Option<&str>, public_url: Option<&str>) -> bool {
    let Some(public_url) = public_url else {
        return true;
    };
    let Some(origin) = origin else {
        return true;
    };
    match (host_of(origin), host_of(public_url)) {
        (Some(origin_host), Some(public_host)) => origin_host == public_host,
        _ => false,
    }
}

/// Extract the lowercased host of a URL, with any `www.` prefix stripped.
fn host_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let host = uri.host()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
