use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::actions::Control;
use crate::actions::ServiceCommand;
use crate::card::Card;
use crate::engine::PrinterDescriptor;
use crate::engine::Selection;
use crate::engine::StatusSnapshot;
use crate::host::Host;
use crate::host::HostError;
use crate::host::StateSource;
use crate::view::CardView;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
}

/// Response for the /v1/printers endpoint
#[derive(Serialize)]
struct PrintersResponse {
    printers: Vec<PrinterDescriptor>,
    selection: Selection,
}

/// Response for the /v1/status endpoint
#[derive(Serialize)]
struct StatusResponse {
    printer: String,
    status: StatusSnapshot,
}

/// Body of PUT /v1/selection
#[derive(Deserialize)]
struct SelectionRequest {
    key: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("Failed to fetch states: {0}")]
    Upstream(#[from] HostError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        tracing::debug!("Request failed: {}", self);
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Shared application state
pub struct AppState {
    version: &'static str,
    card: Mutex<Card>,
    source: Arc<dyn StateSource>,
    host: Arc<dyn Host>,
}

impl AppState {
    pub fn new(card: Card, source: Arc<dyn StateSource>, host: Arc<dyn Host>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            card: Mutex::new(card),
            source,
            host,
        }
    }

    /// Pull a fresh snapshot into the card and hand back the locked card.
    async fn tick(&self) -> Result<tokio::sync::MutexGuard<'_, Card>, ApiError> {
        let mut card = self.card.lock().await;
        let states = self.source.states().await?;
        tracing::debug!("Tick with {} entities", states.len());
        card.set_states(states, Some(self.host.as_ref()));
        Ok(card)
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
        }),
    )
}

/// Handler for GET /v1/printers
#[tracing::instrument(skip(state))]
async fn printers(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let card = state.tick().await?;
    Ok(Json(PrintersResponse {
        printers: card.printers().to_vec(),
        selection: card.selection().clone(),
    }))
}

/// Handler for GET /v1/status
#[tracing::instrument(skip(state))]
async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let card = state.tick().await?;
    match (card.selection().key(), card.status()) {
        (Some(key), Some(status)) => Ok(Json(StatusResponse {
            printer: key.to_string(),
            status: status.clone(),
        })),
        _ => Err(ApiError::NotFound("No printer found".to_string())),
    }
}

/// Handler for GET /v1/card
#[tracing::instrument(skip(state))]
async fn card(State(state): State<Arc<AppState>>) -> Result<Json<CardView>, ApiError> {
    let card = state.tick().await?;
    Ok(Json(card.view()))
}

/// Handler for PUT /v1/selection
#[tracing::instrument(skip(state, body))]
async fn select(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectionRequest>,
) -> Result<Json<Selection>, ApiError> {
    let mut card = state.tick().await?;
    card.select_printer(&body.key, Some(state.host.as_ref()));
    if card.selection().key() != Some(body.key.as_str()) {
        return Err(ApiError::NotFound(format!("Unknown printer '{}'", body.key)));
    }
    Ok(Json(card.selection().clone()))
}

/// Handler for POST /v1/actions/:name
#[tracing::instrument(skip(state))]
async fn action(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.tick().await?;
    let cmd = card
        .do_action(&name, Some(state.host.as_ref()))
        .ok_or_else(|| ApiError::NotFound(format!("Action '{}' not available", name)))?;
    Ok(accepted(cmd))
}

/// Handler for POST /v1/controls/:control/toggle
#[tracing::instrument(skip(state))]
async fn toggle(
    State(state): State<Arc<AppState>>,
    Path(control): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let control = Control::from_str(&control)
        .map_err(|_| ApiError::BadRequest(format!("Unknown control '{}'", control)))?;
    let card = state.tick().await?;
    let cmd = card
        .toggle(control, Some(state.host.as_ref()))
        .ok_or_else(|| ApiError::NotFound(format!("No {} switch for this printer", control)))?;
    Ok(accepted(cmd))
}

fn accepted(cmd: ServiceCommand) -> impl IntoResponse {
    (StatusCode::ACCEPTED, Json(cmd))
}

/// Create the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/printers", get(printers))
        .route("/v1/status", get(status))
        .route("/v1/card", get(card))
        .route("/v1/selection", put(select))
        .route("/v1/actions/:name", post(action))
        .route("/v1/controls/:control/toggle", post(toggle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// Binds to `listen:port` and serves until `shutdown_rx` fires. Every request
/// that touches the card first pulls a fresh snapshot from the state source.
pub async fn serve(
    listen: &str,
    port: u16,
    state: Arc<AppState>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    tracing::info!("Starting HTTP API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests;
