//! Route registration.
//!
//! # Responsibilities
//! - Define the route-configuration contract used at startup
//! - Provide the default route set and its handlers
//!
//! # Design Decisions
//! - Routes needing sessions answer 503 while sessions are degraded;
//!   `/health` and session-less chat keep working
//! - Docs routes exist only when debug is on

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::conversation::{Session, Turn};
use crate::http::docs;
use crate::http::request::{BaseUrl, ClientAddr};
use crate::http::response::{ApiError, ErrorBody};
use crate::http::server::AppState;

/// Presentation switches handed to route configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Expose `/docs` and `/openapi.json`.
    pub docs: bool,
}

/// Registers every HTTP route on the application router.
pub trait RouteConfigurator: Send + Sync {
    fn configure(&self, router: Router<AppState>, options: &RouteOptions) -> Router<AppState>;
}

impl<F> RouteConfigurator for F
where
    F: Fn(Router<AppState>, &RouteOptions) -> Router<AppState> + Send + Sync,
{
    fn configure(&self, router: Router<AppState>, options: &RouteOptions) -> Router<AppState> {
        self(router, options)
    }
}

/// The built-in route set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRoutes;

impl RouteConfigurator for DefaultRoutes {
    fn configure(&self, router: Router<AppState>, options: &RouteOptions) -> Router<AppState> {
        let router = router
            .route("/health", get(health))
            .route("/api/chat", post(chat))
            .route("/api/sessions", post(create_session))
            .route("/api/sessions/{id}", get(get_session));

        if options.docs {
            router.merge(docs::swagger_ui())
        } else {
            router
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub status: String,
    pub agent: String,
    pub sessions: String,
}

/// Liveness and capability report.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = HealthReport))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        agent: state.agent.name().to_string(),
        sessions: state.sessions.label().into(),
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

/// Send a message to the agent, optionally within a session.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Agent reply", body = ChatReply),
        (status = 400, description = "Empty message", body = ErrorBody),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 503, description = "Session storage is unavailable", body = ErrorBody)
    )
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let Some(id) = request.session_id else {
        let reply = state.agent.respond(&[], &request.message).await?;
        return Ok(Json(ChatReply {
            reply,
            session_id: None,
        }));
    };

    let store = state.session_store()?;
    let session = store.get(id).await?.ok_or(ApiError::SessionNotFound(id))?;
    let reply = state.agent.respond(&session.turns, &request.message).await?;
    store
        .append(id, vec![Turn::user(request.message), Turn::agent(reply.clone())])
        .await?;

    Ok(Json(ChatReply {
        reply,
        session_id: Some(id),
    }))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionCreated {
    pub id: Uuid,
    pub url: String,
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session started", body = SessionCreated,
            headers(("location" = String, description = "Absolute session URL"))),
        (status = 503, description = "Session storage is unavailable", body = ErrorBody)
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    base: BaseUrl,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.session_store()?.create().await?;
    let url = base.join(&format!("/api/sessions/{}", session.id));
    tracing::info!(session_id = %session.id, client = ?client, "Session started");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, url.clone())],
        Json(SessionCreated {
            id: session.id,
            url,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = Session),
        (status = 404, description = "Unknown session", body = ErrorBody),
        (status = 503, description = "Session storage is unavailable", body = ErrorBody)
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .session_store()?
        .get(id)
        .await?
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(session))
}
