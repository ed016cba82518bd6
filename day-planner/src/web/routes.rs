//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tracing::{debug, error};

use crate::domain::DomainError;
use crate::itinerary::ItineraryError;
use crate::planner::PlannerError;
use crate::routing::RouteLookup;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<L: RouteLookup + 'static>(state: AppState<L>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/itinerary", get(itinerary::<L>))
        .route("/stops", post(add_stop::<L>))
        .route("/stops/:id", delete(remove_stop::<L>))
        .route("/stops/:id/insert", post(insert_stop::<L>))
        .route("/stops/:id/duration", put(update_duration::<L>))
        .route("/start-time", put(update_start_time::<L>))
        .route("/retry", post(retry::<L>))
        .route("/render", get(render_feed::<L>))
        .route("/notices", get(notice_feed::<L>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The whole day as it stands.
async fn itinerary<L: RouteLookup>(State(state): State<AppState<L>>) -> Json<ItineraryResponse> {
    let itinerary = state.planner.snapshot().await;
    Json(ItineraryResponse::from_itinerary(&itinerary))
}

/// Add a stop at the end of the day.
async fn add_stop<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Json(req): Json<AddStopRequest>,
) -> Result<(StatusCode, Json<StopCreatedResponse>), AppError> {
    let key = state
        .planner
        .append_stop(req.name, req.location, &req.input)
        .await?;
    created(&state, key).await
}

/// Add a stop so that it gets the id in the path.
async fn insert_stop<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Path(id): Path<usize>,
    Json(req): Json<AddStopRequest>,
) -> Result<(StatusCode, Json<StopCreatedResponse>), AppError> {
    let key = state
        .planner
        .insert_stop(id, req.name, req.location, &req.input)
        .await?;
    created(&state, key).await
}

async fn created<L: RouteLookup>(
    state: &AppState<L>,
    key: crate::domain::StopKey,
) -> Result<(StatusCode, Json<StopCreatedResponse>), AppError> {
    let id = state
        .planner
        .snapshot()
        .await
        .id_of(key)
        .ok_or_else(|| AppError::Internal {
            message: format!("{key} missing after it was added"),
        })?;
    Ok((StatusCode::CREATED, Json(StopCreatedResponse { key, id })))
}

/// Remove a stop.
async fn remove_stop<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Path(id): Path<usize>,
) -> Result<Json<StopRemovedResponse>, AppError> {
    let removed = state.planner.remove_stop(id).await?;
    Ok(Json(StopRemovedResponse {
        removed: StopView::from_stop(&removed),
    }))
}

/// Change how long the traveller stays at a stop.
async fn update_duration<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Path(id): Path<usize>,
    Json(req): Json<DurationRequest>,
) -> Result<Json<ItineraryResponse>, AppError> {
    state
        .planner
        .update_duration(id, &req.hours, &req.minutes)
        .await?;
    Ok(itinerary(State(state)).await)
}

/// Move the day's departure.
async fn update_start_time<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Json(req): Json<StartTimeRequest>,
) -> Result<Json<ItineraryResponse>, AppError> {
    state.planner.update_start_time(&req.start_time).await?;
    Ok(itinerary(State(state)).await)
}

/// Ask again for every segment whose lookup failed.
async fn retry<L: RouteLookup>(State(state): State<AppState<L>>) -> Json<RetryResponse> {
    let repaired = state.planner.retry_degraded().await;
    Json(RetryResponse { repaired })
}

/// Render commands the client has not seen yet.
async fn render_feed<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Query(query): Query<FeedQuery>,
) -> Json<RenderFeedResponse> {
    let page = state.renderer.page(query.after);
    Json(RenderFeedResponse {
        next: page.next,
        missed: page.missed,
        commands: page.entries,
    })
}

/// Notices the client has not seen yet.
async fn notice_feed<L: RouteLookup>(
    State(state): State<AppState<L>>,
    Query(query): Query<FeedQuery>,
) -> Json<NoticeFeedResponse> {
    let page = state.notifier.page(query.after);
    Json(NoticeFeedResponse {
        next: page.next,
        missed: page.missed,
        notices: page.entries.into_iter().map(NoticeView::from).collect(),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlannerError> for AppError {
    fn from(e: PlannerError) -> Self {
        let message = e.to_string();
        match e {
            PlannerError::Itinerary(ItineraryError::NotFound(_)) => AppError::NotFound { message },
            PlannerError::Itinerary(_)
            | PlannerError::InvalidInput(_)
            | PlannerError::Schedule(DomainError::AnchorDuration) => {
                AppError::BadRequest { message }
            }
            PlannerError::Schedule(_) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
