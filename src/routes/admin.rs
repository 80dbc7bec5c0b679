//! Operator-only endpoints for configuring and driving broadcast events.

use std::time::SystemTime;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, AdjustTimeRequest, CreateEventRequest, EventListItem, EventSummary,
            JumpRequest, PhaseActionResponse, RaffleRunRequest, RosterSyncRequest,
        },
        raffle::RaffleDisclosureResponse,
    },
    error::AppError,
    services::{event_service, raffle_service, timeline_service},
    state::SharedState,
};

const OPERATOR_TOKEN_HEADER: &str = "x-operator-token";

/// Operator management endpoints, gated by the operator token when one is
/// configured.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/events", get(list_events).post(create_event))
        .route("/admin/events/{id}", get(get_event).delete(delete_event))
        .route("/admin/events/{id}/roster", post(sync_roster))
        .route("/admin/events/{id}/start", post(start_event))
        .route("/admin/events/{id}/advance", post(advance_phase))
        .route("/admin/events/{id}/pause", post(pause_event))
        .route("/admin/events/{id}/resume", post(resume_event))
        .route("/admin/events/{id}/adjust-time", post(adjust_time))
        .route("/admin/events/{id}/jump", post(jump_to_phase))
        .route("/admin/events/{id}/slots/advance", post(advance_slot))
        .route(
            "/admin/events/{id}/commercials/complete",
            post(complete_commercials),
        )
        .route("/admin/events/{id}/stop", post(stop_event))
        .route("/admin/events/{id}/restart", post(restart_event))
        .route("/admin/events/{id}/raffle", post(run_raffle))
        .route_layer(middleware::from_fn_with_state(state, require_operator_token))
}

/// Retrieve every event known to the system.
#[utoipa::path(
    get,
    path = "/admin/events",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token")),
    responses((status = 200, description = "List available events", body = [EventListItem]))
)]
pub async fn list_events(
    State(state): State<SharedState>,
) -> Result<Json<Vec<EventListItem>>, AppError> {
    Ok(Json(event_service::list_events(&state).await?))
}

/// Create a new broadcast event.
#[utoipa::path(
    post,
    path = "/admin/events",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token")),
    request_body = CreateEventRequest,
    responses((status = 200, description = "Event created", body = EventSummary))
)]
pub async fn create_event(
    State(state): State<SharedState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<EventSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        event_service::create_event(&state, payload, SystemTime::now()).await?,
    ))
}

/// Retrieve one event with its full timeline.
#[utoipa::path(
    get,
    path = "/admin/events/{id}",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Identifier of the event to retrieve")),
    responses((status = 200, description = "Event", body = EventSummary))
)]
pub async fn get_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventSummary>, AppError> {
    Ok(Json(event_service::get_event(&state, id).await?))
}

/// Delete a persisted event by its identifier.
#[utoipa::path(
    delete,
    path = "/admin/events/{id}",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Identifier of the event to delete")),
    responses((status = 204, description = "Event deleted"))
)]
pub async fn delete_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    event_service::delete_event(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Accept a roster snapshot push from the roster collaborator.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/roster",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    request_body = RosterSyncRequest,
    responses((status = 200, description = "Snapshot accepted", body = ActionResponse))
)]
pub async fn sync_roster(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RosterSyncRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        event_service::sync_roster(&state, id, payload, SystemTime::now()).await?,
    ))
}

/// Generate the timeline and take the event live.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/start",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Event started", body = PhaseActionResponse))
)]
pub async fn start_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::start_event(&state, id, SystemTime::now()).await?,
    ))
}

/// Complete the active phase and enter the next one.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/advance",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Phase advanced", body = PhaseActionResponse))
)]
pub async fn advance_phase(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::advance_phase(&state, id, SystemTime::now()).await?,
    ))
}

/// Stop the event clock.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/pause",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Event paused", body = PhaseActionResponse))
)]
pub async fn pause_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::pause_event(&state, id, SystemTime::now()).await?,
    ))
}

/// Restart the clock, preserving the remaining time of the active phase.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/resume",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Event resumed", body = PhaseActionResponse))
)]
pub async fn resume_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::resume_event(&state, id, SystemTime::now()).await?,
    ))
}

/// Extend or reduce the active phase by whole minutes.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/adjust-time",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    request_body = AdjustTimeRequest,
    responses(
        (status = 200, description = "Phase adjusted", body = PhaseActionResponse),
        (status = 422, description = "Reduction exceeds the remaining phase time")
    )
)]
pub async fn adjust_time(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustTimeRequest>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        timeline_service::adjust_time(&state, id, payload, SystemTime::now()).await?,
    ))
}

/// Jump the timeline directly to a phase.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/jump",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    request_body = JumpRequest,
    responses((status = 200, description = "Jumped to phase", body = PhaseActionResponse))
)]
pub async fn jump_to_phase(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JumpRequest>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::jump_to_phase(&state, id, payload.phase, SystemTime::now()).await?,
    ))
}

/// Complete the active performance slot and start the next one.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/slots/advance",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Slot advanced", body = PhaseActionResponse))
)]
pub async fn advance_slot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::advance_slot(&state, id, SystemTime::now()).await?,
    ))
}

/// Signal that the commercial reel finished playing.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/commercials/complete",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Signal processed", body = PhaseActionResponse))
)]
pub async fn complete_commercials(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::complete_commercials(&state, id, SystemTime::now()).await?,
    ))
}

/// Take the event off air.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/stop",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Event stopped", body = ActionResponse))
)]
pub async fn stop_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        timeline_service::stop_event(&state, id, SystemTime::now()).await?,
    ))
}

/// Reset and regenerate the timeline from now.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/restart",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    responses((status = 200, description = "Event restarted", body = PhaseActionResponse))
)]
pub async fn restart_event(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhaseActionResponse>, AppError> {
    Ok(Json(
        timeline_service::restart_event(&state, id, SystemTime::now()).await?,
    ))
}

/// Execute the selection raffle for an event.
#[utoipa::path(
    post,
    path = "/admin/events/{id}/raffle",
    tag = "admin",
    params(("X-Operator-Token" = String, Header, description = "Operator bearer token"),
    ("id" = String, Path, description = "Event identifier")),
    request_body = RaffleRunRequest,
    responses(
        (status = 200, description = "Raffle executed", body = RaffleDisclosureResponse),
        (status = 409, description = "Raffle already executed")
    )
)]
pub async fn run_raffle(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RaffleRunRequest>,
) -> Result<Json<RaffleDisclosureResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        raffle_service::run_raffle(&state, id, payload, SystemTime::now()).await?,
    ))
}

/// Check the operator token header against the configured value.
///
/// An unset token leaves the routes open; the gap is logged once at startup.
async fn require_operator_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().operator_token.clone() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(OPERATOR_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing operator token header `X-Operator-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid operator token".into()))
    }
}
