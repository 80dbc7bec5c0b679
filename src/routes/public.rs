//! Unauthenticated endpoints backing the audience display and verifiers.

use std::time::SystemTime;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        public::{HeartbeatRequest, HeartbeatResponse, StatusResponse},
        raffle::{RaffleDisclosureResponse, VerifyRequest, VerifyResponse},
    },
    error::AppError,
    services::{raffle_service, status_service},
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/events/{id}/status", get(event_status))
        .route("/events/{id}/heartbeat", post(heartbeat))
        .route("/events/{id}/raffle", get(raffle_disclosure))
        .route("/raffle/verify", post(verify_raffle))
}

/// Read the reconciled live view of an event.
#[utoipa::path(
    get,
    path = "/events/{id}/status",
    tag = "public",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Current event status", body = StatusResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn event_status(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, AppError> {
    Ok(Json(
        status_service::event_status(&state, id, SystemTime::now()).await?,
    ))
}

/// Register a viewer session as still watching.
#[utoipa::path(
    post,
    path = "/events/{id}/heartbeat",
    tag = "public",
    params(("id" = String, Path, description = "Event identifier")),
    request_body = HeartbeatRequest,
    responses(
        (status = 200, description = "Heartbeat recorded", body = HeartbeatResponse),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn heartbeat(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    Ok(Json(
        status_service::heartbeat(&state, id, payload, SystemTime::now()).await?,
    ))
}

/// Disclose the raffle ledger so anyone can audit the draw.
#[utoipa::path(
    get,
    path = "/events/{id}/raffle",
    tag = "raffle",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Raffle ledger", body = RaffleDisclosureResponse),
        (status = 404, description = "No raffle has been executed for this event")
    )
)]
pub async fn raffle_disclosure(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RaffleDisclosureResponse>, AppError> {
    Ok(Json(raffle_service::disclosure(&state, id).await?))
}

/// Replay a disclosed draw and report whether it holds up.
#[utoipa::path(
    post,
    path = "/raffle/verify",
    tag = "raffle",
    request_body = VerifyRequest,
    responses((status = 200, description = "Verification outcome", body = VerifyResponse))
)]
pub async fn verify_raffle(
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    payload.validate()?;
    Ok(Json(raffle_service::verify(payload)))
}
