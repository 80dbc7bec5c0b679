//! Selection raffle execution and the transparency projections that let
//! anyone re-derive the draw.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        admin::RaffleRunRequest,
        raffle::{RaffleDisclosureResponse, VerifyRequest, VerifyResponse},
    },
    error::ServiceError,
    raffle,
    services::event_service::{persist_event, resolve_event},
    state::SharedState,
};

/// Execute the raffle for an event exactly once.
///
/// The entrant order is the roster snapshot order at draw time; it is
/// recorded in the ledger because positions derive from draw indexes, not
/// identities. Selected entrants are immediately scheduled into slots.
pub async fn run_raffle(
    state: &SharedState,
    id: Uuid,
    request: RaffleRunRequest,
    now: SystemTime,
) -> Result<RaffleDisclosureResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let roster = state.roster().contestants(id).await;
    let entrants: Vec<Uuid> = roster.iter().map(|entry| entry.id).collect();

    let mut event = handle.write().await;
    if event.raffle.is_some() {
        return Err(ServiceError::InvalidState(format!(
            "raffle for event `{id}` was already executed"
        )));
    }

    let record = raffle::draw(request.seed, &entrants, event.capacity, now)?;
    info!(
        event_id = %id,
        seed = %record.seed,
        entrants = record.entrant_count,
        capacity = event.capacity,
        "raffle executed"
    );

    state
        .roster()
        .mark_raffle_outcomes(id, record.results.clone())
        .await;
    let updated = state.roster().contestants(id).await;

    let response = RaffleDisclosureResponse::from(&record);
    event.raffle = Some(record);
    if event.live {
        event.schedule_performances(&updated, now);
    }
    event.version += 1;
    persist_event(state, &event).await;

    Ok(response)
}

/// Published ledger of an executed draw.
pub async fn disclosure(
    state: &SharedState,
    id: Uuid,
) -> Result<RaffleDisclosureResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let event = handle.read().await;
    event
        .raffle
        .as_ref()
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("no raffle executed for event `{id}`")))
}

/// Re-derive a draw from its public inputs and compare to the claim.
///
/// Pure computation; no event state is touched, so anyone can check a
/// foreign ledger through this endpoint.
pub fn verify(request: VerifyRequest) -> VerifyResponse {
    let passed = raffle::verify(
        &request.seed,
        &request.entrants,
        &request.expected_selected,
        request.capacity,
    );
    VerifyResponse {
        passed,
        seed: request.seed,
        entrant_count: request.entrants.len(),
    }
}
