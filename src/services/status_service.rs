//! Read-time reconciliation and the public status projection. Every status
//! poll sweeps the timeline forward before projecting, so viewers never see
//! a stale phase even though nothing runs between requests.

use std::time::SystemTime;

use tracing::debug;
use uuid::Uuid;

use crate::{
    dto::{
        phase::{PhaseSnapshot, SlotSnapshot},
        public::{CurrentPerformer, HeartbeatRequest, HeartbeatResponse, StatusResponse},
    },
    dto::format_system_time,
    error::ServiceError,
    services::{event_service, timeline_service},
    state::{SharedState, phase::PhaseStatus, reconcile},
};

/// Compute the public status for an event, advancing overdue phases first.
pub async fn event_status(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<StatusResponse, ServiceError> {
    let handle = event_service::resolve_event(state, id).await?;
    let roster = state.roster().contestants(id).await;
    let max_steps = state.config().reconcile_max_steps;

    // Most polls find a consistent timeline; only take the write lock when a
    // sweep will actually mutate, so concurrent reads stay concurrent.
    let sweep_needed = {
        let event = handle.read().await;
        reconcile::sweep_due(&event, &roster, now)
    };
    if sweep_needed {
        let mut event = handle.write().await;
        let report = reconcile::reconcile(&mut event, &roster, now, max_steps);
        if report.changed() {
            debug!(event_id = %id, entered = ?report.entered, "status poll reconciled the timeline");
            if let Some(announcement) = report.announcement.as_ref() {
                timeline_service::handle_announcement(state, id, announcement).await;
            }
            event.version += 1;
            event_service::persist_event(state, &event).await;
        }
    }

    let event = handle.read().await;

    let performer = event.active_slot().and_then(|slot| {
        let entry = roster.iter().find(|c| c.id == slot.contestant_id)?;
        Some(CurrentPerformer {
            contestant_id: slot.contestant_id,
            display_name: entry.display_name.clone(),
            position: slot.position,
            ends_at: format_system_time(slot.ends_at),
        })
    });
    let upcoming: Vec<SlotSnapshot> = event
        .slots
        .iter()
        .filter(|slot| slot.status == PhaseStatus::Pending)
        .map(Into::into)
        .collect();

    Ok(StatusResponse {
        event_id: event.id,
        name: event.name.clone(),
        live: event.live,
        paused: event.paused,
        phase: event.active_phase().map(PhaseSnapshot::from),
        remaining_seconds: event.remaining_secs(now),
        performer,
        upcoming,
        voting_open: event.voting_open,
        voting_deadline: event.voting_deadline.map(format_system_time),
        winner: event.winner.as_ref().map(Into::into),
        viewers: state.viewer_count(id, now),
        degraded: state.is_degraded().await,
    })
}

/// Record a viewer heartbeat and echo the audience figure back.
pub async fn heartbeat(
    state: &SharedState,
    id: Uuid,
    request: HeartbeatRequest,
    now: SystemTime,
) -> Result<HeartbeatResponse, ServiceError> {
    // Resolve first so heartbeats against unknown events 404 instead of
    // growing the presence registry unbounded.
    event_service::resolve_event(state, id).await?;
    state.record_heartbeat(id, request.viewer_id, now);
    Ok(HeartbeatResponse {
        viewers: state.viewer_count(id, now),
    })
}
