//! Business logic powering the operator timeline routes. Every mutation
//! takes the per-event write lock, applies the domain operation, runs the
//! phase-entry side effects, bumps the aggregate version, and writes the
//! result through to storage.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::admin::{ActionResponse, AdjustTimeRequest, PhaseActionResponse},
    error::ServiceError,
    services::event_service::{persist_event, resolve_event},
    state::{
        SharedState,
        effects::{self, WinnerAnnouncement},
        phase::PhaseName,
        timeline::{AdvanceOutcome, SlotAdvance, TimelineError},
    },
};

/// React to a winner announcement computed during a phase entry.
///
/// The roster flag write is awaited since later requests read it; the
/// promotional feature is fire-and-forget and only logged on failure.
pub async fn handle_announcement(
    state: &SharedState,
    event_id: Uuid,
    announcement: &WinnerAnnouncement,
) {
    match announcement {
        WinnerAnnouncement::Crowned {
            contestant_id,
            votes,
        } => {
            info!(%event_id, %contestant_id, votes, "winner crowned");
            state.roster().mark_winner(event_id, *contestant_id).await;

            let features = state.features();
            let contestant_id = *contestant_id;
            tokio::spawn(async move {
                if let Err(err) = features.feature_winner(event_id, contestant_id).await {
                    warn!(%event_id, %contestant_id, error = %err, "winner feature placement failed");
                }
            });
        }
        WinnerAnnouncement::Tie {
            contestant_ids, ..
        } => {
            info!(%event_id, contestants = contestant_ids.len(), "vote ended in a tie; no winner declared");
        }
        WinnerAnnouncement::NoContest { reason } => {
            info!(%event_id, reason, "vote ended with no contest");
        }
    }
}

async fn apply_entry_effects(
    state: &SharedState,
    event: &mut crate::state::timeline::EventTimeline,
    entered: PhaseName,
    now: SystemTime,
) {
    let roster = state.roster().contestants(event.id).await;
    if let Some(announcement) = effects::apply_entry(event, entered, &roster, now) {
        handle_announcement(state, event.id, &announcement).await;
    }
}

/// Generate the timeline from `now` and take the event live.
pub async fn start_event(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let roster = state.roster().contestants(id).await;
    let mut event = handle.write().await;
    if event.live {
        return Err(TimelineError::AlreadyLive.into());
    }

    event.generate_timeline(now);
    event.schedule_performances(&roster, now);
    event.version += 1;
    info!(event_id = %id, "event went live");
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Complete the active phase and enter the next one.
pub async fn advance_phase(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    if !event.live {
        // A generated timeline that ran out of phases (or was stopped) is
        // off air; a duplicate advance reports the terminal state instead of
        // erroring. Only an event that never started rejects the command.
        if event.phases.is_empty() {
            return Err(TimelineError::NotLive.into());
        }
        return Ok(PhaseActionResponse::from_event(&event, now));
    }

    match event.advance_phase(now) {
        AdvanceOutcome::Entered(entered) => {
            info!(event_id = %id, phase = %entered, "operator advanced phase");
            apply_entry_effects(state, &mut event, entered, now).await;
        }
        AdvanceOutcome::Finished => {
            info!(event_id = %id, "event finished");
        }
    }
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Stop the clock.
pub async fn pause_event(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    event.pause(now)?;
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Restart the clock, shifting outstanding instants by the paused span.
pub async fn resume_event(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    event.resume(now)?;
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Extend or reduce the active phase by whole minutes.
pub async fn adjust_time(
    state: &SharedState,
    id: Uuid,
    request: AdjustTimeRequest,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    if !event.live {
        return Err(TimelineError::NotLive.into());
    }

    let adjusted = event.adjust_current_phase(request.delta_minutes, &request.actor, now)?;
    info!(
        event_id = %id,
        phase = %adjusted.name,
        delta_minutes = request.delta_minutes,
        actor = %request.actor,
        "adjusted active phase"
    );
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Jump directly to a phase, running its entry effects.
pub async fn jump_to_phase(
    state: &SharedState,
    id: Uuid,
    target: PhaseName,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    let entered = event.jump_to_phase(target, now)?;
    info!(event_id = %id, phase = %entered, "operator jumped to phase");
    apply_entry_effects(state, &mut event, entered, now).await;
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Complete the active performance slot and start the next.
pub async fn advance_slot(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    match event.advance_slot(now)? {
        SlotAdvance::NextSlot(position) => {
            info!(event_id = %id, position, "performance slot advanced");
        }
        SlotAdvance::PerformanceComplete(outcome) => {
            info!(event_id = %id, "last performance completed");
            if let AdvanceOutcome::Entered(entered) = outcome {
                apply_entry_effects(state, &mut event, entered, now).await;
            }
        }
    }
    event.version += 1;
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Explicit signal that the commercial reel finished playing.
pub async fn complete_commercials(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    match event.complete_commercials(now) {
        Some(AdvanceOutcome::Entered(entered)) => {
            info!(event_id = %id, phase = %entered, "commercials complete");
            apply_entry_effects(state, &mut event, entered, now).await;
            event.version += 1;
            persist_event(state, &event).await;
        }
        Some(AdvanceOutcome::Finished) => {
            event.version += 1;
            persist_event(state, &event).await;
        }
        // Signal arrived outside the commercial phase; absorbed.
        None => {}
    }
    Ok(PhaseActionResponse::from_event(&event, now))
}

/// Take the event off air.
pub async fn stop_event(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<ActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let mut event = handle.write().await;
    event.stop(now);
    event.version += 1;
    info!(event_id = %id, "event stopped");
    persist_event(state, &event).await;
    Ok(ActionResponse {
        message: format!("event `{id}` stopped"),
    })
}

/// Reset the timeline and regenerate it from `now`.
pub async fn restart_event(
    state: &SharedState,
    id: Uuid,
    now: SystemTime,
) -> Result<PhaseActionResponse, ServiceError> {
    let handle = resolve_event(state, id).await?;
    let roster = state.roster().contestants(id).await;
    let mut event = handle.write().await;
    event.restart(now);
    event.schedule_performances(&roster, now);
    event.version += 1;
    info!(event_id = %id, "event restarted");
    persist_event(state, &event).await;
    Ok(PhaseActionResponse::from_event(&event, now))
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::SystemTime};

    use indexmap::IndexMap;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        roster::{LogFeatureSink, SnapshotRoster},
        state::{AppState, phase::PhaseName, timeline::EventTimeline},
    };

    fn test_state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            Arc::new(SnapshotRoster::new()),
            Arc::new(LogFeatureSink),
        )
    }

    fn quick_event(id: Uuid, now: SystemTime) -> EventTimeline {
        EventTimeline::new(
            id,
            "finale".into(),
            3,
            IndexMap::from([
                (PhaseName::Countdown, 1),
                (PhaseName::Welcome, 1),
                (PhaseName::Performance, 1),
                (PhaseName::Voting, 1),
                (PhaseName::Winner, 1),
                (PhaseName::ThankYou, 1),
            ]),
            None,
            None,
            now,
        )
    }

    #[tokio::test]
    async fn advancing_a_finished_event_reports_the_terminal_state() {
        let state = test_state();
        let id = Uuid::from_u128(7);
        let now = SystemTime::UNIX_EPOCH;

        let mut event = quick_event(id, now);
        event.generate_timeline(now);
        state.insert_event(event);

        // Burn through every phase plus the terminal advance.
        let mut last = advance_phase(&state, id, now).await.expect("advance");
        for _ in 0..8 {
            last = advance_phase(&state, id, now).await.expect("advance");
        }

        // The duplicate advance is absorbed, not a conflict.
        assert!(!last.live);
        assert!(last.phase.is_none());
        assert_eq!(last.remaining_seconds, 0);
    }

    #[tokio::test]
    async fn advancing_an_event_that_never_started_is_rejected() {
        let state = test_state();
        let id = Uuid::from_u128(8);
        let now = SystemTime::UNIX_EPOCH;
        state.insert_event(quick_event(id, now));

        let err = advance_phase(&state, id, now).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
