//! DTO definitions used by the operator REST API and documentation layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_system_time,
        phase::{AdjustmentSnapshot, PhaseSnapshot, SlotSnapshot, WinnerDto},
        validation::validate_seed,
    },
    roster::Contestant,
    state::{phase::PhaseName, timeline::EventTimeline},
};

/// Minimal projection of an event when listed for operators.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventListItem {
    pub id: Uuid,
    pub name: String,
    pub live: bool,
}

/// Payload describing a new broadcast event.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Maximum number of selected contestants; server default when omitted.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub capacity: Option<usize>,
    /// Per-phase duration overrides in minutes.
    #[serde(default)]
    pub phase_minutes: Option<IndexMap<PhaseName, u32>>,
    /// Measured commercial reel length in seconds, at most two hours.
    #[serde(default)]
    #[validate(range(max = 7_200))]
    pub commercial_seconds: Option<u64>,
    /// RFC 3339 instant when entrant registration opens.
    #[serde(default)]
    pub registration_opens_at: Option<String>,
    /// RFC 3339 instant when entrant registration closes.
    #[serde(default)]
    pub registration_closes_at: Option<String>,
}

/// One contestant entry pushed by the roster collaborator.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ContestantInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub display_name: String,
    #[serde(default)]
    pub votes: u64,
    /// Measured media length in seconds, 0 when not yet known.
    #[serde(default)]
    pub media_duration_secs: u64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub winner: bool,
}

impl From<ContestantInput> for Contestant {
    fn from(value: ContestantInput) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name,
            votes: value.votes,
            media_duration_secs: value.media_duration_secs,
            selected: value.selected,
            rank: value.rank,
            winner: value.winner,
        }
    }
}

/// Full roster snapshot replacing the cached one for an event.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RosterSyncRequest {
    #[validate(nested)]
    pub contestants: Vec<ContestantInput>,
}

/// Request to extend or reduce the active phase by whole minutes.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdjustTimeRequest {
    /// Signed delta in minutes; negative values reduce.
    #[validate(range(min = -600, max = 600))]
    pub delta_minutes: i64,
    /// Operator identity recorded in the audit log.
    #[validate(length(min = 1, max = 100))]
    pub actor: String,
}

/// Request to jump the timeline directly to a phase.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JumpRequest {
    pub phase: PhaseName,
}

/// Request to execute the selection raffle.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RaffleRunRequest {
    /// Externally supplied seed; a fresh one is generated when omitted.
    #[serde(default)]
    #[validate(custom(function = validate_seed))]
    pub seed: Option<String>,
}

/// Generic action acknowledgement used by operator endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Acknowledgement of a phase mutation, echoing the resulting active phase.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhaseActionResponse {
    /// Active phase after the mutation, absent when the event finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    pub remaining_seconds: u64,
    pub live: bool,
}

impl PhaseActionResponse {
    /// Snapshot the active phase of an aggregate after a mutation.
    pub fn from_event(event: &EventTimeline, now: std::time::SystemTime) -> Self {
        let active = event.active_phase();
        Self {
            phase: active.map(|phase| phase.name),
            starts_at: active.map(|phase| format_system_time(phase.starts_at)),
            ends_at: active.map(|phase| format_system_time(phase.ends_at)),
            remaining_seconds: event.remaining_secs(now),
            live: event.live,
        }
    }
}

/// Full operator projection of an event aggregate.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub capacity: usize,
    pub live: bool,
    pub paused: bool,
    pub manual_override: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_opens_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_closes_at: Option<String>,
    pub commercial_seconds: u64,
    pub phases: Vec<PhaseSnapshot>,
    pub slots: Vec<SlotSnapshot>,
    pub adjustments: Vec<AdjustmentSnapshot>,
    pub voting_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voting_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<WinnerDto>,
    pub raffle_executed: bool,
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    fn create_request(capacity: Option<usize>, commercial_seconds: Option<u64>) -> CreateEventRequest {
        CreateEventRequest {
            name: "finale".into(),
            capacity,
            phase_minutes: None,
            commercial_seconds,
            registration_opens_at: None,
            registration_closes_at: None,
        }
    }

    #[test]
    fn create_request_rejects_zero_capacity_and_oversized_commercials() {
        assert!(create_request(Some(0), None).validate().is_err());
        assert!(create_request(None, Some(100_000)).validate().is_err());
    }

    #[test]
    fn create_request_accepts_reasonable_bounds() {
        assert!(create_request(Some(1), Some(0)).validate().is_ok());
        assert!(create_request(None, Some(7_200)).validate().is_ok());
        assert!(create_request(None, None).validate().is_ok());
    }
}

impl From<&EventTimeline> for EventSummary {
    fn from(event: &EventTimeline) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            capacity: event.capacity,
            live: event.live,
            paused: event.paused,
            manual_override: event.manual_override,
            created_at: format_system_time(event.created_at),
            updated_at: format_system_time(event.updated_at),
            actual_start: event.actual_start.map(format_system_time),
            registration_opens_at: event.registration_opens_at.map(format_system_time),
            registration_closes_at: event.registration_closes_at.map(format_system_time),
            commercial_seconds: event.commercial_seconds,
            phases: event.phases.iter().map(Into::into).collect(),
            slots: event.slots.iter().map(Into::into).collect(),
            adjustments: event.adjustments.iter().map(Into::into).collect(),
            voting_open: event.voting_open,
            voting_deadline: event.voting_deadline.map(format_system_time),
            winner: event.winner.as_ref().map(Into::into),
            raffle_executed: event.raffle.is_some(),
        }
    }
}
