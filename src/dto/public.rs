use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::phase::{PhaseSnapshot, SlotSnapshot, WinnerDto};

/// The performer currently on stage, as shown to viewers.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentPerformer {
    pub contestant_id: Uuid,
    pub display_name: String,
    pub position: usize,
    pub ends_at: String,
}

/// Poll response driving every viewer screen.
///
/// Derived from the authoritative timeline at read time so a mid-show
/// joiner computes the same view as everyone else.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub event_id: Uuid,
    pub name: String,
    pub live: bool,
    pub paused: bool,
    /// Active phase snapshot, absent before start and after the end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseSnapshot>,
    pub remaining_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<CurrentPerformer>,
    /// Upcoming slots so viewers can see who performs next.
    pub upcoming: Vec<SlotSnapshot>,
    pub voting_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voting_deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<WinnerDto>,
    /// Viewers seen within the presence window.
    pub viewers: usize,
    /// True when the backend operates without a storage connection.
    pub degraded: bool,
}

/// Viewer heartbeat payload keeping the audience figure warm.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HeartbeatRequest {
    /// Stable identifier the viewer client generated for itself.
    pub viewer_id: Uuid,
}

/// Acknowledgement of a heartbeat, echoing the audience figure.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeartbeatResponse {
    pub viewers: usize,
}
