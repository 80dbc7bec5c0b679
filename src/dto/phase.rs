use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        effects::WinnerAnnouncement,
        phase::{PhaseName, PhaseStatus},
        timeline::{PerformanceSlot, Phase, TimeAdjustment},
    },
};

/// Lifecycle status of a phase or performance slot as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleStatus {
    /// Not reached yet.
    Pending,
    /// Currently on air.
    Active,
    /// Already aired.
    Completed,
}

impl From<PhaseStatus> for VisibleStatus {
    fn from(value: PhaseStatus) -> Self {
        match value {
            PhaseStatus::Pending => VisibleStatus::Pending,
            PhaseStatus::Active => VisibleStatus::Active,
            PhaseStatus::Completed => VisibleStatus::Completed,
        }
    }
}

/// Snapshot of one phase with its computed instants.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct PhaseSnapshot {
    pub name: PhaseName,
    pub status: VisibleStatus,
    pub duration_minutes: u32,
    pub starts_at: String,
    pub ends_at: String,
}

impl From<&Phase> for PhaseSnapshot {
    fn from(phase: &Phase) -> Self {
        Self {
            name: phase.name,
            status: phase.status.into(),
            duration_minutes: phase.duration_minutes,
            starts_at: format_system_time(phase.starts_at),
            ends_at: format_system_time(phase.ends_at),
        }
    }
}

/// Snapshot of one performance slot.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct SlotSnapshot {
    pub contestant_id: Uuid,
    pub position: usize,
    pub video_duration_secs: u64,
    pub status: VisibleStatus,
    pub starts_at: String,
    pub ends_at: String,
}

impl From<&PerformanceSlot> for SlotSnapshot {
    fn from(slot: &PerformanceSlot) -> Self {
        Self {
            contestant_id: slot.contestant_id,
            position: slot.position,
            video_duration_secs: slot.video_duration_secs,
            status: slot.status.into(),
            starts_at: format_system_time(slot.starts_at),
            ends_at: format_system_time(slot.ends_at),
        }
    }
}

/// One entry of the manual time adjustment audit log.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct AdjustmentSnapshot {
    pub phase: PhaseName,
    pub delta_minutes: i64,
    pub actor: String,
    pub at: String,
}

impl From<&TimeAdjustment> for AdjustmentSnapshot {
    fn from(record: &TimeAdjustment) -> Self {
        Self {
            phase: record.phase,
            delta_minutes: record.delta_minutes,
            actor: record.actor.clone(),
            at: format_system_time(record.at),
        }
    }
}

/// Winner outcome projection shared by public and operator responses.
#[derive(Debug, Serialize, ToSchema, Clone)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum WinnerDto {
    /// A single entry holds the top vote count.
    Crowned { contestant_id: Uuid, votes: u64 },
    /// The top vote count is shared; no winner is declared.
    Tie {
        contestant_ids: Vec<Uuid>,
        votes: u64,
    },
    /// No winner could be declared.
    NoContest { reason: String },
}

impl From<&WinnerAnnouncement> for WinnerDto {
    fn from(value: &WinnerAnnouncement) -> Self {
        match value {
            WinnerAnnouncement::Crowned {
                contestant_id,
                votes,
            } => WinnerDto::Crowned {
                contestant_id: *contestant_id,
                votes: *votes,
            },
            WinnerAnnouncement::Tie {
                contestant_ids,
                votes,
            } => WinnerDto::Tie {
                contestant_ids: contestant_ids.clone(),
                votes: *votes,
            },
            WinnerAnnouncement::NoContest { reason } => WinnerDto::NoContest {
                reason: reason.clone(),
            },
        }
    }
}
