use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    raffle::{RaffleEntryResult, RaffleOutcome, RaffleRecord},
    roster::Contestant,
    state::{
        effects::WinnerAnnouncement,
        phase::{PhaseName, PhaseStatus},
        timeline::{EventTimeline, PerformanceSlot, Phase, TimeAdjustment},
    },
};

/// One phase of the persisted timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseEntity {
    /// Which stage this is.
    pub name: PhaseName,
    /// Lifecycle status at save time.
    pub status: PhaseStatus,
    /// Planned length in whole minutes.
    pub duration_minutes: u32,
    /// Computed start instant.
    pub starts_at: SystemTime,
    /// Computed end instant.
    pub ends_at: SystemTime,
}

/// One performance slot of the persisted timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotEntity {
    /// Contestant owning this turn.
    pub contestant_id: Uuid,
    /// Ordinal, contiguous from 0.
    pub position: usize,
    /// Authoritative media length in seconds.
    pub video_duration_secs: u64,
    /// Lifecycle status at save time.
    pub status: PhaseStatus,
    /// Computed start instant.
    pub starts_at: SystemTime,
    /// Computed end instant.
    pub ends_at: SystemTime,
}

/// One audit record of a manual time adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdjustmentEntity {
    /// Phase that was adjusted.
    pub phase: PhaseName,
    /// Signed delta in minutes.
    pub delta_minutes: i64,
    /// Operator that issued the command.
    pub actor: String,
    /// When the adjustment was applied.
    pub at: SystemTime,
}

/// One entrant's persisted draw result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaffleEntryEntity {
    /// Identity of the entrant.
    pub entrant_id: Uuid,
    /// Rank starting at 1.
    pub position: u32,
    /// Deterministic value derived from the seed.
    pub random_value: u64,
    /// Selected or waitlisted.
    pub outcome: RaffleOutcome,
}

/// Executed raffle ledger persisted with the event so verification keeps
/// working even after the roster service cleans up its entrant records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RaffleEntity {
    /// Public seed the ranking derives from.
    pub seed: String,
    /// Instant the draw was executed.
    pub drawn_at: SystemTime,
    /// Number of entrants that took part.
    pub entrant_count: usize,
    /// Entrant identities in draw order.
    pub draw_order: Vec<Uuid>,
    /// Per-entrant results.
    pub results: Vec<RaffleEntryEntity>,
}

/// Persisted winner outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum WinnerEntity {
    /// A single entry holds the top vote count.
    Crowned { contestant_id: Uuid, votes: u64 },
    /// The top vote count is shared.
    Tie {
        contestant_ids: Vec<Uuid>,
        votes: u64,
    },
    /// No winner could be declared.
    NoContest { reason: String },
}

/// Cached roster snapshot persisted alongside the event so a restarted
/// backend can schedule performances before the collaborator pushes again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContestantEntity {
    /// Identity owned by the roster service.
    pub id: Uuid,
    /// Display name for projections.
    pub display_name: String,
    /// Vote tally at save time.
    pub votes: u64,
    /// Measured media length in seconds, 0 when unknown.
    pub media_duration_secs: u64,
    /// True when the raffle selected this entrant.
    pub selected: bool,
    /// Raffle rank, when drawn.
    pub rank: Option<u32>,
    /// True once crowned.
    pub winner: bool,
}

/// Aggregate event entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEntity {
    /// Primary key of the event.
    pub id: Uuid,
    /// Display name of the broadcast.
    pub name: String,
    /// Maximum number of selected contestants.
    pub capacity: usize,
    /// When entrant registration opens, if scheduled.
    pub registration_opens_at: Option<SystemTime>,
    /// When entrant registration closes, if scheduled.
    pub registration_closes_at: Option<SystemTime>,
    /// Admin-configured minutes for the fixed-duration phases.
    pub configured_minutes: IndexMap<PhaseName, u32>,
    /// Measured commercial reel length in seconds.
    pub commercial_seconds: u64,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the event entity was updated.
    pub updated_at: SystemTime,
    /// True while the broadcast is on air.
    pub live: bool,
    /// True while the operator has the clock stopped.
    pub paused: bool,
    /// Instant the running pause started.
    pub paused_at: Option<SystemTime>,
    /// Suppresses read-time auto-advance after a jump.
    pub manual_override: bool,
    /// Anchor instant the timeline was generated from.
    pub actual_start: Option<SystemTime>,
    /// Ordered phase list.
    pub phases: Vec<PhaseEntity>,
    /// Performance slots ordered by ordinal.
    pub slots: Vec<SlotEntity>,
    /// Append-only audit log of manual time adjustments.
    pub adjustments: Vec<AdjustmentEntity>,
    /// Executed raffle ledger, immutable once present.
    pub raffle: Option<RaffleEntity>,
    /// True between voting open and close.
    pub voting_open: bool,
    /// Deadline recorded when voting opened.
    pub voting_deadline: Option<SystemTime>,
    /// Winner outcome once computed.
    pub winner: Option<WinnerEntity>,
    /// Last roster snapshot pushed by the collaborator.
    pub roster: Vec<ContestantEntity>,
    /// Optimistic-concurrency version.
    pub version: u64,
}

/// Subset of [`EventEntity`] returned when listing events for operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventListItemEntity {
    /// Primary key of the event.
    pub id: Uuid,
    /// Display name of the broadcast.
    pub name: String,
    /// True while the broadcast is on air.
    pub live: bool,
    /// Last time the event entity was updated.
    pub updated_at: SystemTime,
}

impl From<&Phase> for PhaseEntity {
    fn from(value: &Phase) -> Self {
        Self {
            name: value.name,
            status: value.status,
            duration_minutes: value.duration_minutes,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
        }
    }
}

impl From<PhaseEntity> for Phase {
    fn from(value: PhaseEntity) -> Self {
        Self {
            name: value.name,
            status: value.status,
            duration_minutes: value.duration_minutes,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
        }
    }
}

impl From<&PerformanceSlot> for SlotEntity {
    fn from(value: &PerformanceSlot) -> Self {
        Self {
            contestant_id: value.contestant_id,
            position: value.position,
            video_duration_secs: value.video_duration_secs,
            status: value.status,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
        }
    }
}

impl From<SlotEntity> for PerformanceSlot {
    fn from(value: SlotEntity) -> Self {
        Self {
            contestant_id: value.contestant_id,
            position: value.position,
            video_duration_secs: value.video_duration_secs,
            status: value.status,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
        }
    }
}

impl From<&TimeAdjustment> for AdjustmentEntity {
    fn from(value: &TimeAdjustment) -> Self {
        Self {
            phase: value.phase,
            delta_minutes: value.delta_minutes,
            actor: value.actor.clone(),
            at: value.at,
        }
    }
}

impl From<AdjustmentEntity> for TimeAdjustment {
    fn from(value: AdjustmentEntity) -> Self {
        Self {
            phase: value.phase,
            delta_minutes: value.delta_minutes,
            actor: value.actor,
            at: value.at,
        }
    }
}

impl From<&RaffleRecord> for RaffleEntity {
    fn from(value: &RaffleRecord) -> Self {
        Self {
            seed: value.seed.clone(),
            drawn_at: value.drawn_at,
            entrant_count: value.entrant_count,
            draw_order: value.draw_order.clone(),
            results: value
                .results
                .iter()
                .map(|entry| RaffleEntryEntity {
                    entrant_id: entry.entrant_id,
                    position: entry.position,
                    random_value: entry.random_value,
                    outcome: entry.outcome,
                })
                .collect(),
        }
    }
}

impl From<RaffleEntity> for RaffleRecord {
    fn from(value: RaffleEntity) -> Self {
        Self {
            seed: value.seed,
            drawn_at: value.drawn_at,
            entrant_count: value.entrant_count,
            draw_order: value.draw_order,
            results: value
                .results
                .into_iter()
                .map(|entry| RaffleEntryResult {
                    entrant_id: entry.entrant_id,
                    position: entry.position,
                    random_value: entry.random_value,
                    outcome: entry.outcome,
                })
                .collect(),
        }
    }
}

impl From<&WinnerAnnouncement> for WinnerEntity {
    fn from(value: &WinnerAnnouncement) -> Self {
        match value {
            WinnerAnnouncement::Crowned {
                contestant_id,
                votes,
            } => WinnerEntity::Crowned {
                contestant_id: *contestant_id,
                votes: *votes,
            },
            WinnerAnnouncement::Tie {
                contestant_ids,
                votes,
            } => WinnerEntity::Tie {
                contestant_ids: contestant_ids.clone(),
                votes: *votes,
            },
            WinnerAnnouncement::NoContest { reason } => WinnerEntity::NoContest {
                reason: reason.clone(),
            },
        }
    }
}

impl From<WinnerEntity> for WinnerAnnouncement {
    fn from(value: WinnerEntity) -> Self {
        match value {
            WinnerEntity::Crowned {
                contestant_id,
                votes,
            } => WinnerAnnouncement::Crowned {
                contestant_id,
                votes,
            },
            WinnerEntity::Tie {
                contestant_ids,
                votes,
            } => WinnerAnnouncement::Tie {
                contestant_ids,
                votes,
            },
            WinnerEntity::NoContest { reason } => WinnerAnnouncement::NoContest { reason },
        }
    }
}

impl From<&Contestant> for ContestantEntity {
    fn from(value: &Contestant) -> Self {
        Self {
            id: value.id,
            display_name: value.display_name.clone(),
            votes: value.votes,
            media_duration_secs: value.media_duration_secs,
            selected: value.selected,
            rank: value.rank,
            winner: value.winner,
        }
    }
}

impl From<ContestantEntity> for Contestant {
    fn from(value: ContestantEntity) -> Self {
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

impl EventEntity {
    /// Snapshot an in-memory aggregate together with its roster cache.
    pub fn from_timeline(event: &EventTimeline, roster: &[Contestant]) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            capacity: event.capacity,
            registration_opens_at: event.registration_opens_at,
            registration_closes_at: event.registration_closes_at,
            configured_minutes: event.configured_minutes.clone(),
            commercial_seconds: event.commercial_seconds,
            created_at: event.created_at,
            updated_at: event.updated_at,
            live: event.live,
            paused: event.paused,
            paused_at: event.paused_at,
            manual_override: event.manual_override,
            actual_start: event.actual_start,
            phases: event.phases.iter().map(Into::into).collect(),
            slots: event.slots.iter().map(Into::into).collect(),
            adjustments: event.adjustments.iter().map(Into::into).collect(),
            raffle: event.raffle.as_ref().map(Into::into),
            voting_open: event.voting_open,
            voting_deadline: event.voting_deadline,
            winner: event.winner.as_ref().map(Into::into),
            roster: roster.iter().map(Into::into).collect(),
            version: event.version,
        }
    }

    /// Rehydrate the in-memory aggregate, handing the roster cache back too.
    pub fn into_timeline(self) -> (EventTimeline, Vec<Contestant>) {
        let roster = self.roster.into_iter().map(Into::into).collect();
        let timeline = EventTimeline {
            id: self.id,
            name: self.name,
            capacity: self.capacity,
            registration_opens_at: self.registration_opens_at,
            registration_closes_at: self.registration_closes_at,
            configured_minutes: self.configured_minutes,
            commercial_seconds: self.commercial_seconds,
            created_at: self.created_at,
            updated_at: self.updated_at,
            live: self.live,
            paused: self.paused,
            paused_at: self.paused_at,
            manual_override: self.manual_override,
            actual_start: self.actual_start,
            phases: self.phases.into_iter().map(Into::into).collect(),
            slots: self.slots.into_iter().map(Into::into).collect(),
            adjustments: self.adjustments.into_iter().map(Into::into).collect(),
            raffle: self.raffle.map(Into::into),
            voting_open: self.voting_open,
            voting_deadline: self.voting_deadline,
            winner: self.winner.map(Into::into),
            version: self.version,
        };
        (timeline, roster)
    }
}

impl From<&EventEntity> for EventListItemEntity {
    fn from(entity: &EventEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name.clone(),
            live: entity.live,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn entity_round_trip_preserves_the_aggregate() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let mut event = EventTimeline::new(
            Uuid::from_u128(7),
            "finale".into(),
            3,
            IndexMap::from([(PhaseName::Countdown, 5), (PhaseName::Voting, 10)]),
            None,
            Some(now),
            now,
        );
        event.generate_timeline(now);
        event.adjust_current_phase(2, "operator", now).unwrap();
        event.version = 4;

        let roster = vec![Contestant {
            id: Uuid::from_u128(9),
            display_name: "entry".into(),
            votes: 3,
            media_duration_secs: 120,
            selected: true,
            rank: Some(1),
            winner: false,
        }];

        let entity = EventEntity::from_timeline(&event, &roster);
        let (back, roster_back) = entity.into_timeline();

        assert_eq!(back.id, event.id);
        assert_eq!(back.phases, event.phases);
        assert_eq!(back.adjustments, event.adjustments);
        assert_eq!(back.version, 4);
        assert_eq!(roster_back, roster);
    }
}
