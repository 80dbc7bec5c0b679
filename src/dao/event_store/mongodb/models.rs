use indexmap::IndexMap;
use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::dao::models::{
    AdjustmentEntity, ContestantEntity, EventEntity, PhaseEntity, RaffleEntity, SlotEntity,
    WinnerEntity,
};
use crate::state::phase::PhaseName;

/// Mongo projection of an [`EventEntity`].
///
/// Top-level timestamps become BSON datetimes so they sort and index
/// natively; nested entities serialize as-is. `version` is stored as `i64`
/// so the optimistic save filter can match on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    capacity: usize,
    registration_opens_at: Option<SystemTime>,
    registration_closes_at: Option<SystemTime>,
    configured_minutes: IndexMap<PhaseName, u32>,
    commercial_seconds: u64,
    created_at: DateTime,
    updated_at: DateTime,
    live: bool,
    paused: bool,
    paused_at: Option<SystemTime>,
    manual_override: bool,
    actual_start: Option<SystemTime>,
    phases: Vec<PhaseEntity>,
    slots: Vec<SlotEntity>,
    adjustments: Vec<AdjustmentEntity>,
    raffle: Option<RaffleEntity>,
    voting_open: bool,
    voting_deadline: Option<SystemTime>,
    winner: Option<WinnerEntity>,
    #[serde(default)]
    roster: Vec<ContestantEntity>,
    version: i64,
}

impl From<EventEntity> for MongoEventDocument {
    fn from(value: EventEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            capacity: value.capacity,
            registration_opens_at: value.registration_opens_at,
            registration_closes_at: value.registration_closes_at,
            configured_minutes: value.configured_minutes,
            commercial_seconds: value.commercial_seconds,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            live: value.live,
            paused: value.paused,
            paused_at: value.paused_at,
            manual_override: value.manual_override,
            actual_start: value.actual_start,
            phases: value.phases,
            slots: value.slots,
            adjustments: value.adjustments,
            raffle: value.raffle,
            voting_open: value.voting_open,
            voting_deadline: value.voting_deadline,
            winner: value.winner,
            roster: value.roster,
            version: value.version as i64,
        }
    }
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            capacity: value.capacity,
            registration_opens_at: value.registration_opens_at,
            registration_closes_at: value.registration_closes_at,
            configured_minutes: value.configured_minutes,
            commercial_seconds: value.commercial_seconds,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            live: value.live,
            paused: value.paused,
            paused_at: value.paused_at,
            manual_override: value.manual_override,
            actual_start: value.actual_start,
            phases: value.phases,
            slots: value.slots,
            adjustments: value.adjustments,
            raffle: value.raffle,
            voting_open: value.voting_open,
            voting_deadline: value.voting_deadline,
            winner: value.winner,
            roster: value.roster,
            version: value.version as u64,
        }
    }
}

fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

/// Filter matching the document only at the version the caller loaded.
pub fn doc_id_at_version(id: Uuid, version: u64) -> Document {
    doc! {"_id": uuid_as_binary(id), "version": version as i64}
}
