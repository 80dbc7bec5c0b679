//! Transparency DTOs for the verifiable selection raffle.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, validation::validate_seed},
    raffle::{RaffleOutcome, RaffleRecord},
};

/// One entrant's published draw result.
#[derive(Debug, Serialize, ToSchema)]
pub struct DisclosedEntry {
    pub entrant_id: Uuid,
    pub position: u32,
    pub random_value: u64,
    pub outcome: RaffleOutcome,
}

/// Everything needed to independently re-derive the draw.
#[derive(Debug, Serialize, ToSchema)]
pub struct RaffleDisclosureResponse {
    pub seed: String,
    pub drawn_at: String,
    pub entrant_count: usize,
    /// Entrant identities in the exact order they were drawn in.
    pub draw_order: Vec<Uuid>,
    pub results: Vec<DisclosedEntry>,
}

impl From<&RaffleRecord> for RaffleDisclosureResponse {
    fn from(record: &RaffleRecord) -> Self {
        Self {
            seed: record.seed.clone(),
            drawn_at: format_system_time(record.drawn_at),
            entrant_count: record.entrant_count,
            draw_order: record.draw_order.clone(),
            results: record
                .results
                .iter()
                .map(|entry| DisclosedEntry {
                    entrant_id: entry.entrant_id,
                    position: entry.position,
                    random_value: entry.random_value,
                    outcome: entry.outcome,
                })
                .collect(),
        }
    }
}

/// Request to re-run the draw derivation against a claimed outcome.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VerifyRequest {
    #[validate(custom(function = validate_seed))]
    pub seed: String,
    /// Entrants in their recorded draw order.
    pub entrants: Vec<Uuid>,
    /// The selection being checked.
    pub expected_selected: Vec<Uuid>,
    pub capacity: usize,
}

/// Result of a verification run.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// True when re-deriving the draw reproduces the claimed selection.
    pub passed: bool,
    pub seed: String,
    pub entrant_count: usize,
}
