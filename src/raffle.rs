//! Deterministic, publicly verifiable raffle used to pick performers when more
//! entrants register than the event has slots.
//!
//! System randomness is used exactly once, to generate the seed. Everything
//! derived from the seed is reproducible by any observer holding the seed and
//! the entrant list in draw order.

use std::collections::HashSet;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of random bytes backing a generated seed (rendered as hex).
const SEED_BYTES: usize = 16;

/// Outcome of the draw for a single entrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RaffleOutcome {
    /// Ranked within capacity; gets a performance slot.
    Selected,
    /// Ranked past capacity; queued in rank order.
    Waitlisted,
}

/// Per-entrant result of an executed draw. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleEntryResult {
    /// Identity of the entrant as supplied by the roster.
    pub entrant_id: Uuid,
    /// Rank, starting at 1 for the best random value.
    pub position: u32,
    /// Deterministic value derived from the seed and the entrant's draw index.
    pub random_value: u64,
    /// Selected or waitlisted.
    pub outcome: RaffleOutcome,
}

/// Complete record of one executed raffle, persisted append-only with the
/// event so verification keeps working after roster rows are cleaned up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleRecord {
    /// Public seed the ranking derives from.
    pub seed: String,
    /// Instant the draw was executed.
    pub drawn_at: SystemTime,
    /// Number of entrants that took part.
    pub entrant_count: usize,
    /// Entrant identities in the exact order they were drawn in.
    pub draw_order: Vec<Uuid>,
    /// Ranked results, ascending by position.
    pub results: Vec<RaffleEntryResult>,
}

impl RaffleRecord {
    /// Identities of the selected entrants.
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.results
            .iter()
            .filter(|entry| entry.outcome == RaffleOutcome::Selected)
            .map(|entry| entry.entrant_id)
            .collect()
    }
}

/// Errors raised while executing a draw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaffleError {
    /// The entrant list was empty.
    #[error("nothing to raffle: the entrant list is empty")]
    NoEntrants,
}

/// Generate a fresh seed from system randomness (32 lowercase hex chars).
pub fn generate_seed() -> String {
    hex::encode(rand::random::<[u8; SEED_BYTES]>())
}

/// Deterministic random value for the entrant at `index` in the draw order.
///
/// First eight bytes of `SHA-256(seed + "-" + index)` read big-endian.
pub fn random_value_for(seed: &str, index: usize) -> u64 {
    let digest = Sha256::digest(format!("{seed}-{index}").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Rank all entrants ascending by their derived random value.
///
/// Ties in the random value break by entrant id so the procedure stays
/// reproducible even in the astronomically unlikely collision case. The first
/// `capacity` ranks are selected, the remainder waitlisted.
pub fn rank_entrants(seed: &str, entrants: &[Uuid], capacity: usize) -> Vec<RaffleEntryResult> {
    let mut ranked: Vec<(Uuid, u64)> = entrants
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, random_value_for(seed, index)))
        .collect();
    ranked.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (entrant_id, random_value))| RaffleEntryResult {
            entrant_id,
            position: (rank + 1) as u32,
            random_value,
            outcome: if rank < capacity {
                RaffleOutcome::Selected
            } else {
                RaffleOutcome::Waitlisted
            },
        })
        .collect()
}

/// Execute the draw, generating a seed when none is supplied.
///
/// A capacity at or above the entrant count selects everyone.
pub fn draw(
    seed: Option<String>,
    entrants: &[Uuid],
    capacity: usize,
    now: SystemTime,
) -> Result<RaffleRecord, RaffleError> {
    if entrants.is_empty() {
        return Err(RaffleError::NoEntrants);
    }

    let seed = seed.unwrap_or_else(generate_seed);
    let results = rank_entrants(&seed, entrants, capacity);

    Ok(RaffleRecord {
        seed,
        drawn_at: now,
        entrant_count: entrants.len(),
        draw_order: entrants.to_vec(),
        results,
    })
}

/// Recompute the ranking from public inputs and check the selected set.
///
/// Order-insensitive set equality on the top-`capacity` identities; any
/// observer with the seed and the full entrant list can run this.
pub fn verify(
    seed: &str,
    entrants: &[Uuid],
    expected_selected: &[Uuid],
    capacity: usize,
) -> bool {
    if entrants.is_empty() {
        return expected_selected.is_empty();
    }

    let recomputed: HashSet<Uuid> = rank_entrants(seed, entrants, capacity)
        .into_iter()
        .filter(|entry| entry.outcome == RaffleOutcome::Selected)
        .map(|entry| entry.entrant_id)
        .collect();
    let expected: HashSet<Uuid> = expected_selected.iter().copied().collect();

    recomputed == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entrants(count: usize) -> Vec<Uuid> {
        (0..count as u128).map(Uuid::from_u128).collect()
    }

    #[test]
    fn draw_rejects_empty_entrant_list() {
        let err = draw(Some("abc".into()), &[], 3, SystemTime::now()).unwrap_err();
        assert_eq!(err, RaffleError::NoEntrants);
    }

    #[test]
    fn fixed_seed_yields_identical_selection_on_independent_copies() {
        let first = entrants(10);
        let second = first.clone();

        let a = draw(Some("abc".into()), &first, 3, SystemTime::now()).unwrap();
        let b = draw(Some("abc".into()), &second, 3, SystemTime::now()).unwrap();

        assert_eq!(a.selected_ids(), b.selected_ids());
        assert_eq!(a.results, b.results);
        assert_eq!(a.selected_ids().len(), 3);
    }

    #[test]
    fn positions_are_contiguous_from_one() {
        let record = draw(Some("abc".into()), &entrants(6), 2, SystemTime::now()).unwrap();
        let positions: Vec<u32> = record.results.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);
        assert!(
            record
                .results
                .iter()
                .skip(2)
                .all(|r| r.outcome == RaffleOutcome::Waitlisted)
        );
    }

    #[test]
    fn capacity_at_or_above_entrant_count_selects_everyone() {
        let record = draw(Some("seed".into()), &entrants(4), 9, SystemTime::now()).unwrap();
        assert_eq!(record.selected_ids().len(), 4);
    }

    #[test]
    fn verify_accepts_the_produced_selection() {
        let ids = entrants(10);
        let record = draw(Some("abc".into()), &ids, 3, SystemTime::now()).unwrap();
        assert!(verify(&record.seed, &ids, &record.selected_ids(), 3));
    }

    #[test]
    fn verify_rejects_mutated_seed_or_entrant() {
        let ids = entrants(10);
        let record = draw(Some("abc".into()), &ids, 3, SystemTime::now()).unwrap();
        let selected = record.selected_ids();

        assert!(!verify("abd", &ids, &selected, 3));

        // Swap the identity of a selected entrant; the recomputed set can no
        // longer match the published one.
        let victim = selected[0];
        let index = ids.iter().position(|id| *id == victim).unwrap();
        let mut tampered = ids.clone();
        tampered[index] = Uuid::from_u128(999);
        assert!(!verify(&record.seed, &tampered, &selected, 3));
    }

    #[test]
    fn random_values_are_independent_of_system_randomness() {
        let a = random_value_for("abc", 0);
        let b = random_value_for("abc", 0);
        assert_eq!(a, b);
        assert_ne!(random_value_for("abc", 0), random_value_for("abc", 1));
    }

    #[test]
    fn generated_seeds_are_hex_and_distinct() {
        let a = generate_seed();
        let b = generate_seed();
        assert_eq!(a.len(), SEED_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }
}
