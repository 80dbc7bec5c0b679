//! Collaborator seams owned by external systems: the contestant roster and
//! the winner auto-feature placement. The core never owns contestant identity
//! or media storage; it works against snapshots pushed by the roster service.

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::info;
use uuid::Uuid;

use crate::raffle::{RaffleEntryResult, RaffleOutcome};

/// One roster entry as the external roster service describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contestant {
    /// Identity owned by the roster service.
    pub id: Uuid,
    /// Display name for projections.
    pub display_name: String,
    /// Current vote tally.
    pub votes: u64,
    /// Measured duration of the uploaded performance media, 0 when unknown.
    pub media_duration_secs: u64,
    /// True once the raffle (or an approval) granted a performance slot.
    pub selected: bool,
    /// Raffle rank when one was drawn; drives performance ordering.
    pub rank: Option<u32>,
    /// Permanent winner flag; survives bulk cleanup of non-winning entries.
    pub winner: bool,
}

/// Read/write seam to the roster collaborator.
pub trait RosterProvider: Send + Sync {
    /// Current roster snapshot for an event, in the collaborator's order.
    fn contestants(&self, event_id: Uuid) -> BoxFuture<'static, Vec<Contestant>>;

    /// Replace the cached snapshot with the latest push from the collaborator.
    fn sync_snapshot(
        &self,
        event_id: Uuid,
        entries: Vec<Contestant>,
    ) -> BoxFuture<'static, usize>;

    /// Permanently flag an entry as event winner.
    fn mark_winner(&self, event_id: Uuid, contestant_id: Uuid) -> BoxFuture<'static, ()>;

    /// Record each entrant's raffle rank and selection outcome.
    fn mark_raffle_outcomes(
        &self,
        event_id: Uuid,
        results: Vec<RaffleEntryResult>,
    ) -> BoxFuture<'static, ()>;
}

/// In-memory roster cache fed through the roster sync endpoint.
#[derive(Debug, Default)]
pub struct SnapshotRoster {
    entries: DashMap<Uuid, Vec<Contestant>>,
}

impl SnapshotRoster {
    /// Create an empty roster cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RosterProvider for SnapshotRoster {
    fn contestants(&self, event_id: Uuid) -> BoxFuture<'static, Vec<Contestant>> {
        let snapshot = self
            .entries
            .get(&event_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Box::pin(async move { snapshot })
    }

    fn sync_snapshot(
        &self,
        event_id: Uuid,
        mut entries: Vec<Contestant>,
    ) -> BoxFuture<'static, usize> {
        // Winner flags are permanent; a sync that drops one is repaired here.
        if let Some(previous) = self.entries.get(&event_id) {
            for entry in entries.iter_mut() {
                if previous
                    .iter()
                    .any(|old| old.id == entry.id && old.winner)
                {
                    entry.winner = true;
                }
            }
        }
        let count = entries.len();
        self.entries.insert(event_id, entries);
        Box::pin(async move { count })
    }

    fn mark_winner(&self, event_id: Uuid, contestant_id: Uuid) -> BoxFuture<'static, ()> {
        if let Some(mut entries) = self.entries.get_mut(&event_id) {
            for entry in entries.iter_mut() {
                if entry.id == contestant_id {
                    entry.winner = true;
                }
            }
        }
        Box::pin(async move {})
    }

    fn mark_raffle_outcomes(
        &self,
        event_id: Uuid,
        results: Vec<RaffleEntryResult>,
    ) -> BoxFuture<'static, ()> {
        if let Some(mut entries) = self.entries.get_mut(&event_id) {
            for entry in entries.iter_mut() {
                if let Some(result) = results.iter().find(|r| r.entrant_id == entry.id) {
                    entry.rank = Some(result.position);
                    entry.selected = result.outcome == RaffleOutcome::Selected;
                }
            }
        }
        Box::pin(async move {})
    }
}

/// Fire-and-forget promotional placement for the declared winner.
///
/// Failures are logged by callers and never propagate into the phase
/// transition that triggered the feature.
pub trait FeatureSink: Send + Sync {
    /// Grant the winning entry its time-boxed promotional placement.
    fn feature_winner(
        &self,
        event_id: Uuid,
        contestant_id: Uuid,
    ) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// Default sink that records the grant in the logs.
#[derive(Debug, Default)]
pub struct LogFeatureSink;

impl FeatureSink for LogFeatureSink {
    fn feature_winner(
        &self,
        event_id: Uuid,
        contestant_id: Uuid,
    ) -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(async move {
            info!(%event_id, %contestant_id, "auto-featuring winning entry");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contestant(id: u128) -> Contestant {
        Contestant {
            id: Uuid::from_u128(id),
            display_name: format!("contestant-{id}"),
            votes: 0,
            media_duration_secs: 0,
            selected: false,
            rank: None,
            winner: false,
        }
    }

    #[tokio::test]
    async fn winner_flag_survives_snapshot_resync() {
        let roster = SnapshotRoster::new();
        let event_id = Uuid::from_u128(1);

        roster
            .sync_snapshot(event_id, vec![contestant(1), contestant(2)])
            .await;
        roster.mark_winner(event_id, Uuid::from_u128(2)).await;

        // Fresh push from the collaborator without the winner flag.
        roster
            .sync_snapshot(event_id, vec![contestant(1), contestant(2)])
            .await;

        let entries = roster.contestants(event_id).await;
        assert!(entries.iter().any(|c| c.id == Uuid::from_u128(2) && c.winner));
    }

    #[tokio::test]
    async fn raffle_outcomes_set_rank_and_selection() {
        let roster = SnapshotRoster::new();
        let event_id = Uuid::from_u128(7);
        roster
            .sync_snapshot(event_id, vec![contestant(1), contestant(2)])
            .await;

        roster
            .mark_raffle_outcomes(
                event_id,
                vec![
                    RaffleEntryResult {
                        entrant_id: Uuid::from_u128(2),
                        position: 1,
                        random_value: 10,
                        outcome: RaffleOutcome::Selected,
                    },
                    RaffleEntryResult {
                        entrant_id: Uuid::from_u128(1),
                        position: 2,
                        random_value: 20,
                        outcome: RaffleOutcome::Waitlisted,
                    },
                ],
            )
            .await;

        let entries = roster.contestants(event_id).await;
        let second = entries.iter().find(|c| c.id == Uuid::from_u128(2)).unwrap();
        assert!(second.selected);
        assert_eq!(second.rank, Some(1));
        let first = entries.iter().find(|c| c.id == Uuid::from_u128(1)).unwrap();
        assert!(!first.selected);
        assert_eq!(first.rank, Some(2));
    }
}
