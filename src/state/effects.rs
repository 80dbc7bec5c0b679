//! Phase-entry side effects, centralized so every entry path (operator
//! advance, jump, restart, read-time auto-advance) runs the same logic
//! exactly once per transition.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::Contestant;
use crate::state::phase::{PhaseName, PhaseStatus};
use crate::state::timeline::EventTimeline;

/// Outcome of the winner computation, recorded once per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinnerAnnouncement {
    /// A single entry holds the top vote count.
    Crowned {
        /// The winning entry.
        contestant_id: Uuid,
        /// Its vote count at declaration time.
        votes: u64,
    },
    /// The top vote count is shared; no winner is declared.
    Tie {
        /// Every entry holding the shared top count, id ascending.
        contestant_ids: Vec<Uuid>,
        /// The shared vote count.
        votes: u64,
    },
    /// No winner could be declared.
    NoContest {
        /// Human-readable explanation.
        reason: String,
    },
}

/// Apply the side effects bound to entering a phase.
///
/// Returns the winner announcement when this entry just computed one, so the
/// caller can notify the roster and the auto-feature collaborator.
pub fn apply_entry(
    event: &mut EventTimeline,
    entered: PhaseName,
    roster: &[Contestant],
    now: SystemTime,
) -> Option<WinnerAnnouncement> {
    match entered {
        PhaseName::Voting => {
            event.voting_open = true;
            event.voting_deadline = event.active_phase().map(|phase| phase.ends_at);
            None
        }
        PhaseName::Winner => {
            event.voting_open = false;
            if event.winner.is_some() {
                return None;
            }
            let announcement = compute_winner(roster);
            event.winner = Some(announcement.clone());
            Some(announcement)
        }
        PhaseName::Performance => {
            ensure_first_slot_active(event, now);
            None
        }
        _ => None,
    }
}

/// Activate the first pending slot when performance begins with none active.
fn ensure_first_slot_active(event: &mut EventTimeline, now: SystemTime) {
    if event.active_slot().is_some() {
        return;
    }
    if let Some(first) = event
        .slots
        .iter_mut()
        .find(|slot| slot.status == PhaseStatus::Pending)
    {
        first.status = PhaseStatus::Active;
        first.starts_at = now;
        first.ends_at = now + Duration::from_secs(first.video_duration_secs);
    }
}

/// Rank entries by votes descending, id ascending for determinism, and
/// derive the announcement.
pub fn compute_winner(roster: &[Contestant]) -> WinnerAnnouncement {
    let mut entries: Vec<&Contestant> = roster.iter().collect();
    entries.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.id.cmp(&b.id)));

    let Some(top) = entries.first() else {
        return WinnerAnnouncement::NoContest {
            reason: "no entries took part in the vote".into(),
        };
    };
    if entries.iter().all(|entry| entry.votes == 0) {
        return WinnerAnnouncement::NoContest {
            reason: "no votes were cast".into(),
        };
    }

    let tied: Vec<Uuid> = entries
        .iter()
        .take_while(|entry| entry.votes == top.votes)
        .map(|entry| entry.id)
        .collect();
    if tied.len() > 1 {
        WinnerAnnouncement::Tie {
            contestant_ids: tied,
            votes: top.votes,
        }
    } else {
        WinnerAnnouncement::Crowned {
            contestant_id: top.id,
            votes: top.votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    fn voter(id: u128, votes: u64) -> Contestant {
        Contestant {
            id: Uuid::from_u128(id),
            display_name: format!("contestant-{id}"),
            votes,
            media_duration_secs: 120,
            selected: true,
            rank: Some(id as u32),
            winner: false,
        }
    }

    fn live_event(now: SystemTime) -> EventTimeline {
        let mut event = EventTimeline::new(
            Uuid::from_u128(9),
            "semifinal".into(),
            2,
            IndexMap::from([
                (PhaseName::Countdown, 1),
                (PhaseName::Welcome, 5),
                (PhaseName::Performance, 10),
                (PhaseName::Voting, 10),
                (PhaseName::Winner, 2),
                (PhaseName::ThankYou, 2),
            ]),
            None,
            None,
            now,
        );
        event.generate_timeline(now);
        event
    }

    #[test]
    fn shared_top_count_yields_a_tie_listing_the_tied_entries() {
        let roster = vec![voter(1, 5), voter(2, 5), voter(3, 3)];
        let announcement = compute_winner(&roster);
        assert_eq!(
            announcement,
            WinnerAnnouncement::Tie {
                contestant_ids: vec![Uuid::from_u128(1), Uuid::from_u128(2)],
                votes: 5,
            }
        );
    }

    #[test]
    fn zero_votes_or_zero_entries_yield_no_contest() {
        assert!(matches!(
            compute_winner(&[voter(1, 0), voter(2, 0), voter(3, 0)]),
            WinnerAnnouncement::NoContest { .. }
        ));
        assert!(matches!(
            compute_winner(&[]),
            WinnerAnnouncement::NoContest { .. }
        ));
    }

    #[test]
    fn clear_top_count_crowns_a_single_winner() {
        let announcement = compute_winner(&[voter(1, 7), voter(2, 3), voter(3, 1)]);
        assert_eq!(
            announcement,
            WinnerAnnouncement::Crowned {
                contestant_id: Uuid::from_u128(1),
                votes: 7,
            }
        );
    }

    #[test]
    fn entering_voting_records_the_deadline() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        event.jump_to_phase(PhaseName::Voting, now).unwrap();
        let effect = apply_entry(&mut event, PhaseName::Voting, &[], now);
        assert!(effect.is_none());
        assert!(event.voting_open);
        assert_eq!(
            event.voting_deadline,
            Some(event.active_phase().unwrap().ends_at)
        );
    }

    #[test]
    fn entering_winner_computes_the_announcement_exactly_once() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        event.voting_open = true;
        event.jump_to_phase(PhaseName::Winner, now).unwrap();

        let roster = vec![voter(1, 7), voter(2, 3)];
        let first = apply_entry(&mut event, PhaseName::Winner, &roster, now);
        assert!(first.is_some());
        assert!(!event.voting_open);

        // A second entry (e.g. jump back and forth) must not recompute.
        let second = apply_entry(&mut event, PhaseName::Winner, &roster, now);
        assert!(second.is_none());
        assert_eq!(
            event.winner,
            Some(WinnerAnnouncement::Crowned {
                contestant_id: Uuid::from_u128(1),
                votes: 7,
            })
        );
    }

    #[test]
    fn entering_performance_activates_the_first_pending_slot() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        let roster = vec![voter(1, 0), voter(2, 0)];
        event.schedule_performances(&roster, now);

        apply_entry(&mut event, PhaseName::Performance, &roster, now);
        assert_eq!(event.slots[0].status, PhaseStatus::Active);
        assert_eq!(event.slots[0].starts_at, now);

        // Re-entry with a slot already active leaves it alone.
        apply_entry(&mut event, PhaseName::Performance, &roster, now);
        assert_eq!(
            event
                .slots
                .iter()
                .filter(|slot| slot.status == PhaseStatus::Active)
                .count(),
            1
        );
    }
}
