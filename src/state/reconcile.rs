//! Read-time reconciliation: every status read sweeps expired phases
//! forward, repairs inconsistent slot state, and tops up a missing slot list,
//! all bounded so a stale clock can never loop a read forever.

use std::time::SystemTime;

use tracing::{debug, warn};

use crate::roster::Contestant;
use crate::state::effects::{self, WinnerAnnouncement};
use crate::state::phase::{PhaseName, PhaseStatus};
use crate::state::timeline::{AdvanceOutcome, EventTimeline};

/// What a reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Phases entered by the sweep, in order.
    pub entered: Vec<PhaseName>,
    /// Winner announcement computed during this pass, if any.
    pub announcement: Option<WinnerAnnouncement>,
    /// True when slot state was repaired or topped up.
    pub repaired: bool,
}

impl ReconcileReport {
    /// True when the pass mutated the aggregate and it should be persisted.
    pub fn changed(&self) -> bool {
        !self.entered.is_empty() || self.repaired
    }
}

/// Cheap check, safe under a read lock, for whether a sweep would mutate.
///
/// Lets the read-heavy status path skip the write lock entirely when the
/// timeline is already consistent. A sweep taken on a stale answer is
/// harmless: [`reconcile`] re-checks everything under the write lock.
pub fn sweep_due(event: &EventTimeline, roster: &[Contestant], now: SystemTime) -> bool {
    if !event.live || event.paused || event.manual_override {
        return false;
    }

    let duplicate_active_slots = event
        .slots
        .iter()
        .filter(|slot| slot.status == PhaseStatus::Active)
        .count()
        > 1;
    let missing_slots =
        event.slots.is_empty() && roster.iter().any(|contestant| contestant.selected);
    let phase_expired = event.active_phase().is_some_and(|phase| {
        !matches!(
            phase.name,
            PhaseName::Performance | PhaseName::Commercial
        ) && now >= phase.ends_at
    });

    duplicate_active_slots || missing_slots || phase_expired
}

/// Run one bounded reconciliation pass over a live event.
///
/// Paused events and events under a manual override are left untouched. The
/// commercial phase only advances on its explicit completion signal and the
/// performance phase only advances per slot, so both stop the sweep.
pub fn reconcile(
    event: &mut EventTimeline,
    roster: &[Contestant],
    now: SystemTime,
    max_steps: usize,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    if !event.live || event.paused || event.manual_override {
        return report;
    }

    repair_slots(event, &mut report);
    top_up_slots(event, roster, now, &mut report);

    for _ in 0..max_steps {
        let Some(active) = event.active_phase() else {
            break;
        };
        // Clock-driven advancement never applies to these two.
        if matches!(
            active.name,
            PhaseName::Performance | PhaseName::Commercial
        ) {
            break;
        }
        if now < active.ends_at {
            break;
        }

        match event.advance_phase(now) {
            AdvanceOutcome::Entered(entered) => {
                debug!(event_id = %event.id, phase = %entered, "auto-advanced expired phase");
                report.entered.push(entered);
                if let Some(announcement) = effects::apply_entry(event, entered, roster, now) {
                    report.announcement = Some(announcement);
                }
            }
            AdvanceOutcome::Finished => break,
        }
    }

    report
}

/// Collapse multiple active slots down to the lowest ordinal.
fn repair_slots(event: &mut EventTimeline, report: &mut ReconcileReport) {
    let mut seen_active = false;
    for slot in event.slots.iter_mut() {
        if slot.status == PhaseStatus::Active {
            if seen_active {
                slot.status = PhaseStatus::Pending;
                report.repaired = true;
            }
            seen_active = true;
        }
    }
    if report.repaired {
        warn!(event_id = %event.id, "repaired multiple active performance slots");
    }
}

/// Rebuild an empty slot list when the roster already has selections, so a
/// read never shows fewer performers than were selected.
fn top_up_slots(
    event: &mut EventTimeline,
    roster: &[Contestant],
    now: SystemTime,
    report: &mut ReconcileReport,
) {
    if !event.slots.is_empty() {
        return;
    }
    if roster.iter().any(|contestant| contestant.selected) {
        event.schedule_performances(roster, now);
        report.repaired = true;
        debug!(
            event_id = %event.id,
            slots = event.slots.len(),
            "topped up missing performance slots from roster"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use indexmap::IndexMap;
    use uuid::Uuid;

    use super::*;

    fn contestant(id: u128, votes: u64) -> Contestant {
        Contestant {
            id: Uuid::from_u128(id),
            display_name: format!("contestant-{id}"),
            votes,
            media_duration_secs: 60,
            selected: true,
            rank: Some(id as u32),
            winner: false,
        }
    }

    fn live_event(now: SystemTime) -> EventTimeline {
        let mut event = EventTimeline::new(
            Uuid::from_u128(3),
            "qualifier".into(),
            2,
            IndexMap::from([
                (PhaseName::Countdown, 1),
                (PhaseName::Welcome, 1),
                (PhaseName::Performance, 5),
                (PhaseName::Voting, 1),
                (PhaseName::Winner, 1),
                (PhaseName::ThankYou, 1),
            ]),
            None,
            None,
            now,
        );
        event.generate_timeline(now);
        event
    }

    #[test]
    fn expired_phases_advance_one_read_at_a_time() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);

        // First poll after the countdown expired enters welcome; the entered
        // phase is re-anchored at the poll instant, so it is not expired yet.
        let poll = start + Duration::from_secs(70);
        let report = reconcile(&mut event, &[], poll, 4);
        assert_eq!(report.entered, vec![PhaseName::Welcome]);

        // Next poll after welcome's fresh end enters performance, where the
        // sweep stops: performance is slot-driven.
        let poll = poll + Duration::from_secs(61);
        let report = reconcile(&mut event, &[], poll, 4);
        assert_eq!(report.entered, vec![PhaseName::Performance]);
        assert_eq!(event.active_phase().unwrap().name, PhaseName::Performance);
        assert_eq!(event.active_phase_count(), 1);
    }

    #[test]
    fn the_step_cap_bounds_chains_of_zero_width_phases() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = EventTimeline::new(
            Uuid::from_u128(4),
            "dry-run".into(),
            2,
            IndexMap::new(),
            None,
            None,
            start,
        );
        event.generate_timeline(start);

        // Every phase is zero-width, so each one is expired the instant it is
        // entered; only the cap stops the sweep.
        let report = reconcile(&mut event, &[], start, 1);
        assert_eq!(report.entered, vec![PhaseName::Welcome]);

        let report = reconcile(&mut event, &[], start, 4);
        assert_eq!(report.entered, vec![PhaseName::Performance]);
    }

    #[test]
    fn paused_or_overridden_events_are_left_alone() {
        let start = SystemTime::UNIX_EPOCH;
        let now = start + Duration::from_secs(600);

        let mut paused = live_event(start);
        paused.pause(start).unwrap();
        assert!(!reconcile(&mut paused, &[], now, 4).changed());
        assert_eq!(paused.active_phase().unwrap().name, PhaseName::Countdown);

        let mut overridden = live_event(start);
        overridden
            .jump_to_phase(PhaseName::Welcome, start)
            .unwrap();
        assert!(!reconcile(&mut overridden, &[], now, 4).changed());
        assert_eq!(overridden.active_phase().unwrap().name, PhaseName::Welcome);
    }

    #[test]
    fn commercial_waits_for_its_explicit_signal() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.commercial_seconds = 90;
        event.generate_timeline(start);
        event.jump_to_phase(PhaseName::Commercial, start).unwrap();
        event.manual_override = false;

        let now = start + Duration::from_secs(7_200);
        let report = reconcile(&mut event, &[], now, 4);
        assert!(report.entered.is_empty());
        assert_eq!(event.active_phase().unwrap().name, PhaseName::Commercial);
    }

    #[test]
    fn auto_advancing_into_winner_computes_the_announcement() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.jump_to_phase(PhaseName::Voting, start).unwrap();
        event.manual_override = false;

        let roster = vec![contestant(1, 7), contestant(2, 3)];
        let now = start + Duration::from_secs(120);
        let report = reconcile(&mut event, &roster, now, 4);

        assert!(report.entered.contains(&PhaseName::Winner));
        assert!(matches!(
            report.announcement,
            Some(WinnerAnnouncement::Crowned { contestant_id, .. })
                if contestant_id == Uuid::from_u128(1)
        ));
    }

    #[test]
    fn empty_slot_list_is_topped_up_from_selected_roster() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        let roster = vec![contestant(1, 0), contestant(2, 0)];

        let report = reconcile(&mut event, &roster, start, 4);
        assert!(report.repaired);
        assert_eq!(event.slots.len(), 2);
    }

    #[test]
    fn duplicate_active_slots_collapse_to_the_lowest_ordinal() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.schedule_performances(&[contestant(1, 0), contestant(2, 0)], start);
        event.slots[0].status = PhaseStatus::Active;
        event.slots[1].status = PhaseStatus::Active;

        let report = reconcile(&mut event, &[], start, 4);
        assert!(report.repaired);
        assert_eq!(event.slots[0].status, PhaseStatus::Active);
        assert_eq!(event.slots[1].status, PhaseStatus::Pending);
    }

    #[test]
    fn sweep_due_matches_what_a_pass_would_change() {
        let start = SystemTime::UNIX_EPOCH;

        // Consistent timeline, nothing expired: no sweep.
        let event = live_event(start);
        assert!(!sweep_due(&event, &[], start + Duration::from_secs(10)));

        // Expired countdown: due.
        assert!(sweep_due(&event, &[], start + Duration::from_secs(70)));

        // Paused events never sweep, expired or not.
        let mut paused = live_event(start);
        paused.pause(start).unwrap();
        assert!(!sweep_due(&paused, &[], start + Duration::from_secs(600)));

        // Empty slot list with selected roster entries: due.
        let event = live_event(start);
        assert!(sweep_due(&event, &[contestant(1, 0)], start));
    }

    #[test]
    fn repeated_reads_never_move_backwards() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        let mut last_index = 0usize;

        for elapsed in (0..600).step_by(30) {
            let now = start + Duration::from_secs(elapsed);
            reconcile(&mut event, &[], now, 4);
            if let Some(active) = event.active_phase() {
                let index = active.name.index();
                assert!(index >= last_index, "timeline moved backwards");
                last_index = index;
            }
        }
    }
}
