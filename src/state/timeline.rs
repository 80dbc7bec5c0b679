//! Event timeline aggregate: the ordered phase list, the performance slot
//! list, and every operator-facing mutation (advance, pause/resume, time
//! adjustment, jump, restart). All operations are synchronous mutations of a
//! single aggregate; callers serialize access per event.

use std::time::{Duration, SystemTime};

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::raffle::RaffleRecord;
use crate::roster::Contestant;
use crate::state::effects::WinnerAnnouncement;
use crate::state::phase::{PHASE_ORDER, PhaseName, PhaseStatus};

/// Padding added after the last performance before the phase can end.
pub const PERFORMANCE_FLOOR_SECS: u64 = 3;
/// Slot length used when neither the slot nor the contestant carries one.
pub const DEFAULT_SLOT_SECS: u64 = 300;

/// One stage of the broadcast with computed absolute instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    /// Which stage this is.
    pub name: PhaseName,
    /// Pending, active, or completed.
    pub status: PhaseStatus,
    /// Planned length in whole minutes. Zero-width phases are retained so
    /// index-based logic downstream stays stable.
    pub duration_minutes: u32,
    /// Computed start instant.
    pub starts_at: SystemTime,
    /// Computed end instant.
    pub ends_at: SystemTime,
}

/// One contestant's turn inside the performance phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceSlot {
    /// Contestant owning this turn; identity lives with the roster service.
    pub contestant_id: Uuid,
    /// Ordinal, contiguous from 0.
    pub position: usize,
    /// Authoritative media length in seconds for this slot.
    pub video_duration_secs: u64,
    /// Pending, active, or completed.
    pub status: PhaseStatus,
    /// Computed start instant (meaningful once the event is live).
    pub starts_at: SystemTime,
    /// Computed end instant.
    pub ends_at: SystemTime,
}

/// Audit record of one manual extend/reduce action. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAdjustment {
    /// Phase that was adjusted.
    pub phase: PhaseName,
    /// Signed delta in minutes.
    pub delta_minutes: i64,
    /// Operator that issued the command.
    pub actor: String,
    /// When the adjustment was applied.
    pub at: SystemTime,
}

/// Result of advancing the timeline by one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The named phase just became active.
    Entered(PhaseName),
    /// No further phase remains; the event is over.
    Finished,
}

/// Result of advancing the performance slot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAdvance {
    /// The slot at this ordinal just became active.
    NextSlot(usize),
    /// The last slot completed and the performance phase advanced.
    PerformanceComplete(AdvanceOutcome),
}

/// Errors raised by timeline mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The event has not gone live yet.
    #[error("event is not live")]
    NotLive,
    /// The event already has a generated timeline.
    #[error("event is already live")]
    AlreadyLive,
    /// No phase currently holds the active status.
    #[error("no phase is currently active")]
    NoActivePhase,
    /// A reduction would move the active phase's end into the past.
    #[error("reduction exceeds remaining time: at most {max_minutes} minute(s) can be removed")]
    ReductionTooLarge {
        /// Largest reduction (whole minutes) that would still be accepted.
        max_minutes: i64,
    },
    /// The operation only applies while the performance phase is active.
    #[error("the performance phase is not active")]
    NotInPerformance,
}

/// Aggregate for one event's authoritative timeline.
///
/// Invariants: at most one active phase, phases before it completed and after
/// it pending; slot ordinals contiguous from 0 with at most one active slot.
#[derive(Debug, Clone)]
pub struct EventTimeline {
    /// Event identity.
    pub id: Uuid,
    /// Display name of the broadcast.
    pub name: String,
    /// Maximum number of selected contestants.
    pub capacity: usize,
    /// When entrant registration opens, if scheduled.
    pub registration_opens_at: Option<SystemTime>,
    /// When entrant registration closes, if scheduled.
    pub registration_closes_at: Option<SystemTime>,
    /// Admin-configured minutes for the fixed-duration phases; also holds the
    /// provisional performance value used before contestants are scheduled.
    pub configured_minutes: IndexMap<PhaseName, u32>,
    /// Measured runtime of the commercial reel in seconds, 0 when absent.
    pub commercial_seconds: u64,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last mutation timestamp.
    pub updated_at: SystemTime,
    /// True while the broadcast is on air.
    pub live: bool,
    /// True while the operator has the clock stopped.
    pub paused: bool,
    /// Instant the running pause started.
    pub paused_at: Option<SystemTime>,
    /// Set by a phase jump; suppresses read-time auto-advance.
    pub manual_override: bool,
    /// Anchor instant the timeline was generated from.
    pub actual_start: Option<SystemTime>,
    /// Ordered phase list; empty until the event goes live.
    pub phases: Vec<Phase>,
    /// Performance slots ordered by ordinal.
    pub slots: Vec<PerformanceSlot>,
    /// Append-only audit log of manual time adjustments.
    pub adjustments: Vec<TimeAdjustment>,
    /// Executed raffle, immutable once present.
    pub raffle: Option<RaffleRecord>,
    /// True between voting open and close.
    pub voting_open: bool,
    /// Deadline recorded when voting opened.
    pub voting_deadline: Option<SystemTime>,
    /// Winner announcement once computed.
    pub winner: Option<WinnerAnnouncement>,
    /// Optimistic-concurrency version, bumped on every persisted mutation.
    pub version: u64,
}

/// First positive value wins: slot-recorded duration, then the contestant's
/// own media duration, then the caller-chosen fallback.
pub fn resolve_duration_secs(slot_secs: u64, contestant_secs: u64, fallback: u64) -> u64 {
    if slot_secs > 0 {
        slot_secs
    } else if contestant_secs > 0 {
        contestant_secs
    } else {
        fallback
    }
}

fn minutes(count: u32) -> Duration {
    Duration::from_secs(u64::from(count) * 60)
}

fn shift(instant: SystemTime, delta_secs: i64) -> SystemTime {
    if delta_secs >= 0 {
        instant + Duration::from_secs(delta_secs as u64)
    } else {
        instant - Duration::from_secs(delta_secs.unsigned_abs())
    }
}

impl EventTimeline {
    /// Build a new event aggregate before it goes live.
    pub fn new(
        id: Uuid,
        name: String,
        capacity: usize,
        configured_minutes: IndexMap<PhaseName, u32>,
        registration_opens_at: Option<SystemTime>,
        registration_closes_at: Option<SystemTime>,
        now: SystemTime,
    ) -> Self {
        Self {
            id,
            name,
            capacity,
            registration_opens_at,
            registration_closes_at,
            configured_minutes,
            commercial_seconds: 0,
            created_at: now,
            updated_at: now,
            live: false,
            paused: false,
            paused_at: None,
            manual_override: false,
            actual_start: None,
            phases: Vec::new(),
            slots: Vec::new(),
            adjustments: Vec::new(),
            raffle: None,
            voting_open: false,
            voting_deadline: None,
            winner: None,
            version: 0,
        }
    }

    /// Currently active phase, if any.
    pub fn active_phase(&self) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|phase| phase.status == PhaseStatus::Active)
    }

    fn active_phase_index(&self) -> Option<usize> {
        self.phases
            .iter()
            .position(|phase| phase.status == PhaseStatus::Active)
    }

    /// Currently active performance slot, if any.
    pub fn active_slot(&self) -> Option<&PerformanceSlot> {
        self.slots
            .iter()
            .find(|slot| slot.status == PhaseStatus::Active)
    }

    /// Seconds left before the active phase ends, 0 when already past.
    pub fn remaining_secs(&self, now: SystemTime) -> u64 {
        self.active_phase()
            .and_then(|phase| phase.ends_at.duration_since(now).ok())
            .map(|remaining| remaining.as_secs())
            .unwrap_or(0)
    }

    /// Total seconds of scheduled performances including the closing floor.
    pub fn performance_total_secs(&self) -> u64 {
        let sum: u64 = self.slots.iter().map(|slot| slot.video_duration_secs).sum();
        if self.slots.is_empty() {
            0
        } else {
            sum + PERFORMANCE_FLOOR_SECS
        }
    }

    /// Planned minutes for one phase, deriving measured phases from media.
    pub fn planned_minutes(&self, name: PhaseName) -> u32 {
        match name {
            PhaseName::Performance => {
                let measured = self.performance_total_secs();
                if measured == 0 {
                    self.configured_minutes.get(&name).copied().unwrap_or(0)
                } else {
                    measured.div_ceil(60) as u32
                }
            }
            PhaseName::Commercial => self.commercial_seconds.div_ceil(60) as u32,
            _ => self.configured_minutes.get(&name).copied().unwrap_or(0),
        }
    }

    /// Generate the ordered phase list anchored at `now` and go live.
    ///
    /// The only place absolute instants are derived from relative durations:
    /// start/end walk the list accumulating planned minutes. The first phase
    /// starts active, everything later pending.
    pub fn generate_timeline(&mut self, now: SystemTime) {
        let mut cursor = now;
        let phases: Vec<Phase> = PHASE_ORDER
            .iter()
            .map(|name| {
                let duration = self.planned_minutes(*name);
                let starts_at = cursor;
                cursor += minutes(duration);
                Phase {
                    name: *name,
                    status: PhaseStatus::Pending,
                    duration_minutes: duration,
                    starts_at,
                    ends_at: cursor,
                }
            })
            .collect();
        self.phases = phases;
        if let Some(first) = self.phases.first_mut() {
            first.status = PhaseStatus::Active;
        }

        self.live = true;
        self.actual_start = Some(now);
        self.paused = false;
        self.paused_at = None;
        self.relayout_pending_slots();
        self.updated_at = now;
    }

    /// Recompute every pending phase after `index` by walking from the end
    /// of the nearest earlier phase with settled instants.
    ///
    /// Active and completed phases keep the instants they were anchored at;
    /// only pending phases stack behind them. A reschedule therefore never
    /// moves a phase the clock already reached.
    fn relayout_after(&mut self, index: usize) {
        let mut cursor = self.phases[index].ends_at;
        for phase in self.phases.iter_mut().skip(index + 1) {
            if phase.status != PhaseStatus::Pending {
                cursor = phase.ends_at;
                continue;
            }
            phase.starts_at = cursor;
            phase.ends_at = cursor + minutes(phase.duration_minutes);
            cursor = phase.ends_at;
        }
    }

    /// Re-walk pending slot instants from the end of the last settled slot,
    /// or the performance phase start when no slot has run yet.
    fn relayout_pending_slots(&mut self) {
        let Some(perf) = self
            .phases
            .iter()
            .find(|phase| phase.name == PhaseName::Performance)
        else {
            return;
        };
        let mut cursor = self
            .slots
            .iter()
            .filter(|slot| slot.status != PhaseStatus::Pending)
            .map(|slot| slot.ends_at)
            .max()
            .unwrap_or(perf.starts_at);
        for slot in self
            .slots
            .iter_mut()
            .filter(|slot| slot.status == PhaseStatus::Pending)
        {
            slot.starts_at = cursor;
            slot.ends_at = cursor + Duration::from_secs(slot.video_duration_secs);
            cursor = slot.ends_at;
        }
    }

    /// Rebuild the performance slot list from the supplied roster.
    ///
    /// Selected contestants only, ordered by raffle rank, then by votes.
    /// Idempotent overwrite: an already active or completed slot keeps its
    /// status and instants only when the same contestant retains the same
    /// ordinal. Afterwards the performance phase's duration and every later
    /// phase's instants are recomputed.
    pub fn schedule_performances(&mut self, contestants: &[Contestant], now: SystemTime) {
        let mut selected: Vec<&Contestant> =
            contestants.iter().filter(|c| c.selected).collect();
        selected.sort_by(|a, b| match (a.rank, b.rank) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.votes.cmp(&a.votes).then(a.id.cmp(&b.id)),
        });

        let known: Vec<u64> = self
            .slots
            .iter()
            .map(|slot| slot.video_duration_secs)
            .filter(|secs| *secs > 0)
            .collect();
        let average = if known.is_empty() {
            0
        } else {
            known.iter().sum::<u64>() / known.len() as u64
        };
        let fallback = if average > 0 { average } else { DEFAULT_SLOT_SECS };

        let previous = std::mem::take(&mut self.slots);
        self.slots = selected
            .iter()
            .enumerate()
            .map(|(position, contestant)| {
                let carried = previous
                    .get(position)
                    .filter(|old| old.contestant_id == contestant.id);
                // Only settled slots keep their recorded duration; a pending
                // slot re-resolves so a later media measurement takes effect.
                let slot_secs = carried
                    .filter(|old| old.status != PhaseStatus::Pending)
                    .map(|old| old.video_duration_secs)
                    .unwrap_or(0);
                let duration =
                    resolve_duration_secs(slot_secs, contestant.media_duration_secs, fallback);
                match carried {
                    Some(old) if old.status != PhaseStatus::Pending => PerformanceSlot {
                        contestant_id: contestant.id,
                        position,
                        video_duration_secs: duration,
                        status: old.status,
                        starts_at: old.starts_at,
                        ends_at: old.ends_at,
                    },
                    _ => PerformanceSlot {
                        contestant_id: contestant.id,
                        position,
                        video_duration_secs: duration,
                        status: PhaseStatus::Pending,
                        starts_at: now,
                        ends_at: now + Duration::from_secs(duration),
                    },
                }
            })
            .collect();

        if let Some(index) = self
            .phases
            .iter()
            .position(|phase| phase.name == PhaseName::Performance)
        {
            let duration = self.planned_minutes(PhaseName::Performance);
            let phase = &mut self.phases[index];
            phase.duration_minutes = duration;
            if phase.status != PhaseStatus::Completed {
                phase.ends_at = phase.starts_at + minutes(duration);
            }
            self.relayout_after(index);
            self.relayout_pending_slots();
        }
        self.updated_at = now;
    }

    /// Complete the active phase and activate the next pending one.
    ///
    /// Returns the entered phase, or `Finished` when nothing remains; an
    /// advance with no active phase and no pending successor is an absorbed
    /// no-op, never an error.
    pub fn advance_phase(&mut self, now: SystemTime) -> AdvanceOutcome {
        if let Some(index) = self.active_phase_index() {
            if self.phases[index].name == PhaseName::Performance {
                for slot in self
                    .slots
                    .iter_mut()
                    .filter(|slot| slot.status == PhaseStatus::Active)
                {
                    slot.status = PhaseStatus::Completed;
                }
            }
            self.phases[index].status = PhaseStatus::Completed;
        }

        let Some(next) = self
            .phases
            .iter_mut()
            .find(|phase| phase.status == PhaseStatus::Pending)
        else {
            self.live = false;
            self.updated_at = now;
            return AdvanceOutcome::Finished;
        };

        next.status = PhaseStatus::Active;
        next.starts_at = now;
        next.ends_at = now + minutes(next.duration_minutes);
        let entered = next.name;
        let index = entered.index();
        self.relayout_after(index);
        // An explicit advance hands the timeline back to the clock after a
        // jump; auto-advance resumes from here.
        self.manual_override = false;
        self.updated_at = now;
        AdvanceOutcome::Entered(entered)
    }

    /// Complete the active performance slot and start the next one.
    pub fn advance_slot(&mut self, now: SystemTime) -> Result<SlotAdvance, TimelineError> {
        let in_performance = self
            .active_phase()
            .map(|phase| phase.name == PhaseName::Performance)
            .unwrap_or(false);
        if !in_performance {
            return Err(TimelineError::NotInPerformance);
        }

        if let Some(active) = self
            .slots
            .iter_mut()
            .find(|slot| slot.status == PhaseStatus::Active)
        {
            active.status = PhaseStatus::Completed;
            active.ends_at = now;
        }

        match self
            .slots
            .iter_mut()
            .find(|slot| slot.status == PhaseStatus::Pending)
        {
            Some(next) => {
                next.status = PhaseStatus::Active;
                next.starts_at = now;
                next.ends_at = now + Duration::from_secs(next.video_duration_secs);
                let position = next.position;
                self.relayout_pending_slots();
                self.updated_at = now;
                Ok(SlotAdvance::NextSlot(position))
            }
            None => Ok(SlotAdvance::PerformanceComplete(self.advance_phase(now))),
        }
    }

    /// Record a pause; automatic advancement stops until resume.
    pub fn pause(&mut self, now: SystemTime) -> Result<(), TimelineError> {
        if !self.live {
            return Err(TimelineError::NotLive);
        }
        if self.paused {
            return Ok(());
        }
        self.paused = true;
        self.paused_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Resume after a pause, shifting every outstanding instant forward by
    /// the elapsed pause so remaining time is preserved, not lost.
    pub fn resume(&mut self, now: SystemTime) -> Result<(), TimelineError> {
        if !self.live {
            return Err(TimelineError::NotLive);
        }
        let Some(paused_at) = self.paused_at.take() else {
            self.paused = false;
            return Ok(());
        };
        let delta = now
            .duration_since(paused_at)
            .unwrap_or_default()
            .as_secs() as i64;

        let from = self
            .active_phase_index()
            .or_else(|| {
                self.phases
                    .iter()
                    .position(|phase| phase.status == PhaseStatus::Pending)
            });
        if let Some(from) = from {
            self.phases[from].ends_at = shift(self.phases[from].ends_at, delta);
            if self.phases[from].status == PhaseStatus::Pending {
                self.phases[from].starts_at = shift(self.phases[from].starts_at, delta);
            }
            for phase in self.phases.iter_mut().skip(from + 1) {
                phase.starts_at = shift(phase.starts_at, delta);
                phase.ends_at = shift(phase.ends_at, delta);
            }
        }

        for slot in self.slots.iter_mut() {
            match slot.status {
                PhaseStatus::Active => slot.ends_at = shift(slot.ends_at, delta),
                PhaseStatus::Pending => {
                    slot.starts_at = shift(slot.starts_at, delta);
                    slot.ends_at = shift(slot.ends_at, delta);
                }
                PhaseStatus::Completed => {}
            }
        }

        self.paused = false;
        self.updated_at = now;
        Ok(())
    }

    /// Extend or reduce the active phase, shifting everything after it.
    ///
    /// A reduction that would move the end at or before `now` is rejected and
    /// the largest acceptable reduction is reported; nothing is mutated on
    /// rejection. Applied adjustments land in the append-only audit log.
    pub fn adjust_current_phase(
        &mut self,
        delta_minutes: i64,
        actor: &str,
        now: SystemTime,
    ) -> Result<&Phase, TimelineError> {
        let index = self
            .active_phase_index()
            .ok_or(TimelineError::NoActivePhase)?;

        if delta_minutes < 0 {
            let remaining = self.phases[index]
                .ends_at
                .duration_since(now)
                .unwrap_or_default()
                .as_secs();
            if delta_minutes.unsigned_abs() * 60 > remaining {
                return Err(TimelineError::ReductionTooLarge {
                    max_minutes: (remaining / 60) as i64,
                });
            }
        }

        let delta_secs = delta_minutes * 60;
        self.phases[index].ends_at = shift(self.phases[index].ends_at, delta_secs);
        for phase in self.phases.iter_mut().skip(index + 1) {
            phase.starts_at = shift(phase.starts_at, delta_secs);
            phase.ends_at = shift(phase.ends_at, delta_secs);
        }

        let name = self.phases[index].name;
        self.adjustments.push(TimeAdjustment {
            phase: name,
            delta_minutes,
            actor: actor.to_owned(),
            at: now,
        });
        self.updated_at = now;
        Ok(&self.phases[index])
    }

    /// Jump directly to a phase, completing everything before it and
    /// resetting everything after. Sets the manual-override flag so the
    /// reconciler does not fight the operator's choice.
    pub fn jump_to_phase(
        &mut self,
        target: PhaseName,
        now: SystemTime,
    ) -> Result<PhaseName, TimelineError> {
        if !self.live {
            return Err(TimelineError::NotLive);
        }
        let index = target.index();
        for (position, phase) in self.phases.iter_mut().enumerate() {
            phase.status = match position.cmp(&index) {
                std::cmp::Ordering::Less => PhaseStatus::Completed,
                std::cmp::Ordering::Equal => PhaseStatus::Active,
                std::cmp::Ordering::Greater => PhaseStatus::Pending,
            };
        }
        let duration = self.phases[index].duration_minutes;
        self.phases[index].starts_at = now;
        self.phases[index].ends_at = now + minutes(duration);
        self.relayout_after(index);

        if target == PhaseName::Performance {
            for slot in self.slots.iter_mut() {
                slot.status = PhaseStatus::Pending;
            }
            if let Some(first) = self.slots.first_mut() {
                first.status = PhaseStatus::Active;
                first.starts_at = now;
                first.ends_at = now + Duration::from_secs(first.video_duration_secs);
            }
            self.relayout_pending_slots();
        }

        self.manual_override = true;
        self.updated_at = now;
        Ok(target)
    }

    /// Explicit signal that the commercial reel finished playing.
    ///
    /// A no-op outside the commercial phase: the current situation is
    /// reported back instead of erroring.
    pub fn complete_commercials(&mut self, now: SystemTime) -> Option<AdvanceOutcome> {
        let in_commercial = self
            .active_phase()
            .map(|phase| phase.name == PhaseName::Commercial)
            .unwrap_or(false);
        in_commercial.then(|| self.advance_phase(now))
    }

    /// Take the event off air, completing every outstanding phase.
    pub fn stop(&mut self, now: SystemTime) {
        for phase in self.phases.iter_mut() {
            phase.status = PhaseStatus::Completed;
        }
        for slot in self
            .slots
            .iter_mut()
            .filter(|slot| slot.status == PhaseStatus::Active)
        {
            slot.status = PhaseStatus::Completed;
        }
        self.live = false;
        self.paused = false;
        self.paused_at = None;
        self.voting_open = false;
        self.updated_at = now;
    }

    /// Reset the whole event and regenerate the timeline from `now`.
    ///
    /// The one sanctioned backwards movement viewers can observe. The
    /// adjustment audit log is retained; the winner flag on the roster side
    /// is never cleared here.
    pub fn restart(&mut self, now: SystemTime) {
        for slot in self.slots.iter_mut() {
            slot.status = PhaseStatus::Pending;
        }
        self.voting_open = false;
        self.voting_deadline = None;
        self.winner = None;
        self.manual_override = false;
        self.generate_timeline(now);
    }

    /// Count of active phases; exposed for invariant checks.
    pub fn active_phase_count(&self) -> usize {
        self.phases
            .iter()
            .filter(|phase| phase.status == PhaseStatus::Active)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contestant(id: u128, secs: u64, rank: u32) -> Contestant {
        Contestant {
            id: Uuid::from_u128(id),
            display_name: format!("contestant-{id}"),
            votes: 0,
            media_duration_secs: secs,
            selected: true,
            rank: Some(rank),
            winner: false,
        }
    }

    fn configured() -> IndexMap<PhaseName, u32> {
        IndexMap::from([
            (PhaseName::Countdown, 5),
            (PhaseName::Welcome, 10),
            (PhaseName::Performance, 30),
            (PhaseName::Voting, 15),
            (PhaseName::Winner, 5),
            (PhaseName::ThankYou, 5),
        ])
    }

    fn live_event(now: SystemTime) -> EventTimeline {
        let mut event = EventTimeline::new(
            Uuid::from_u128(1),
            "finale".into(),
            3,
            configured(),
            None,
            None,
            now,
        );
        event.generate_timeline(now);
        event
    }

    #[test]
    fn generated_phase_ends_accumulate_prior_durations() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let event = live_event(now);

        let mut expected = now;
        for phase in &event.phases {
            assert_eq!(phase.starts_at, expected);
            expected += Duration::from_secs(u64::from(phase.duration_minutes) * 60);
            assert_eq!(phase.ends_at, expected);
        }
        assert_eq!(event.active_phase_count(), 1);
        assert_eq!(event.active_phase().unwrap().name, PhaseName::Countdown);
    }

    #[test]
    fn commercial_phase_is_retained_at_zero_width() {
        let now = SystemTime::UNIX_EPOCH;
        let event = live_event(now);
        let commercial = event
            .phases
            .iter()
            .find(|phase| phase.name == PhaseName::Commercial)
            .unwrap();
        assert_eq!(commercial.duration_minutes, 0);
        assert_eq!(commercial.starts_at, commercial.ends_at);
        assert_eq!(event.phases.len(), PHASE_ORDER.len());
    }

    #[test]
    fn scheduling_sets_performance_duration_and_shifts_later_phases() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        // 3 performances of 200s plus the 3s floor: 603s -> 11 minutes.
        let roster = vec![
            contestant(1, 200, 1),
            contestant(2, 200, 2),
            contestant(3, 200, 3),
        ];
        event.schedule_performances(&roster, now);

        let perf = event
            .phases
            .iter()
            .find(|phase| phase.name == PhaseName::Performance)
            .unwrap();
        assert_eq!(perf.duration_minutes, 11);
        assert_eq!(perf.ends_at, perf.starts_at + Duration::from_secs(11 * 60));

        let mut expected = event.phases[0].starts_at;
        for phase in &event.phases {
            assert_eq!(phase.starts_at, expected);
            expected += Duration::from_secs(u64::from(phase.duration_minutes) * 60);
            assert_eq!(phase.ends_at, expected);
        }
    }

    #[test]
    fn scheduling_orders_by_rank_and_is_idempotent() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        let roster = vec![
            contestant(3, 100, 3),
            contestant(1, 100, 1),
            contestant(2, 100, 2),
        ];
        event.schedule_performances(&roster, now);
        event.schedule_performances(&roster, now);

        let order: Vec<Uuid> = event.slots.iter().map(|s| s.contestant_id).collect();
        assert_eq!(
            order,
            vec![Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)]
        );
        let positions: Vec<usize> = event.slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn rescheduling_preserves_status_only_for_stable_ordinals() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);
        let roster = vec![contestant(1, 100, 1), contestant(2, 100, 2)];
        event.schedule_performances(&roster, now);
        event.jump_to_phase(PhaseName::Performance, now).unwrap();
        assert_eq!(event.slots[0].status, PhaseStatus::Active);

        // Same roster: slot 0 stays active.
        event.schedule_performances(&roster, now);
        assert_eq!(event.slots[0].status, PhaseStatus::Active);

        // Contestant 1 drops out: the former slot 1 occupant moves to ordinal
        // 0 and everything rebuilds from pending.
        let reduced = vec![contestant(2, 100, 1)];
        event.schedule_performances(&reduced, now);
        assert_eq!(event.slots.len(), 1);
        assert_eq!(event.slots[0].status, PhaseStatus::Pending);
    }

    #[test]
    fn slot_duration_precedence_falls_back_to_default() {
        assert_eq!(resolve_duration_secs(120, 90, 300), 120);
        assert_eq!(resolve_duration_secs(0, 90, 300), 90);
        assert_eq!(resolve_duration_secs(0, 0, 300), 300);
    }

    #[test]
    fn advance_walks_the_order_and_finishes_cleanly() {
        let now = SystemTime::UNIX_EPOCH;
        let mut event = live_event(now);

        let mut seen = vec![PhaseName::Countdown];
        loop {
            match event.advance_phase(now) {
                AdvanceOutcome::Entered(name) => seen.push(name),
                AdvanceOutcome::Finished => break,
            }
            assert!(event.active_phase_count() <= 1);
        }
        assert_eq!(seen, PHASE_ORDER.to_vec());
        assert!(!event.live);

        // A further advance stays terminal instead of erroring.
        assert_eq!(event.advance_phase(now), AdvanceOutcome::Finished);
    }

    #[test]
    fn pause_then_resume_preserves_remaining_time() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        let before = event.active_phase().unwrap().ends_at;

        event.pause(start + Duration::from_secs(60)).unwrap();
        event.resume(start + Duration::from_secs(90)).unwrap();

        let after = event.active_phase().unwrap().ends_at;
        assert_eq!(after, before + Duration::from_secs(30));
        assert!(!event.paused);

        // Later phases shifted by the same 30 seconds.
        assert_eq!(
            event.phases[1].starts_at,
            event.phases[0].ends_at
        );
    }

    #[test]
    fn resume_shifts_pending_slots_forward() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.schedule_performances(&[contestant(1, 100, 1)], start);
        let slot_before = event.slots[0].starts_at;

        event.pause(start + Duration::from_secs(10)).unwrap();
        event.resume(start + Duration::from_secs(25)).unwrap();
        assert_eq!(event.slots[0].starts_at, slot_before + Duration::from_secs(15));
    }

    #[test]
    fn overlong_reduction_is_rejected_with_the_maximum() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        // Countdown runs 5 minutes; poll at 4 minutes in: 10 would remain on
        // a 15-minute phase, so jump to voting (15 min) and wait 5 minutes.
        event.jump_to_phase(PhaseName::Voting, start).unwrap();
        let poll = start + Duration::from_secs(5 * 60);
        let end_before = event.active_phase().unwrap().ends_at;

        let err = event
            .adjust_current_phase(-15, "operator", poll)
            .unwrap_err();
        assert_eq!(err, TimelineError::ReductionTooLarge { max_minutes: 10 });
        assert_eq!(event.active_phase().unwrap().ends_at, end_before);
        assert!(event.adjustments.is_empty());
    }

    #[test]
    fn adjustment_shifts_later_phases_and_is_audited() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        let next_start_before = event.phases[1].starts_at;

        event.adjust_current_phase(4, "operator", start).unwrap();

        assert_eq!(
            event.active_phase().unwrap().ends_at,
            start + Duration::from_secs(9 * 60)
        );
        assert_eq!(
            event.phases[1].starts_at,
            next_start_before + Duration::from_secs(4 * 60)
        );
        assert_eq!(event.adjustments.len(), 1);
        assert_eq!(event.adjustments[0].delta_minutes, 4);
        assert_eq!(event.adjustments[0].phase, PhaseName::Countdown);
    }

    #[test]
    fn adjust_without_active_phase_is_an_error() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.stop(start);
        let err = event.adjust_current_phase(1, "operator", start).unwrap_err();
        assert_eq!(err, TimelineError::NoActivePhase);
    }

    #[test]
    fn jump_into_performance_resets_slots() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.schedule_performances(
            &[contestant(1, 100, 1), contestant(2, 100, 2)],
            start,
        );

        event.jump_to_phase(PhaseName::Performance, start).unwrap();
        assert!(event.manual_override);
        assert_eq!(event.slots[0].status, PhaseStatus::Active);
        assert_eq!(event.slots[1].status, PhaseStatus::Pending);
        assert_eq!(event.active_phase().unwrap().name, PhaseName::Performance);

        // Phases before the target read completed, after it pending.
        assert_eq!(event.phases[0].status, PhaseStatus::Completed);
        assert_eq!(event.phases[1].status, PhaseStatus::Completed);
        assert!(
            event
                .phases
                .iter()
                .skip(PhaseName::Performance.index() + 1)
                .all(|phase| phase.status == PhaseStatus::Pending)
        );
    }

    #[test]
    fn slot_advance_walks_slots_then_completes_the_phase() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.schedule_performances(
            &[contestant(1, 100, 1), contestant(2, 100, 2)],
            start,
        );
        event.jump_to_phase(PhaseName::Performance, start).unwrap();

        let next = event.advance_slot(start + Duration::from_secs(100)).unwrap();
        assert_eq!(next, SlotAdvance::NextSlot(1));
        assert_eq!(event.slots[0].status, PhaseStatus::Completed);

        let done = event.advance_slot(start + Duration::from_secs(200)).unwrap();
        assert_eq!(
            done,
            SlotAdvance::PerformanceComplete(AdvanceOutcome::Entered(PhaseName::Commercial))
        );
    }

    #[test]
    fn slot_advance_outside_performance_is_rejected() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        let err = event.advance_slot(start).unwrap_err();
        assert_eq!(err, TimelineError::NotInPerformance);
    }

    #[test]
    fn complete_commercials_is_a_noop_outside_the_commercial_phase() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        assert_eq!(event.complete_commercials(start), None);

        event.jump_to_phase(PhaseName::Commercial, start).unwrap();
        assert_eq!(
            event.complete_commercials(start),
            Some(AdvanceOutcome::Entered(PhaseName::Voting))
        );
    }

    #[test]
    fn restart_regenerates_from_now_and_clears_override() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.jump_to_phase(PhaseName::Voting, start).unwrap();
        event.adjust_current_phase(2, "operator", start).unwrap();

        let later = start + Duration::from_secs(3_600);
        event.restart(later);

        assert!(event.live);
        assert!(!event.manual_override);
        assert_eq!(event.active_phase().unwrap().name, PhaseName::Countdown);
        assert_eq!(event.actual_start, Some(later));
        // Audit log survives the restart.
        assert_eq!(event.adjustments.len(), 1);
    }

    #[test]
    fn rescheduling_leaves_re_anchored_phase_instants_alone() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.schedule_performances(&[contestant(1, 100, 1)], start);

        // Walk the clock forward to voting; each advance re-anchors at `later`.
        let later = start + Duration::from_secs(7_200);
        for _ in 0..PhaseName::Voting.index() {
            event.advance_phase(later);
        }
        let voting = event.active_phase().unwrap();
        assert_eq!(voting.name, PhaseName::Voting);
        let window = (voting.starts_at, voting.ends_at);
        assert_eq!(window.0, later);

        // A roster push after the fact must not move the voting window back
        // to the originally generated schedule.
        event.schedule_performances(&[contestant(1, 100, 1), contestant(2, 100, 2)], later);
        let voting = event.active_phase().unwrap();
        assert_eq!((voting.starts_at, voting.ends_at), window);
        // Pending phases stack behind the anchored one.
        let winner = &event.phases[PhaseName::Winner.index()];
        assert_eq!(winner.starts_at, window.1);
    }

    #[test]
    fn pending_slots_pick_up_a_later_media_measurement() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);

        // Duration unknown at first; the slot falls back to the default.
        event.schedule_performances(&[contestant(1, 0, 1)], start);
        assert_eq!(event.slots[0].video_duration_secs, DEFAULT_SLOT_SECS);

        // The roster now reports the measured length; a resync must use it.
        event.schedule_performances(&[contestant(1, 120, 1)], start);
        assert_eq!(event.slots[0].video_duration_secs, 120);
    }

    #[test]
    fn explicit_advance_clears_the_manual_override() {
        let start = SystemTime::UNIX_EPOCH;
        let mut event = live_event(start);
        event.jump_to_phase(PhaseName::Welcome, start).unwrap();
        assert!(event.manual_override);

        event.advance_phase(start + Duration::from_secs(60));
        assert!(!event.manual_override);
    }
}
