use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named stages of the broadcast, in their fixed running order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    /// Pre-show countdown displayed before the welcome segment.
    Countdown,
    /// Opening segment presented by the host.
    Welcome,
    /// One slot per contestant performance.
    Performance,
    /// Commercial break; advances only on an explicit completion signal.
    Commercial,
    /// Voting window for viewers.
    Voting,
    /// Winner declaration segment.
    Winner,
    /// Closing thank-you segment.
    ThankYou,
}

/// Fixed broadcast order of the phases.
pub const PHASE_ORDER: [PhaseName; 7] = [
    PhaseName::Countdown,
    PhaseName::Welcome,
    PhaseName::Performance,
    PhaseName::Commercial,
    PhaseName::Voting,
    PhaseName::Winner,
    PhaseName::ThankYou,
];

impl PhaseName {
    /// Position of this phase in the broadcast order.
    pub fn index(self) -> usize {
        PHASE_ORDER
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or(0)
    }

    /// Stable lowercase label used in logs and audit records.
    pub fn label(self) -> &'static str {
        match self {
            PhaseName::Countdown => "countdown",
            PhaseName::Welcome => "welcome",
            PhaseName::Performance => "performance",
            PhaseName::Commercial => "commercial",
            PhaseName::Voting => "voting",
            PhaseName::Winner => "winner",
            PhaseName::ThankYou => "thank_you",
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle status shared by phases and performance slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Not reached yet.
    Pending,
    /// Currently on air. At most one phase and one slot hold this status.
    Active,
    /// Already aired.
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_stable_and_indexed() {
        assert_eq!(PhaseName::Countdown.index(), 0);
        assert_eq!(PhaseName::ThankYou.index(), 6);
        for pair in PHASE_ORDER.windows(2) {
            assert!(pair[0].index() < pair[1].index());
        }
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for name in PHASE_ORDER {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.label()));
            let back: PhaseName = serde_json::from_str(&json).unwrap();
            assert_eq!(back, name);
        }
    }
}
