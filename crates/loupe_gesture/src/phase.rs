//! Gesture recognizer phases

use serde::{Deserialize, Serialize};

/// Recognizer state, as reported by the platform
///
/// The numeric codes are what the phase cells hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    #[default]
    Undetermined,
    Failed,
    /// Touch recognized, not yet tracking
    Began,
    Cancelled,
    /// Tracking; samples carry live values
    Active,
    /// Finished successfully; the last sample carries release velocities
    End,
    Possible,
}

impl GesturePhase {
    pub const ALL: [GesturePhase; 7] = [
        GesturePhase::Undetermined,
        GesturePhase::Failed,
        GesturePhase::Began,
        GesturePhase::Cancelled,
        GesturePhase::Active,
        GesturePhase::End,
        GesturePhase::Possible,
    ];

    pub fn code(self) -> f32 {
        match self {
            GesturePhase::Undetermined => 0.0,
            GesturePhase::Failed => 1.0,
            GesturePhase::Began => 2.0,
            GesturePhase::Cancelled => 3.0,
            GesturePhase::Active => 4.0,
            GesturePhase::End => 5.0,
            GesturePhase::Possible => 6.0,
        }
    }

    /// Decode a phase cell value; unknown codes read as `Undetermined`
    pub fn from_code(code: f32) -> Self {
        Self::ALL
            .into_iter()
            .find(|phase| phase.code() == code)
            .unwrap_or_default()
    }

    pub fn is_active(self) -> bool {
        self == GesturePhase::Active
    }

    /// The recognizer stopped tracking, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GesturePhase::End | GesturePhase::Cancelled | GesturePhase::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for phase in GesturePhase::ALL {
            assert_eq!(GesturePhase::from_code(phase.code()), phase);
        }
        assert_eq!(GesturePhase::from_code(42.0), GesturePhase::Undetermined);
        assert_eq!(GesturePhase::Active.code(), 4.0);
        assert_eq!(GesturePhase::End.code(), 5.0);
    }

    #[test]
    fn test_terminal_phases() {
        assert!(GesturePhase::End.is_terminal());
        assert!(GesturePhase::Cancelled.is_terminal());
        assert!(!GesturePhase::Active.is_terminal());
        assert!(!GesturePhase::Began.is_terminal());
    }
}
