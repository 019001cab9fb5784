use crate::design::{Hue, TrialCharacteristics};
use crate::io::InputIdentity;
use serde::{Deserialize, Serialize};

/// Input that arrived before the response window formally opened.
/// Recorded for the data file, never treated as the response itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrematureInput {
    pub identity: InputIdentity,
    /// Device timing in milliseconds; a device timestamp of 0 means no
    /// timing was available and is reported as absent.
    pub timing_ms: Option<f64>,
}

/// Circular-distance scoring of a colour report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColourScore {
    /// Signed index difference before wrapping.
    pub raw_distance: i32,
    /// Shorter arc between the two hues, in [0, 180].
    pub abs_distance: u32,
    /// Wrapped into [-180, 180); both antipodal raw distances map to -180.
    pub signed_distance: i32,
    /// 100 for an exact match, 0 at the antipode.
    pub performance: u8,
}

/// Directional scoring of a duration report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationScore {
    /// Positive when the key was held too long.
    pub diff_ms: i64,
    pub abs_diff_ms: u64,
    /// The signed difference with an explicit "+" for overshoots.
    pub performance: String,
}

/// The scored outcome of one trial's response, by block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoredResponse {
    Colour {
        selected: Hue,
        wheel_offset: u16,
        idle_reaction_ms: f64,
        response_ms: f64,
        premature: Option<PrematureInput>,
        score: ColourScore,
    },
    Duration {
        held_ms: f64,
        pressed: InputIdentity,
        idle_reaction_ms: f64,
        response_ms: f64,
        premature: Option<PrematureInput>,
        score: DurationScore,
    },
}

impl ScoredResponse {
    /// The performance figure shown as on-screen feedback.
    pub fn performance_text(&self) -> String {
        match self {
            ScoredResponse::Colour { score, .. } => score.performance.to_string(),
            ScoredResponse::Duration { score, .. } => score.performance.clone(),
        }
    }

    pub fn premature(&self) -> Option<&PrematureInput> {
        match self {
            ScoredResponse::Colour { premature, .. }
            | ScoredResponse::Duration { premature, .. } => premature.as_ref(),
        }
    }

    pub fn idle_reaction_ms(&self) -> f64 {
        match self {
            ScoredResponse::Colour {
                idle_reaction_ms, ..
            }
            | ScoredResponse::Duration {
                idle_reaction_ms, ..
            } => *idle_reaction_ms,
        }
    }

    pub fn response_ms(&self) -> f64 {
        match self {
            ScoredResponse::Colour { response_ms, .. }
            | ScoredResponse::Duration { response_ms, .. } => *response_ms,
        }
    }
}

/// Terminal, immutable artifact of one trial. The caller persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub characteristics: TrialCharacteristics,
    pub response: ScoredResponse,
    /// Condition marker equal to the trial's first stimulus-onset trigger,
    /// used to align the data file with the recording-device stream.
    pub condition_code: u8,
}
