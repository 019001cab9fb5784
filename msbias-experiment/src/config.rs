use msbias_core::DurationCategory;
use serde::{Deserialize, Serialize};

/// Timing parameters of the trial sequence. Defaults match the reference
/// protocol; tests shrink them to keep wall time down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Inter-trial interval, drawn uniformly per trial (inclusive).
    pub iti_range_ms: (u64, u64),
    pub short_range_ms: (u64, u64),
    pub long_range_ms: (u64, u64),
    /// Fixation between the two stimuli and after the second.
    pub inter_stimulus_ms: u64,
    pub cue_ms: u64,
    /// Fixation between cue offset and the response window.
    pub pre_response_ms: u64,
    pub feedback_ms: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            iti_range_ms: (500, 800),
            short_range_ms: (200, 800),
            long_range_ms: (1200, 1800),
            inter_stimulus_ms: 750,
            cue_ms: 250,
            pre_response_ms: 1000,
            feedback_ms: 250,
        }
    }
}

impl ExperimentConfig {
    pub fn category_range(&self, category: DurationCategory) -> (u64, u64) {
        match category {
            DurationCategory::Short => self.short_range_ms,
            DurationCategory::Long => self.long_range_ms,
        }
    }
}
