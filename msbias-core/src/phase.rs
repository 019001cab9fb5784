use crate::design::{Hue, ItemTag, Position};
use serde::{Deserialize, Serialize};

/// Phase events that produce a synchronization marker on the recording
/// device. Phases without a label emit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLabel {
    StimulusOnset1,
    StimulusOnset2,
    CueOnset,
    ResponseOnset,
    ResponseOffset,
    FeedbackOnset,
}

/// Where a frame places its stimulus. Central content (the held-response
/// probe) has its own [`FrameDescriptor`] variant and no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StimulusPosition {
    Left,
    Right,
}

impl From<Position> for StimulusPosition {
    fn from(value: Position) -> Self {
        match value {
            Position::Left => StimulusPosition::Left,
            Position::Right => StimulusPosition::Right,
        }
    }
}

/// Opaque description of one frame's content, handed to the renderer.
/// The core never draws; it only names what should be on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameDescriptor {
    /// Plain fixation dot.
    Fixation,
    /// Darkened fixation dot signalling that the report may start.
    ResponseReady,
    Stimulus {
        colour: Hue,
        position: StimulusPosition,
    },
    Cue {
        target: ItemTag,
    },
    /// The central probe shown for as long as the response key is held.
    Probe,
    ColourWheel {
        offset: u16,
        /// Dial angle of the selection marker, absent until the hand moves.
        marker: Option<f32>,
    },
    Feedback {
        performance: String,
        premature: bool,
    },
}

/// One timed display phase within a trial.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSpec {
    pub duration_ms: u64,
    pub frame: FrameDescriptor,
    pub trigger: Option<PhaseLabel>,
}

/// Ordered, fixed sequence of phases for one trial.
pub type Timeline = Vec<PhaseSpec>;
