pub mod design;
pub mod error;
pub mod io;
pub mod phase;
pub mod report;

pub use design::{
    BlockType, DurationCategory, Hue, ItemTag, Position, TrialCharacteristics, TrialDesign,
    WHEEL_SEGMENTS,
};
pub use error::DomainError;
pub use io::{Button, InputEvent, InputEventKind, InputIdentity, InputSource, Key, Renderer, TriggerSink};
pub use phase::{FrameDescriptor, PhaseLabel, PhaseSpec, StimulusPosition, Timeline};
pub use report::{ColourScore, DurationScore, PrematureInput, ScoredResponse, TrialReport};
