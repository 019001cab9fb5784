pub mod config;
pub mod design;
pub mod error;
pub mod response;
pub mod timeline;
pub mod trial;
pub mod trigger;

pub use config::ExperimentConfig;
pub use design::{build_block_designs, expand};
pub use error::Error;
pub use response::{collect_colour_response, collect_duration_response, score_colour, score_duration};
pub use timeline::{TimelineEngine, TimelineRun, TimelineState};
pub use trial::{TrialContext, average_performance, run_trial};
pub use trigger::{TriggerEmitter, trigger_code};
