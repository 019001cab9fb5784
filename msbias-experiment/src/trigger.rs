use msbias_core::{
    BlockType, DurationCategory, ItemTag, PhaseLabel, Position, TriggerSink, TrialCharacteristics,
};
use tracing::trace;

/// Stable integer code for a (phase, condition) pair, used offline to align
/// the recording-device timestamp stream with trial phases.
///
/// Layout: a decade base per phase label, a condition offset in 1..=8
/// (position, duration category, target item), and +100 for duration
/// blocks. Maximum code is 168.
pub fn trigger_code(
    label: PhaseLabel,
    block_type: BlockType,
    position: Position,
    category: DurationCategory,
    item: ItemTag,
) -> u8 {
    let base = match label {
        PhaseLabel::StimulusOnset1 => 10,
        PhaseLabel::StimulusOnset2 => 20,
        PhaseLabel::CueOnset => 30,
        PhaseLabel::ResponseOnset => 40,
        PhaseLabel::ResponseOffset => 50,
        PhaseLabel::FeedbackOnset => 60,
    };
    let condition = 1
        + match position {
            Position::Left => 0,
            Position::Right => 4,
        }
        + match category {
            DurationCategory::Short => 0,
            DurationCategory::Long => 2,
        }
        + match item {
            ItemTag::One => 0,
            ItemTag::Two => 1,
        };
    let block = match block_type {
        BlockType::Colour => 0,
        BlockType::Duration => 100,
    };
    base + condition + block
}

/// Pushes phase markers for one trial to the trigger sink. Without a sink
/// (rehearsal mode) emission is a no-op, not an error.
pub struct TriggerEmitter<'a> {
    sink: Option<&'a mut (dyn TriggerSink + 'a)>,
    block_type: BlockType,
    position: Position,
    category: DurationCategory,
    item: ItemTag,
}

impl<'a> TriggerEmitter<'a> {
    pub fn new(
        sink: Option<&'a mut (dyn TriggerSink + 'a)>,
        block_type: BlockType,
        characteristics: &TrialCharacteristics,
    ) -> Self {
        Self {
            sink,
            block_type,
            position: characteristics.target_position,
            category: characteristics.target_duration_category,
            item: characteristics.target_item,
        }
    }

    pub fn emit(&mut self, label: PhaseLabel) {
        if let Some(sink) = self.sink.as_deref_mut() {
            let code = trigger_code(label, self.block_type, self.position, self.category, self.item);
            trace!(code, ?label, "trigger");
            sink.send(code);
        }
    }

    /// The condition marker stored with the trial report.
    pub fn condition_code(&self) -> u8 {
        trigger_code(
            PhaseLabel::StimulusOnset1,
            self.block_type,
            self.position,
            self.category,
            self.item,
        )
    }
}
