use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// Number of hue steps on the colour wheel.
pub const WHEEL_SEGMENTS: u16 = 360;

/// Lateral position of a stimulus relative to fixation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    pub fn opposite(self) -> Self {
        match self {
            Position::Left => Position::Right,
            Position::Right => Position::Left,
        }
    }
}

impl TryFrom<&str> for Position {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            other => Err(DomainError::InvalidPosition(other.to_string())),
        }
    }
}

/// Which side of the disjoint duration split a stimulus falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationCategory {
    Short,
    Long,
}

impl DurationCategory {
    pub fn opposite(self) -> Self {
        match self {
            DurationCategory::Short => DurationCategory::Long,
            DurationCategory::Long => DurationCategory::Short,
        }
    }

    /// Recovers the category of a concrete duration. The short and long
    /// ranges are disjoint, so the midpoint between them is a safe split.
    pub fn classify(duration_ms: u64) -> Self {
        if duration_ms < 1000 {
            DurationCategory::Short
        } else {
            DurationCategory::Long
        }
    }
}

/// Ordinal label of a stimulus within a trial, as named by the cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemTag {
    One,
    Two,
}

impl ItemTag {
    pub fn opposite(self) -> Self {
        match self {
            ItemTag::One => ItemTag::Two,
            ItemTag::Two => ItemTag::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            ItemTag::One => 1,
            ItemTag::Two => 2,
        }
    }
}

impl TryFrom<u8> for ItemTag {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ItemTag::One),
            2 => Ok(ItemTag::Two),
            other => Err(DomainError::InvalidItem(other)),
        }
    }
}

/// Which response dial a block uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Colour,
    Duration,
}

/// One-based index on the 360-point colour wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hue(pub u16);

impl Hue {
    pub fn index(self) -> u16 {
        self.0
    }

    /// Maps a dial angle (degrees, counter-clockwise from east) to the hue
    /// under the marker, given the random rotation the wheel was drawn with.
    pub fn from_wheel_angle(angle_deg: f32, offset: u16) -> Self {
        let colour_angle = (angle_deg - f32::from(offset)).rem_euclid(360.0);
        Hue(colour_angle as u16 + 1)
    }
}

/// One drawn condition: which item is cued, how long it is shown, and where.
/// Immutable once drawn from the block's design list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDesign {
    pub position: Position,
    pub duration_category: DurationCategory,
    pub target_item: ItemTag,
}

impl TrialDesign {
    /// Builds a design from an untyped external representation, e.g. a row
    /// of a session sheet. This is where out-of-domain values are rejected.
    pub fn from_raw(
        position: &str,
        duration_category: DurationCategory,
        item: u8,
    ) -> Result<Self, DomainError> {
        Ok(TrialDesign {
            position: Position::try_from(position)?,
            duration_category,
            target_item: ItemTag::try_from(item)?,
        })
    }
}

/// Full per-trial parameters expanded from a [`TrialDesign`].
///
/// Presentation-indexed arrays hold the first-shown stimulus at index 0.
/// `item_order` records which cue label each presentation slot carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialCharacteristics {
    pub iti_ms: u64,
    pub stimulus_colours: [Hue; 2],
    pub positions: [Position; 2],
    pub item_order: [ItemTag; 2],
    pub durations_ms: [u64; 2],
    pub duration_categories: [DurationCategory; 2],
    pub target_item: ItemTag,
    pub target_colour: Hue,
    pub distractor_colour: Hue,
    pub target_position: Position,
    pub target_duration_ms: u64,
    pub target_duration_category: DurationCategory,
}
