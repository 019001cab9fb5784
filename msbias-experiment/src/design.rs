use crate::config::ExperimentConfig;
use crate::error::Error;
use msbias_core::{
    DurationCategory, Hue, ItemTag, Position, TrialCharacteristics, TrialDesign, WHEEL_SEGMENTS,
};
use rand::Rng;
use rand::seq::SliceRandom;

// Pre-balanced repeating blocks. Their periods (8, 4, 2) line up so that
// every cell of the position x duration x item factorial occurs exactly
// once per eight trials.
const POSITION_BLOCK: [Position; 8] = [
    Position::Left,
    Position::Left,
    Position::Left,
    Position::Left,
    Position::Right,
    Position::Right,
    Position::Right,
    Position::Right,
];
const DURATION_BLOCK: [DurationCategory; 4] = [
    DurationCategory::Short,
    DurationCategory::Short,
    DurationCategory::Long,
    DurationCategory::Long,
];
const ITEM_BLOCK: [ItemTag; 2] = [ItemTag::One, ItemTag::Two];

/// Draws a counterbalanced design list for one block. Marginal counts are
/// exact; only the ordering is random.
pub fn build_block_designs<R: Rng>(n_trials: usize, rng: &mut R) -> Result<Vec<TrialDesign>, Error> {
    if n_trials % 8 != 0 {
        return Err(Error::InvalidTrialCount(n_trials));
    }

    let mut designs: Vec<TrialDesign> = (0..n_trials)
        .map(|i| TrialDesign {
            position: POSITION_BLOCK[i % 8],
            duration_category: DURATION_BLOCK[i % 4],
            target_item: ITEM_BLOCK[i % 2],
        })
        .collect();
    designs.shuffle(rng);

    Ok(designs)
}

/// Expands one design into full per-phase characteristics: concrete
/// durations drawn from the two disjoint ranges, two distinct hues drawn
/// without replacement, and presentation order derived so that exactly one
/// item sits at the design's position.
pub fn expand<R: Rng>(
    design: &TrialDesign,
    config: &ExperimentConfig,
    rng: &mut R,
) -> TrialCharacteristics {
    let target_category = design.duration_category;
    let other_category = target_category.opposite();

    let (lo, hi) = config.category_range(target_category);
    let target_duration = rng.random_range(lo..=hi);
    let (lo, hi) = config.category_range(other_category);
    let other_duration = rng.random_range(lo..=hi);

    // Two distinct hues, without replacement.
    let first = rng.random_range(1..=WHEEL_SEGMENTS);
    let mut second = rng.random_range(1..WHEEL_SEGMENTS);
    if second >= first {
        second += 1;
    }
    let stimulus_colours = [Hue(first), Hue(second)];

    let (target_colour, distractor_colour, item_order, durations_ms, duration_categories) =
        match design.position {
            Position::Left => (
                stimulus_colours[0],
                stimulus_colours[1],
                [design.target_item, design.target_item.opposite()],
                [target_duration, other_duration],
                [target_category, other_category],
            ),
            Position::Right => (
                stimulus_colours[1],
                stimulus_colours[0],
                [design.target_item.opposite(), design.target_item],
                [other_duration, target_duration],
                [other_category, target_category],
            ),
        };

    let positions = match design.target_item {
        ItemTag::One => [design.position, design.position.opposite()],
        ItemTag::Two => [design.position.opposite(), design.position],
    };

    TrialCharacteristics {
        iti_ms: rng.random_range(config.iti_range_ms.0..=config.iti_range_ms.1),
        stimulus_colours,
        positions,
        item_order,
        durations_ms,
        duration_categories,
        target_item: design.target_item,
        target_colour,
        distractor_colour,
        target_position: design.position,
        target_duration_ms: target_duration,
        target_duration_category: target_category,
    }
}
