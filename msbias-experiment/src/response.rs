use crate::error::Error;
use crate::trigger::TriggerEmitter;
use msbias_core::{
    Button, ColourScore, DurationScore, FrameDescriptor, Hue, InputEvent, InputEventKind,
    InputIdentity, InputSource, Key, PhaseLabel, PrematureInput, Renderer, ScoredResponse,
    WHEEL_SEGMENTS,
};
use msbias_timing::Timer;
use rand::Rng;
use tracing::debug;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Circular-distance scoring of a colour report against the target hue.
/// The wheel has no endpoints, so distance always takes the shorter arc.
pub fn score_colour(selected: Hue, target: Hue) -> ColourScore {
    let raw_distance = i32::from(selected.index()) - i32::from(target.index());
    let magnitude = raw_distance.abs();
    let abs_distance = if magnitude > 180 {
        360 - magnitude
    } else {
        magnitude
    } as u32;
    // Wraps into [-180, 180); both antipodal raw distances land on -180.
    let signed_distance = (raw_distance + 180).rem_euclid(360) - 180;
    let performance = (100.0 - f64::from(abs_distance) / 180.0 * 100.0).round() as u8;

    ColourScore {
        raw_distance,
        abs_distance,
        signed_distance,
        performance,
    }
}

/// Directional scoring of a duration report: positive means held too long.
pub fn score_duration(target_ms: u64, held_ms: f64) -> DurationScore {
    let diff = held_ms - target_ms as f64;
    let diff_ms = diff.round() as i64;
    let performance = if diff_ms > 0 {
        format!("+{diff_ms}")
    } else {
        diff_ms.to_string()
    };

    DurationScore {
        diff_ms,
        abs_diff_ms: diff.abs().round() as u64,
        performance,
    }
}

fn is_press(kind: InputEventKind) -> bool {
    matches!(
        kind,
        InputEventKind::MotionStart | InputEventKind::ButtonDown | InputEventKind::KeyDown
    )
}

fn premature_from(event: &InputEvent) -> PrematureInput {
    PrematureInput {
        identity: event.identity,
        timing_ms: (event.at_ns > 0).then(|| event.at_ns as f64 / NANOS_PER_MILLI),
    }
}

/// Collects a colour report: the wheel appears at a random rotation, the
/// first pointer motion opens the response, a left click commits the hue
/// under the marker. Blocks until a response occurs; it does not time out.
pub fn collect_colour_response<Rd, I, T, R>(
    renderer: &mut Rd,
    input: &mut I,
    timer: &T,
    rng: &mut R,
    emitter: &mut TriggerEmitter<'_>,
    target_colour: Hue,
) -> Result<ScoredResponse, Error>
where
    Rd: Renderer,
    I: InputSource,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    if input.quit_requested() {
        return Err(Error::Aborted);
    }

    let idle_start = timer.now();
    // Input still queued from the presentation phases, or arriving before
    // the first pointer motion, is premature rather than a response.
    let mut premature = None;
    let offset: u16 = rng.random_range(0..=WHEEL_SEGMENTS);

    // Wait until the participant starts moving the pointer.
    let response_started = loop {
        if input.quit_requested() {
            return Err(Error::Aborted);
        }
        match input.poll() {
            Some(event) if event.kind == InputEventKind::MotionStart => break timer.now(),
            Some(event) => {
                if premature.is_none() && is_press(event.kind) {
                    premature = Some(premature_from(&event));
                }
            }
            None if input.exhausted() => return Err(Error::NoResponse),
            None => {}
        }
        renderer.render(&FrameDescriptor::ColourWheel {
            offset,
            marker: None,
        });
        renderer.commit();
    };
    let idle_reaction_ms = (response_started - idle_start) as f64 / NANOS_PER_MILLI;

    emitter.emit(PhaseLabel::ResponseOnset);

    // Track the dial until a left click commits the selection.
    let mut angle = input.pointer_angle().unwrap_or(0.0);
    let selected = loop {
        if input.quit_requested() {
            return Err(Error::Aborted);
        }
        match input.poll() {
            Some(event) => match (event.kind, event.identity) {
                (InputEventKind::MotionStart, InputIdentity::Pointer { angle_deg }) => {
                    angle = angle_deg;
                }
                (InputEventKind::ButtonDown, InputIdentity::Button(Button::Left)) => {
                    break Hue::from_wheel_angle(angle, offset);
                }
                _ => {}
            },
            None if input.exhausted() => return Err(Error::NoResponse),
            None => {}
        }
        if let Some(current) = input.pointer_angle() {
            angle = current;
        }
        renderer.render(&FrameDescriptor::ColourWheel {
            offset,
            marker: Some(angle),
        });
        renderer.commit();
    };
    let response_ms = (timer.now() - response_started) as f64 / NANOS_PER_MILLI;

    emitter.emit(PhaseLabel::ResponseOffset);

    let score = score_colour(selected, target_colour);
    debug!(
        selected = selected.index(),
        target = target_colour.index(),
        performance = score.performance,
        response_ms,
        "colour response"
    );

    Ok(ScoredResponse::Colour {
        selected,
        wheel_offset: offset,
        idle_reaction_ms,
        response_ms,
        premature,
        score,
    })
}

fn is_hold_start(event: &InputEvent) -> bool {
    matches!(
        (event.kind, event.identity),
        (InputEventKind::KeyDown, InputIdentity::Key(Key::Space))
            | (InputEventKind::ButtonDown, InputIdentity::Button(Button::Left))
    )
}

fn is_release_of(event: &InputEvent, pressed: &InputIdentity) -> bool {
    match (event.kind, event.identity, pressed) {
        (InputEventKind::KeyUp, InputIdentity::Key(released), InputIdentity::Key(held)) => {
            released == *held
        }
        (InputEventKind::ButtonUp, InputIdentity::Button(released), InputIdentity::Button(held)) => {
            released == *held
        }
        _ => false,
    }
}

/// Collects a duration report: the held time between press and release of
/// the response key is the reproduced duration. Blocks until a response
/// occurs; it does not time out.
pub fn collect_duration_response<Rd, I, T>(
    renderer: &mut Rd,
    input: &mut I,
    timer: &T,
    emitter: &mut TriggerEmitter<'_>,
    target_duration_ms: u64,
) -> Result<ScoredResponse, Error>
where
    Rd: Renderer,
    I: InputSource,
    T: Timer<Timestamp = u64>,
{
    if input.quit_requested() {
        return Err(Error::Aborted);
    }

    // Signal that the report may start.
    renderer.render(&FrameDescriptor::ResponseReady);
    renderer.commit();

    let idle_start = timer.now();
    let mut premature = None;

    // Wait for the hold to begin.
    let (pressed, response_started) = loop {
        if input.quit_requested() {
            return Err(Error::Aborted);
        }
        match input.poll() {
            Some(event) if is_hold_start(&event) => break (event.identity, timer.now()),
            Some(event) => {
                if premature.is_none() && is_press(event.kind) {
                    premature = Some(premature_from(&event));
                }
            }
            None if input.exhausted() => return Err(Error::NoResponse),
            None => {}
        }
    };
    let idle_reaction_ms = (response_started - idle_start) as f64 / NANOS_PER_MILLI;

    emitter.emit(PhaseLabel::ResponseOnset);

    // Show the probe for as long as the key is held.
    let released_at = loop {
        if input.quit_requested() {
            return Err(Error::Aborted);
        }
        match input.poll() {
            Some(event) if is_release_of(&event, &pressed) => break timer.now(),
            Some(_) => {}
            None if input.exhausted() => return Err(Error::NoResponse),
            None => {}
        }
        renderer.render(&FrameDescriptor::Probe);
        renderer.commit();
    };
    let response_ms = (released_at - response_started) as f64 / NANOS_PER_MILLI;
    let held_ms = response_ms;

    emitter.emit(PhaseLabel::ResponseOffset);

    let score = score_duration(target_duration_ms, held_ms);
    debug!(
        target_ms = target_duration_ms,
        held_ms,
        diff_ms = score.diff_ms,
        "duration response"
    );

    Ok(ScoredResponse::Duration {
        held_ms,
        pressed,
        idle_reaction_ms,
        response_ms,
        premature,
        score,
    })
}
