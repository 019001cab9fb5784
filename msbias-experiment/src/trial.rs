use crate::config::ExperimentConfig;
use crate::error::Error;
use crate::response::{collect_colour_response, collect_duration_response};
use crate::timeline::TimelineEngine;
use crate::trigger::TriggerEmitter;
use msbias_core::{
    BlockType, FrameDescriptor, InputSource, PhaseLabel, PhaseSpec, Renderer, ScoredResponse,
    Timeline, TriggerSink, TrialCharacteristics, TrialReport,
};
use msbias_timing::Timer;
use rand::Rng;
use tracing::{info, warn};

/// Everything one trial borrows from the session. Replaces process-wide
/// state: the renderer and sinks are exclusively owned by the orchestrator
/// for the trial's duration.
pub struct TrialContext<'a, Rd, I, T>
where
    Rd: Renderer,
    I: InputSource,
    T: Timer<Timestamp = u64>,
{
    pub renderer: &'a mut Rd,
    pub input: &'a mut I,
    pub timer: &'a T,
    /// Absent when no recording device is attached.
    pub trigger_sink: Option<&'a mut (dyn TriggerSink + 'a)>,
    /// Rehearsal trials present identically but emit no triggers.
    pub rehearsal: bool,
}

/// The fixed 8-phase presentation sequence of one trial.
fn build_timeline(
    characteristics: &TrialCharacteristics,
    config: &ExperimentConfig,
) -> Timeline {
    vec![
        // Committed immediately; holds the display steady while the first
        // timed phase is prepared.
        PhaseSpec {
            duration_ms: 0,
            frame: FrameDescriptor::Fixation,
            trigger: None,
        },
        PhaseSpec {
            duration_ms: characteristics.iti_ms,
            frame: FrameDescriptor::Fixation,
            trigger: None,
        },
        PhaseSpec {
            duration_ms: characteristics.durations_ms[0],
            frame: FrameDescriptor::Stimulus {
                colour: characteristics.stimulus_colours[0],
                position: characteristics.positions[0].into(),
            },
            trigger: Some(PhaseLabel::StimulusOnset1),
        },
        PhaseSpec {
            duration_ms: config.inter_stimulus_ms,
            frame: FrameDescriptor::Fixation,
            trigger: None,
        },
        PhaseSpec {
            duration_ms: characteristics.durations_ms[1],
            frame: FrameDescriptor::Stimulus {
                colour: characteristics.stimulus_colours[1],
                position: characteristics.positions[1].into(),
            },
            trigger: Some(PhaseLabel::StimulusOnset2),
        },
        PhaseSpec {
            duration_ms: config.inter_stimulus_ms,
            frame: FrameDescriptor::Fixation,
            trigger: None,
        },
        PhaseSpec {
            duration_ms: config.cue_ms,
            frame: FrameDescriptor::Cue {
                target: characteristics.target_item,
            },
            trigger: Some(PhaseLabel::CueOnset),
        },
        PhaseSpec {
            duration_ms: config.pre_response_ms,
            frame: FrameDescriptor::Fixation,
            trigger: None,
        },
    ]
}

/// Runs one trial start to finish: presentation timeline, response
/// collection, feedback, report. `Aborted` and `NoResponse` surface to the
/// caller; nothing is swallowed.
pub fn run_trial<'a, Rd, I, T, R>(
    ctx: &'a mut TrialContext<'a, Rd, I, T>,
    characteristics: &TrialCharacteristics,
    block_type: BlockType,
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<TrialReport, Error>
where
    Rd: Renderer,
    I: InputSource,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    info!(
        ?block_type,
        target_item = characteristics.target_item.number(),
        target_duration_ms = characteristics.target_duration_ms,
        rehearsal = ctx.rehearsal,
        "trial started"
    );

    // Stale input from the break or the previous trial must not count as
    // premature for this one.
    ctx.input.clear_pending();

    let sink = if ctx.rehearsal {
        None
    } else {
        ctx.trigger_sink.as_deref_mut()
    };
    let mut emitter = TriggerEmitter::new(sink, block_type, characteristics);

    let timeline = build_timeline(characteristics, config);
    let mut engine = TimelineEngine::new(&timeline);
    let run = engine.run(&mut *ctx.renderer, &mut *ctx.input, ctx.timer, &mut emitter)?;
    if run.deadline_misses > 0 {
        warn!(misses = run.deadline_misses, "trial presentation missed soft deadlines");
    }

    let response = match block_type {
        BlockType::Colour => collect_colour_response(
            &mut *ctx.renderer,
            &mut *ctx.input,
            ctx.timer,
            rng,
            &mut emitter,
            characteristics.target_colour,
        )?,
        BlockType::Duration => collect_duration_response(
            &mut *ctx.renderer,
            &mut *ctx.input,
            ctx.timer,
            &mut emitter,
            characteristics.target_duration_ms,
        )?,
    };

    // Show the performance score, marked when the response jumped the gun.
    ctx.renderer.render(&FrameDescriptor::Feedback {
        performance: response.performance_text(),
        premature: response.premature().is_some(),
    });
    emitter.emit(PhaseLabel::FeedbackOnset);
    ctx.renderer.commit();
    let shown_at = ctx.timer.now();
    ctx.timer.wait_until(shown_at + config.feedback_ms * 1_000_000);

    let condition_code = emitter.condition_code();
    info!(
        condition_code,
        idle_reaction_ms = response.idle_reaction_ms(),
        response_ms = response.response_ms(),
        "trial complete"
    );

    Ok(TrialReport {
        characteristics: characteristics.clone(),
        response,
        condition_code,
    })
}

/// Mean block score for break-screen feedback: colour blocks average the
/// performance figure, duration blocks the absolute offset.
pub fn average_performance(reports: &[TrialReport]) -> i64 {
    if reports.is_empty() {
        return 0;
    }
    let sum: f64 = reports
        .iter()
        .map(|report| match &report.response {
            ScoredResponse::Colour { score, .. } => f64::from(score.performance),
            ScoredResponse::Duration { score, .. } => score.abs_diff_ms as f64,
        })
        .sum();
    (sum / reports.len() as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{build_block_designs, expand};
    use crate::trigger::trigger_code;
    use msbias_core::{
        Button, ColourScore, DurationScore, Hue, InputEvent, InputEventKind, InputIdentity, Key,
    };
    use msbias_timing::HighPrecisionTimer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;

    /// Config with all timing shrunk so a full trial runs in tens of ms.
    fn fast_config() -> ExperimentConfig {
        ExperimentConfig {
            iti_range_ms: (5, 10),
            short_range_ms: (5, 15),
            long_range_ms: (30, 40),
            inter_stimulus_ms: 5,
            cue_ms: 5,
            pre_response_ms: 5,
            feedback_ms: 5,
        }
    }

    struct NullRenderer;
    impl Renderer for NullRenderer {
        fn render(&mut self, _frame: &FrameDescriptor) {}
        fn commit(&mut self) {}
    }

    struct ScriptedInput {
        events: VecDeque<InputEvent>,
        angle: Option<f32>,
    }

    impl ScriptedInput {
        fn colour_script(angle_deg: f32) -> Self {
            Self {
                events: VecDeque::from(vec![
                    InputEvent {
                        kind: InputEventKind::MotionStart,
                        identity: InputIdentity::Pointer { angle_deg },
                        at_ns: 1,
                    },
                    InputEvent {
                        kind: InputEventKind::ButtonDown,
                        identity: InputIdentity::Button(Button::Left),
                        at_ns: 1,
                    },
                ]),
                angle: Some(angle_deg),
            }
        }

        fn duration_script() -> Self {
            Self {
                events: VecDeque::from(vec![
                    InputEvent {
                        kind: InputEventKind::KeyDown,
                        identity: InputIdentity::Key(Key::Space),
                        at_ns: 1,
                    },
                    InputEvent {
                        kind: InputEventKind::KeyUp,
                        identity: InputIdentity::Key(Key::Space),
                        at_ns: 1,
                    },
                ]),
                angle: None,
            }
        }

        fn empty() -> Self {
            Self {
                events: VecDeque::new(),
                angle: None,
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn poll(&mut self) -> Option<InputEvent> {
            self.events.pop_front()
        }

        fn clear_pending(&mut self) {
            // Scripts model input that arrives after the trial starts, so
            // clearing keeps them queued.
        }

        fn quit_requested(&mut self) -> bool {
            false
        }

        fn pointer_angle(&self) -> Option<f32> {
            self.angle
        }

        fn exhausted(&self) -> bool {
            self.events.is_empty()
        }
    }

    struct Recorder(Vec<u8>);
    impl TriggerSink for Recorder {
        fn send(&mut self, code: u8) {
            self.0.push(code);
        }
    }

    struct PanickingSink;
    impl TriggerSink for PanickingSink {
        fn send(&mut self, code: u8) {
            panic!("trigger {code} sent in rehearsal mode");
        }
    }

    fn characteristics(seed: u64, config: &ExperimentConfig) -> TrialCharacteristics {
        let mut rng = StdRng::seed_from_u64(seed);
        let design = build_block_designs(8, &mut rng).unwrap()[0];
        expand(&design, config, &mut rng)
    }

    #[test]
    fn rehearsal_never_touches_the_trigger_sink() {
        let config = fast_config();
        let chars = characteristics(50, &config);
        let timer = HighPrecisionTimer::new();
        let mut renderer = NullRenderer;
        let mut input = ScriptedInput::colour_script(42.0);
        let mut sink = PanickingSink;
        let mut rng = StdRng::seed_from_u64(51);

        let mut ctx = TrialContext {
            renderer: &mut renderer,
            input: &mut input,
            timer: &timer,
            trigger_sink: Some(&mut sink),
            rehearsal: true,
        };
        let report = run_trial(&mut ctx, &chars, BlockType::Colour, &config, &mut rng).unwrap();
        assert!(matches!(report.response, ScoredResponse::Colour { .. }));
    }

    #[test]
    fn a_recorded_trial_emits_the_full_trigger_sequence() {
        let config = fast_config();
        let chars = characteristics(52, &config);
        let timer = HighPrecisionTimer::new();
        let mut renderer = NullRenderer;
        let mut input = ScriptedInput::duration_script();
        let mut sink = Recorder(Vec::new());
        let mut rng = StdRng::seed_from_u64(53);

        let mut ctx = TrialContext {
            renderer: &mut renderer,
            input: &mut input,
            timer: &timer,
            trigger_sink: Some(&mut sink),
            rehearsal: false,
        };
        let report = run_trial(&mut ctx, &chars, BlockType::Duration, &config, &mut rng).unwrap();

        let code = |label| {
            trigger_code(
                label,
                BlockType::Duration,
                chars.target_position,
                chars.target_duration_category,
                chars.target_item,
            )
        };
        assert_eq!(
            sink.0,
            vec![
                code(PhaseLabel::StimulusOnset1),
                code(PhaseLabel::StimulusOnset2),
                code(PhaseLabel::CueOnset),
                code(PhaseLabel::ResponseOnset),
                code(PhaseLabel::ResponseOffset),
                code(PhaseLabel::FeedbackOnset),
            ]
        );
        assert_eq!(report.condition_code, code(PhaseLabel::StimulusOnset1));
    }

    #[test]
    fn consecutive_trials_can_reuse_one_sink() {
        let config = fast_config();
        let chars = characteristics(58, &config);
        let timer = HighPrecisionTimer::new();
        let mut renderer = NullRenderer;
        let mut sink = Recorder(Vec::new());
        let mut rng = StdRng::seed_from_u64(59);

        // The sink borrow must end with each trial, so one device handle
        // serves a whole block of trials.
        let mut input = ScriptedInput::duration_script();
        let mut ctx = TrialContext {
            renderer: &mut renderer,
            input: &mut input,
            timer: &timer,
            trigger_sink: Some(&mut sink),
            rehearsal: false,
        };
        run_trial(&mut ctx, &chars, BlockType::Duration, &config, &mut rng).unwrap();

        let mut input = ScriptedInput::colour_script(90.0);
        let mut ctx = TrialContext {
            renderer: &mut renderer,
            input: &mut input,
            timer: &timer,
            trigger_sink: Some(&mut sink),
            rehearsal: false,
        };
        run_trial(&mut ctx, &chars, BlockType::Colour, &config, &mut rng).unwrap();

        // Six markers per trial, duration-block codes first.
        assert_eq!(sink.0.len(), 12);
        assert!(sink.0[..6].iter().all(|&code| code > 100));
        assert!(sink.0[6..].iter().all(|&code| code <= 100));
    }

    #[test]
    fn timeline_has_the_fixed_trial_shape() {
        let config = ExperimentConfig::default();
        let chars = characteristics(54, &config);
        let timeline = build_timeline(&chars, &config);

        assert_eq!(timeline.len(), 8);
        assert_eq!(timeline[0].duration_ms, 0);
        assert_eq!(timeline[1].duration_ms, chars.iti_ms);
        assert_eq!(timeline[2].duration_ms, chars.durations_ms[0]);
        assert_eq!(timeline[4].duration_ms, chars.durations_ms[1]);
        assert_eq!(timeline[6].duration_ms, config.cue_ms);
        assert_eq!(timeline[7].duration_ms, config.pre_response_ms);

        let triggers: Vec<_> = timeline.iter().map(|p| p.trigger).collect();
        assert_eq!(
            triggers,
            vec![
                None,
                None,
                Some(PhaseLabel::StimulusOnset1),
                None,
                Some(PhaseLabel::StimulusOnset2),
                None,
                Some(PhaseLabel::CueOnset),
                None,
            ]
        );
    }

    #[test]
    fn exhausted_input_surfaces_no_response() {
        let config = fast_config();
        let chars = characteristics(55, &config);
        let timer = HighPrecisionTimer::new();
        let mut renderer = NullRenderer;
        let mut input = ScriptedInput::empty();
        let mut rng = StdRng::seed_from_u64(56);

        let mut ctx = TrialContext {
            renderer: &mut renderer,
            input: &mut input,
            timer: &timer,
            trigger_sink: None,
            rehearsal: false,
        };
        let result = run_trial(&mut ctx, &chars, BlockType::Colour, &config, &mut rng);
        assert_eq!(result, Err(Error::NoResponse));
    }

    #[test]
    fn average_performance_uses_the_block_appropriate_column() {
        let config = fast_config();
        let chars = characteristics(57, &config);

        let colour_report = |performance: u8| TrialReport {
            characteristics: chars.clone(),
            response: ScoredResponse::Colour {
                selected: Hue(1),
                wheel_offset: 0,
                idle_reaction_ms: 100.0,
                response_ms: 200.0,
                premature: None,
                score: ColourScore {
                    raw_distance: 0,
                    abs_distance: 0,
                    signed_distance: 0,
                    performance,
                },
            },
            condition_code: 11,
        };
        let duration_report = |abs_diff_ms: u64| TrialReport {
            characteristics: chars.clone(),
            response: ScoredResponse::Duration {
                held_ms: 500.0,
                pressed: InputIdentity::Key(Key::Space),
                idle_reaction_ms: 100.0,
                response_ms: 500.0,
                premature: None,
                score: DurationScore {
                    diff_ms: abs_diff_ms as i64,
                    abs_diff_ms,
                    performance: format!("+{abs_diff_ms}"),
                },
            },
            condition_code: 111,
        };

        assert_eq!(average_performance(&[]), 0);
        assert_eq!(
            average_performance(&[colour_report(90), colour_report(71)]),
            81
        );
        assert_eq!(
            average_performance(&[duration_report(30), duration_report(41)]),
            36
        );
    }
}
