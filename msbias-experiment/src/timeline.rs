use crate::error::Error;
use crate::trigger::TriggerEmitter;
use msbias_core::{InputSource, PhaseSpec, Renderer};
use msbias_timing::Timer;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineState {
    Idle,
    Displaying(usize),
    Done,
}

/// What the engine measured while running one timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineRun {
    /// Presentation instant of each phase, nanoseconds on the trial clock.
    pub presented_at_ns: Vec<u64>,
    /// Phases whose budget was already spent when the wait was reached.
    /// Recorded as a diagnostic, never corrected by skipping or repeating.
    pub deadline_misses: u32,
}

/// Sequences a fixed timeline of display phases with exact durations and a
/// one-phase compute-ahead pipeline: while phase `i` is on screen, phase
/// `i + 1` is rendered into the back buffer, so preparation cost never
/// delays a phase onset.
pub struct TimelineEngine<'a> {
    phases: &'a [PhaseSpec],
    state: TimelineState,
    /// Index of the phase currently committed to the display.
    current: Option<usize>,
    /// Index of the phase sitting prepared in the back buffer.
    prepared: Option<usize>,
    deadline_misses: u32,
}

impl<'a> TimelineEngine<'a> {
    pub fn new(phases: &'a [PhaseSpec]) -> Self {
        Self {
            phases,
            state: TimelineState::Idle,
            current: None,
            prepared: None,
            deadline_misses: 0,
        }
    }

    pub fn state(&self) -> TimelineState {
        self.state
    }

    pub fn deadline_misses(&self) -> u32 {
        self.deadline_misses
    }

    /// Runs the timeline to completion. A pending quit request is honoured
    /// at each phase boundary, after the previous phase has held its full
    /// duration; an in-progress phase is never cut short.
    pub fn run<Rd, I, T>(
        &mut self,
        renderer: &mut Rd,
        input: &mut I,
        timer: &T,
        emitter: &mut TriggerEmitter<'_>,
    ) -> Result<TimelineRun, Error>
    where
        Rd: Renderer,
        I: InputSource,
        T: Timer<Timestamp = u64>,
    {
        let mut presented_at_ns = Vec::with_capacity(self.phases.len());

        if let Some(first) = self.phases.first() {
            renderer.render(&first.frame);
            self.prepared = Some(0);
        }

        for (index, spec) in self.phases.iter().enumerate() {
            if input.quit_requested() {
                return Err(Error::Aborted);
            }

            // The marker must hit the sink at the instant the phase becomes
            // visible, so it goes out just before the commit.
            if let Some(label) = spec.trigger {
                emitter.emit(label);
            }

            renderer.commit();
            let shown_at = timer.now();
            presented_at_ns.push(shown_at);
            self.current = Some(index);
            self.prepared = None;
            self.state = TimelineState::Displaying(index);

            // Compute-ahead: prepare the next phase while this one is held.
            if let Some(next) = self.phases.get(index + 1) {
                renderer.render(&next.frame);
                self.prepared = Some(index + 1);
            }

            let deadline = shown_at + spec.duration_ms * 1_000_000;
            if !timer.wait_until(deadline) && spec.duration_ms > 0 {
                // Preparation overran the phase budget. Continue without
                // waiting; never wait negative time.
                self.deadline_misses += 1;
                warn!(phase = index, duration_ms = spec.duration_ms, "phase deadline missed");
            }
        }

        self.current = None;
        self.state = TimelineState::Done;
        Ok(TimelineRun {
            presented_at_ns,
            deadline_misses: self.deadline_misses,
        })
    }
}
