use crate::phase::FrameDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Key {
    Space,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Button {
    Left,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEventKind {
    MotionStart,
    ButtonDown,
    ButtonUp,
    KeyDown,
    KeyUp,
}

/// Device-level identity of the thing that moved or was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputIdentity {
    Pointer { angle_deg: f32 },
    Button(Button),
    Key(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputEventKind,
    pub identity: InputIdentity,
    /// Device timestamp in nanoseconds; 0 means the device had none.
    pub at_ns: u64,
}

/// Drawing surface capability. `render` prepares the back buffer, `commit`
/// makes it visible. The split is what allows the engine to prepare the
/// next phase's content while the current phase is still on screen.
pub trait Renderer {
    fn render(&mut self, frame: &FrameDescriptor);
    fn commit(&mut self);
}

/// Participant input capability.
pub trait InputSource {
    /// Next pending event, if any. Never blocks.
    fn poll(&mut self) -> Option<InputEvent>;

    /// Discards stale events between trials.
    fn clear_pending(&mut self);

    /// True if a quit request is pending. Consumes only quit events,
    /// leaving everything else queued.
    fn quit_requested(&mut self) -> bool;

    /// Current dial angle of the pointer, if the device has one.
    fn pointer_angle(&self) -> Option<f32>;

    /// True once the source can never produce another event.
    fn exhausted(&self) -> bool;
}

/// Synchronization channel to the recording device.
pub trait TriggerSink {
    fn send(&mut self, code: u8);
}
