//! Single-character command mapping for the serial channel.

use crate::shared::TargetHandle;

/// Stateless mapping from received characters to target changes.
///
/// `'h'` requests a re-home; digits select an absolute position band;
/// everything else is dropped silently. Digit targets are deliberately not
/// clamped to the travel endpoints: `'0'` lands below the closed endpoint.
pub struct CommandInterpreter {
    range: i32,
    target: TargetHandle,
}

impl CommandInterpreter {
    pub fn new(range: i32, target: TargetHandle) -> Self {
        Self { range, target }
    }

    pub fn on_char(&self, ch: char) {
        match ch {
            'h' => {
                tracing::debug!("re-home command");
                self.target.request_rehome();
            }
            '0'..='9' => {
                let digit = ch as i32 - '0' as i32;
                let steps = (digit + 1) * (self.range / 10);
                tracing::debug!(%ch, steps, "position command");
                self.target.set(steps);
            }
            _ => {}
        }
    }
}
