//! Mode actions
//!
//! Actions produced by the mode state machines for the runtime to execute,
//! strictly in order.

use std::time::Duration;

use marsmode_proto::{Frame, SafetyMode};

/// Actions produced by a [`crate::Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeAction {
    /// Put this frame on the bus.
    Send(Frame),

    /// Switch the interface safety mode.
    SetSafety(SafetyMode),

    /// Block for a fixed time before the next action.
    Delay(Duration),

    /// Block for a uniformly random time in `[min, max)`.
    RandomDelay {
        /// Lower bound (inclusive)
        min: Duration,
        /// Upper bound (exclusive)
        max: Duration,
    },
}

impl ModeAction {
    /// Total fixed delay contained in a batch of actions.
    ///
    /// Random delays are not counted.
    pub fn fixed_delay(actions: &[Self]) -> Duration {
        actions
            .iter()
            .map(|action| match action {
                Self::Delay(d) => *d,
                _ => Duration::ZERO,
            })
            .sum()
    }

    /// Frames sent by a batch of actions, in order.
    pub fn frames(actions: &[Self]) -> impl Iterator<Item = &Frame> {
        actions.iter().filter_map(|action| match action {
            Self::Send(frame) => Some(frame),
            _ => None,
        })
    }
}
