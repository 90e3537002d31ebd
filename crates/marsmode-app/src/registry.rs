//! Mode registry.

use marsmode_core::{AdvancedMode, BlindTickle, ClockSync, Mode, ModeKind};

use crate::Config;

/// Build the mode named by `kind`, parameterized from `config`.
pub fn build_mode(kind: ModeKind, config: &Config) -> Box<dyn Mode> {
    if let Some(blind) = config.blind(kind) {
        return Box::new(BlindTickle::new(blind));
    }
    if let Some(clock_sync) = config.clock_sync(kind) {
        return Box::new(ClockSync::new(clock_sync));
    }
    Box::new(AdvancedMode::new(config.advanced()))
}
