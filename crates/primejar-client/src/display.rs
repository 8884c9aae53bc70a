//! Display seam between the reconciler and the rendering widget.
//!
//! The actual odometer (digit strips, easing, click audio) is a rendering
//! concern outside this crate. The reconciler drives it through
//! [`CounterDisplay`]: one call per animated increment, or a single snap
//! when animation is bypassed.

use tracing::info;

/// A consumer of reconciled counter values.
///
/// Implementations render however they like; the reconciler guarantees
/// that [`advance_step`](Self::advance_step) is called with consecutive
/// values at the configured cadence, and that [`snap`](Self::snap) may
/// jump anywhere.
pub trait CounterDisplay: Send {
    /// Show the next value of an animated run. `value` is always exactly
    /// one above the previously displayed value. Implementations play
    /// their per-step feedback (the click) here.
    fn advance_step(&mut self, value: u64);

    /// Show a value immediately, without animation. Used for the initial
    /// display and for desync recovery.
    fn snap(&mut self, value: u64);
}

/// A display that logs every update through `tracing`.
///
/// Used by the `jar-monitor` binary and anywhere a headless observer
/// just wants the values on a log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisplay;

impl TracingDisplay {
    /// Create a new tracing display.
    pub const fn new() -> Self {
        Self
    }
}

impl CounterDisplay for TracingDisplay {
    fn advance_step(&mut self, value: u64) {
        info!(value, "tick");
    }

    fn snap(&mut self, value: u64) {
        info!(value, "snap");
    }
}
