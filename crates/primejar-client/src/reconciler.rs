//! Reconciliation of authoritative counter values into display state.
//!
//! Values arrive from either transport (push frames or poll results) and
//! enter through [`Reconciler::observe`]. The reconciler keeps a queue of
//! pending single-step increments and drains it one value per animation
//! tick, so the displayed counter walks through every intermediate
//! integer instead of jumping. When the queue is empty the displayed
//! value equals the last authoritative value -- that invariant is what
//! the polling gate relies on.
//!
//! A value *below* the last authoritative one means the device and the
//! display have desynchronized (or the counter wrapped its bound); the
//! reconciler bypasses animation and snaps straight to the new value.
//!
//! A value *equal* to the last authoritative one is dropped. This is
//! what keeps a client's own step command from double-applying: the
//! command and the push notification it triggers describe the same
//! logical event, and the second arrival changes nothing.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::display::CounterDisplay;

/// Client-local mirror of the counter plus the in-flight animation queue.
#[derive(Debug)]
pub struct Reconciler<D: CounterDisplay> {
    /// The rendering consumer.
    display: D,

    /// Value currently shown by the display.
    displayed: u64,

    /// Last authoritative value received from the device.
    authoritative: u64,

    /// Pending single-step increments, oldest first.
    pending: VecDeque<u64>,
}

impl<D: CounterDisplay> Reconciler<D> {
    /// Create a reconciler around a display, starting from 0.
    ///
    /// Call [`initialize`](Self::initialize) with the first fetched
    /// value before observing updates, mirroring how the device client
    /// fetches once and displays without animation at startup.
    pub const fn new(display: D) -> Self {
        Self {
            display,
            displayed: 0,
            authoritative: 0,
            pending: VecDeque::new(),
        }
    }

    /// Set the initial value without animation.
    pub fn initialize(&mut self, value: u64) {
        self.displayed = value;
        self.authoritative = value;
        self.pending.clear();
        self.display.snap(value);
    }

    /// Merge a new authoritative value into display state.
    ///
    /// - Equal to the current authoritative value: no-op.
    /// - Greater: every intermediate integer is queued for animated
    ///   catch-up.
    /// - Smaller: desync recovery -- the queue is cleared and the display
    ///   snaps directly to the new value.
    pub fn observe(&mut self, value: u64) {
        if value == self.authoritative {
            debug!(value, "already authoritative, ignoring");
            return;
        }

        if value < self.authoritative {
            warn!(
                displayed = self.displayed,
                previous = self.authoritative,
                value,
                "value moved backward, snapping to authoritative"
            );
            self.pending.clear();
            self.displayed = value;
            self.authoritative = value;
            self.display.snap(value);
            return;
        }

        // Queue every step from the previous authoritative value up to
        // the new one; an earlier run still draining keeps its place.
        let mut next = self.authoritative;
        while next < value {
            next = next.saturating_add(1);
            self.pending.push_back(next);
        }
        self.authoritative = value;
        debug!(
            value,
            queued = self.pending.len(),
            "queued animated catch-up"
        );
    }

    /// Advance the animation by one step.
    ///
    /// Pops the oldest pending increment, shows it, and returns it.
    /// Returns `None` when the queue is already drained. Called on the
    /// fixed animation cadence by the session loop.
    pub fn drive_tick(&mut self) -> Option<u64> {
        let value = self.pending.pop_front()?;
        self.displayed = value;
        self.display.advance_step(value);
        Some(value)
    }

    /// Whether an animation run is still draining.
    ///
    /// Polling must not fetch while this is true; a fetch landing
    /// mid-drain could leave the display permanently diverged.
    pub fn is_draining(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The value currently shown by the display.
    pub const fn displayed(&self) -> u64 {
        self.displayed
    }

    /// The last authoritative value received.
    pub const fn authoritative(&self) -> u64 {
        self.authoritative
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A display that records every call for assertions.
    #[derive(Debug, Default)]
    struct RecordingDisplay {
        steps: Vec<u64>,
        snaps: Vec<u64>,
    }

    impl CounterDisplay for RecordingDisplay {
        fn advance_step(&mut self, value: u64) {
            self.steps.push(value);
        }

        fn snap(&mut self, value: u64) {
            self.snaps.push(value);
        }
    }

    fn drain<D: CounterDisplay>(reconciler: &mut Reconciler<D>) {
        while reconciler.drive_tick().is_some() {}
    }

    #[test]
    fn initialize_snaps_without_animation() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(11);
        assert_eq!(reconciler.displayed(), 11);
        assert_eq!(reconciler.display.snaps, vec![11]);
        assert!(reconciler.display.steps.is_empty());
    }

    #[test]
    fn animates_through_every_intermediate_integer() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(11);

        // Authoritative sequence 11 -> 13 -> 17: the display must walk
        // through every integer, not just the primes.
        reconciler.observe(13);
        reconciler.observe(17);
        drain(&mut reconciler);

        assert_eq!(reconciler.display.steps, vec![12, 13, 14, 15, 16, 17]);
        assert_eq!(reconciler.displayed(), 17);
        assert_eq!(reconciler.authoritative(), 17);
        assert!(!reconciler.is_draining());
    }

    #[test]
    fn one_step_per_tick() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(2);
        reconciler.observe(5);

        assert_eq!(reconciler.drive_tick(), Some(3));
        assert!(reconciler.is_draining());
        assert_eq!(reconciler.drive_tick(), Some(4));
        assert_eq!(reconciler.drive_tick(), Some(5));
        assert_eq!(reconciler.drive_tick(), None);
    }

    #[test]
    fn update_during_drain_extends_the_queue() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(11);
        reconciler.observe(13);

        // One tick in, a new authoritative value arrives.
        assert_eq!(reconciler.drive_tick(), Some(12));
        reconciler.observe(17);
        drain(&mut reconciler);

        assert_eq!(reconciler.display.steps, vec![12, 13, 14, 15, 16, 17]);
        assert_eq!(reconciler.displayed(), 17);
    }

    #[test]
    fn decrease_snaps_with_zero_animated_steps() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(50);
        reconciler.observe(3);

        assert!(!reconciler.is_draining());
        assert_eq!(reconciler.displayed(), 3);
        assert_eq!(reconciler.display.snaps, vec![50, 3]);
        assert!(reconciler.display.steps.is_empty());
    }

    #[test]
    fn decrease_mid_drain_clears_the_queue() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(10);
        reconciler.observe(15);
        assert_eq!(reconciler.drive_tick(), Some(11));

        reconciler.observe(3);
        assert!(!reconciler.is_draining());
        assert_eq!(reconciler.displayed(), 3);
        assert_eq!(reconciler.drive_tick(), None);
    }

    #[test]
    fn repeated_value_is_ignored() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(11);
        reconciler.observe(13);
        drain(&mut reconciler);

        // The push echo of the client's own step command carries the
        // value we already hold; nothing may move.
        reconciler.observe(13);
        assert!(!reconciler.is_draining());
        assert_eq!(reconciler.display.steps, vec![12, 13]);
        assert_eq!(reconciler.displayed(), 13);
    }

    #[test]
    fn drained_queue_matches_authoritative() {
        let mut reconciler = Reconciler::new(RecordingDisplay::default());
        reconciler.initialize(0);
        for value in [2, 3, 5, 7] {
            reconciler.observe(value);
        }
        drain(&mut reconciler);
        assert_eq!(reconciler.displayed(), reconciler.authoritative());
        assert_eq!(reconciler.displayed(), 7);
    }
}
