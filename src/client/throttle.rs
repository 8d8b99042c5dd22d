//! Throttle for the hardware frame-counter query.
//!
//! Reading the master sync counter is expensive enough that polling it every
//! frame is undesirable once the cluster is in steady state. The throttle is
//! a fixed-size token bucket: [`FRAME_COUNT_BURST`] queries pass unthrottled,
//! after which tokens refill at [`FRAME_COUNT_BURST`] per second. At 60 FPS
//! that is effectively no throttling at all; above it, queries degrade to
//! roughly one per second until [`FrameCountThrottle::rearm`] refills the
//! burst window.

use std::time::Instant;

/// Number of unthrottled queries in a full burst window, and the refill rate
/// per second. One second's worth of queries at 60 FPS.
pub const FRAME_COUNT_BURST: u64 = 60;

/// A monotonic tick source.
///
/// `frequency` is read once when the throttle is built. A frequency of 0 is a
/// valid degraded state meaning "no usable performance counter": the throttle
/// then allows every query instead of dividing by zero.
pub trait Clock {
    /// Current tick of the performance counter.
    fn ticks(&self) -> u64;
    /// Ticks per second, or 0 when the counter facility is unavailable.
    fn frequency(&self) -> u64;
}

/// Default clock backed by [`Instant`], with nanosecond ticks.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn ticks(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }
}

/// Token bucket gating the hardware frame-counter query.
#[derive(Debug)]
pub struct FrameCountThrottle<C: Clock = MonotonicClock> {
    clock: C,
    /// Read once at construction; 0 disables the throttle entirely.
    frequency: u64,
    tokens: u64,
    last_refill: u64,
}

impl<C: Clock> FrameCountThrottle<C> {
    pub fn new(clock: C) -> Self {
        let frequency = clock.frequency();
        let last_refill = clock.ticks();
        FrameCountThrottle {
            clock,
            frequency,
            tokens: FRAME_COUNT_BURST,
            last_refill,
        }
    }

    /// Whether a hardware query may be issued now. Consumes one token when it
    /// returns true.
    pub fn allow(&mut self) -> bool {
        if self.frequency == 0 {
            // No performance counter available. Degrade to always-allow.
            return true;
        }
        let now = self.clock.ticks();
        let elapsed = now.saturating_sub(self.last_refill);
        let earned = elapsed.saturating_mul(FRAME_COUNT_BURST) / self.frequency;
        if earned > 0 {
            self.tokens = (self.tokens + earned).min(FRAME_COUNT_BURST);
            if self.tokens == FRAME_COUNT_BURST {
                self.last_refill = now;
            } else {
                // Advance by the tick cost of the tokens actually earned so
                // fractional progress toward the next token carries over.
                self.last_refill = self
                    .last_refill
                    .saturating_add(earned.saturating_mul(self.frequency) / FRAME_COUNT_BURST);
            }
        }
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Refill the full burst window, for example after the counter was reset.
    pub fn rearm(&mut self) {
        self.tokens = FRAME_COUNT_BURST;
        self.last_refill = self.clock.ticks();
    }
}
