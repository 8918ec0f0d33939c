//! Monotonic time source
//!
//! The session never reads hardware timers directly. It asks a [`Clock`] for
//! the elapsed time in microseconds and derives every protocol deadline from
//! that value (receive windows, duty-cycle off-time, transaction timeouts).
//!
//! [`TickClock`] is the usual implementation on bare metal: a periodic timer
//! interrupt calls [`TickClock::tick`] at a fixed cadence (1 ms by default)
//! and the counter accumulates the configured tick length while enabled.

use core::cell::Cell;

/// Default tick length in microseconds (1 ms systick).
pub const DEFAULT_TICK_US: u64 = 1_000;

/// Monotonic microsecond clock
pub trait Clock {
    /// Elapsed time in microseconds since an arbitrary origin
    fn now_us(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Tick-driven microsecond accumulator
#[derive(Debug)]
pub struct TickClock {
    elapsed_us: Cell<u64>,
    tick_us: u64,
    enabled: Cell<bool>,
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock {
    /// Create a clock advancing 1000 µs per tick
    pub const fn new() -> Self {
        Self::with_tick(DEFAULT_TICK_US)
    }

    /// Create a clock with a custom tick length
    pub const fn with_tick(tick_us: u64) -> Self {
        Self {
            elapsed_us: Cell::new(0),
            tick_us,
            enabled: Cell::new(true),
        }
    }

    /// Periodic tick handler; a no-op while the clock is disabled
    pub fn tick(&self) {
        if self.enabled.get() {
            self.advance(self.tick_us);
        }
    }

    /// Add `us` microseconds regardless of the enabled flag
    pub fn advance(&self, us: u64) {
        self.elapsed_us.set(self.elapsed_us.get().saturating_add(us));
    }

    /// Enable or disable tick accumulation
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Whether ticks are currently accumulated
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Configured tick length
    pub fn tick_us(&self) -> u64 {
        self.tick_us
    }
}

impl Clock for TickClock {
    fn now_us(&self) -> u64 {
        self.elapsed_us.get()
    }
}
