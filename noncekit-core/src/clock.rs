//! Coarse time windows ("ticks") used to bound token validity.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use crate::error::{NonceError, NonceResult};

/// Source of wall-clock time, in whole seconds since the Unix epoch.
pub trait TimeSource: Send + Sync {
    /// Returns the current Unix time in seconds.
    fn now_unix_seconds(&self) -> u64;
}

/// Reads the system clock. Clocks set before the epoch read as `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }
}

/// A manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    now: AtomicU64,
}

impl FixedTimeSource {
    /// Creates a clock frozen at `unix_seconds`.
    #[must_use]
    pub const fn new(unix_seconds: u64) -> Self {
        Self {
            now: AtomicU64::new(unix_seconds),
        }
    }

    /// Moves the clock to `unix_seconds`.
    pub fn set(&self, unix_seconds: u64) {
        self.now.store(unix_seconds, Ordering::SeqCst);
    }

    /// Moves the clock forward by `seconds`, stopping at `u64::MAX`.
    pub fn advance(&self, seconds: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(seconds))
            });
    }
}

impl TimeSource for FixedTimeSource {
    fn now_unix_seconds(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Index of a time window: `floor(unix_seconds / window_seconds)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the tick `windows` windows before this one, if it exists.
    #[must_use]
    pub const fn checked_back(self, windows: u64) -> Option<Self> {
        match self.0.checked_sub(windows) {
            Some(tick) => Some(Self(tick)),
            None => None,
        }
    }

    /// Big-endian encoding used as hash input.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derives ticks from an injected [`TimeSource`].
#[derive(Clone)]
pub struct TickClock {
    source: Arc<dyn TimeSource>,
    window_seconds: u64,
}

impl TickClock {
    /// Creates a clock with windows of `window_seconds`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `window_seconds` is zero.
    pub fn new(source: Arc<dyn TimeSource>, window_seconds: u64) -> NonceResult<Self> {
        if window_seconds == 0 {
            return Err(NonceError::config("window_seconds", "must be greater than 0"));
        }
        Ok(Self {
            source,
            window_seconds,
        })
    }

    /// Length of one window in seconds.
    #[must_use]
    pub const fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    /// Tick containing `unix_seconds`.
    #[must_use]
    pub const fn tick_at(&self, unix_seconds: u64) -> Tick {
        Tick(unix_seconds / self.window_seconds)
    }

    /// Tick containing the current time.
    #[must_use]
    pub fn current_tick(&self) -> Tick {
        self.tick_at(self.source.now_unix_seconds())
    }

    /// The tick before [`current_tick`](Self::current_tick), saturating at zero.
    #[must_use]
    pub fn previous_tick(&self) -> Tick {
        let current = self.current_tick();
        current.checked_back(1).unwrap_or(current)
    }
}

impl fmt::Debug for TickClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickClock")
            .field("window_seconds", &self.window_seconds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_and_previous_tick() {
        let source = Arc::new(FixedTimeSource::new(43_200 * 1_000 + 17));
        let clock = TickClock::new(source.clone(), 43_200).expect("clock");
        assert_eq!(clock.current_tick(), Tick(1_000));
        assert_eq!(clock.previous_tick(), Tick(999));

        source.advance(43_200);
        assert_eq!(clock.current_tick(), Tick(1_001));
    }

    #[test]
    fn test_tick_boundaries() {
        let clock = TickClock::new(Arc::new(FixedTimeSource::new(0)), 10).expect("clock");
        assert_eq!(clock.tick_at(9), Tick(0));
        assert_eq!(clock.tick_at(10), Tick(1));
        assert_eq!(clock.tick_at(19), Tick(1));
    }

    #[test]
    fn test_previous_tick_saturates_at_zero() {
        let clock = TickClock::new(Arc::new(FixedTimeSource::new(5)), 10).expect("clock");
        assert_eq!(clock.current_tick(), Tick(0));
        assert_eq!(clock.previous_tick(), Tick(0));
        assert_eq!(Tick(0).checked_back(1), None);
    }

    #[test]
    fn test_fixed_time_source_advance_saturates() {
        let source = FixedTimeSource::new(u64::MAX - 1);
        source.advance(5);
        assert_eq!(source.now_unix_seconds(), u64::MAX);
        source.advance(1);
        assert_eq!(source.now_unix_seconds(), u64::MAX);
    }

    #[test]
    fn test_zero_window_rejected() {
        match TickClock::new(Arc::new(SystemTimeSource), 0) {
            Err(NonceError::InvalidConfig { attribute, .. }) => {
                assert_eq!(attribute, "window_seconds");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_system_time_source_is_after_2020() {
        assert!(SystemTimeSource.now_unix_seconds() > 1_577_836_800);
    }
}
