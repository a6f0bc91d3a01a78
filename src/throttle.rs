//! Screen OCR rate limiting
//!
//! A full-depth OCR pass is admitted at most once per interval. Requests
//! arriving inside the window still get a best-effort pass, only with a
//! shorter wait. The window opens when an attempt starts, not when it ends,
//! so concurrent requests cannot both win the full pass.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Time source for the throttle
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests and replay
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}

/// Which screen path a request was admitted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenPass {
    /// Full-depth pass; the window was opened by this request
    Full,
    /// Best-effort pass inside an open window
    Quick {
        /// Time until the next full pass is admitted
        remaining: Duration,
    },
    /// The OCR engine is still warming up; the window was left untouched
    NotReady,
}

/// Guards the "last full OCR pass" timestamp
pub struct ScreenThrottle<C: Clock + ?Sized = dyn Clock> {
    interval: Duration,
    last_full: Mutex<Option<Instant>>,
    clock: Arc<C>,
}

impl<C: Clock + ?Sized> ScreenThrottle<C> {
    pub fn new(interval: Duration, clock: Arc<C>) -> Self {
        Self {
            interval,
            last_full: Mutex::new(None),
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide the path for one request.
    ///
    /// The read-check-update runs under one lock, so at most one caller per
    /// window is admitted to [`ScreenPass::Full`]. `engine_ready` is only
    /// consulted outside the window.
    pub fn acquire(&self, engine_ready: bool) -> ScreenPass {
        let now = self.clock.now();
        let mut last_full = self
            .last_full
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(started) = *last_full {
            let elapsed = now.saturating_duration_since(started);
            if elapsed < self.interval {
                return ScreenPass::Quick {
                    remaining: self.interval - elapsed,
                };
            }
        }

        if !engine_ready {
            return ScreenPass::NotReady;
        }

        *last_full = Some(now);
        ScreenPass::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn throttle(clock: &Arc<ManualClock>) -> ScreenThrottle<ManualClock> {
        ScreenThrottle::new(Duration::from_secs(10), Arc::clone(clock))
    }

    #[test]
    fn test_first_request_is_full() {
        let clock = Arc::new(ManualClock::new());
        assert_eq!(throttle(&clock).acquire(true), ScreenPass::Full);
    }

    #[test]
    fn test_second_request_in_window_is_quick() {
        let clock = Arc::new(ManualClock::new());
        let throttle = throttle(&clock);

        assert_eq!(throttle.acquire(true), ScreenPass::Full);
        clock.advance(Duration::from_secs(3));
        assert_eq!(
            throttle.acquire(true),
            ScreenPass::Quick {
                remaining: Duration::from_secs(7)
            }
        );
    }

    #[test]
    fn test_window_reopens_after_interval() {
        let clock = Arc::new(ManualClock::new());
        let throttle = throttle(&clock);

        assert_eq!(throttle.acquire(true), ScreenPass::Full);
        clock.advance(Duration::from_secs(10));
        assert_eq!(throttle.acquire(true), ScreenPass::Full);
        assert!(matches!(throttle.acquire(true), ScreenPass::Quick { .. }));
    }

    #[test]
    fn test_not_ready_leaves_window_closed() {
        let clock = Arc::new(ManualClock::new());
        let throttle = throttle(&clock);

        assert_eq!(throttle.acquire(false), ScreenPass::NotReady);
        assert_eq!(throttle.acquire(true), ScreenPass::Full);
        // Inside the window readiness is irrelevant
        assert!(matches!(throttle.acquire(false), ScreenPass::Quick { .. }));
    }

    #[test]
    fn test_concurrent_requests_admit_one_full_pass() {
        let clock = Arc::new(ManualClock::new());
        let throttle = Arc::new(throttle(&clock));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let throttle = Arc::clone(&throttle);
                thread::spawn(move || throttle.acquire(true))
            })
            .collect();

        let full = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|pass| *pass == ScreenPass::Full)
            .count();
        assert_eq!(full, 1);
    }
}
