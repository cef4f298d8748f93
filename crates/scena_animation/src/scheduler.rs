//! Fixed-rate tick source
//!
//! Playback is driven from outside at a nominal rate (30 Hz by default).
//! The scheduler only decides when the next tick is due; it never sleeps
//! or spawns anything itself.

use std::time::{Duration, Instant};

/// Nominal preview rate
pub const DEFAULT_TICK_HZ: u32 = 30;

/// Decides when the timeline should be ticked
#[derive(Clone, Debug)]
pub struct TickScheduler {
    hz: u32,
    period: Duration,
    next_due: Option<Instant>,
    ticks: u64,
}

impl TickScheduler {
    pub fn new(hz: u32) -> Self {
        let hz = hz.max(1);
        Self {
            hz,
            period: Duration::from_secs(1) / hz,
            next_due: None,
            ticks: 0,
        }
    }

    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// Interval between ticks
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks granted since creation or the last reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns true when a tick is due at `now` and schedules the next one.
    ///
    /// The first poll is always due. After a stall the schedule restarts
    /// from `now` instead of firing a burst of catch-up ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = match self.next_due {
            None => true,
            Some(deadline) => now >= deadline,
        };
        if !due {
            return false;
        }

        let mut next = self.next_due.unwrap_or(now) + self.period;
        if next <= now {
            next = now + self.period;
        }
        self.next_due = Some(next);
        self.ticks += 1;
        true
    }

    /// When the next tick is due, or `now` if none has been scheduled
    pub fn next_deadline(&self, now: Instant) -> Instant {
        self.next_due.unwrap_or(now)
    }

    pub fn reset(&mut self) {
        self.next_due = None;
        self.ticks = 0;
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let scheduler = TickScheduler::default();
        assert_eq!(scheduler.hz(), 30);
        assert_eq!(scheduler.period(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn test_poll_spacing() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(10);

        assert!(scheduler.poll(start));
        assert!(!scheduler.poll(start + Duration::from_millis(50)));
        assert!(scheduler.poll(start + Duration::from_millis(100)));
        assert_eq!(
            scheduler.next_deadline(start),
            start + Duration::from_millis(200)
        );
        assert_eq!(scheduler.ticks(), 2);
    }

    #[test]
    fn test_stall_does_not_burst() {
        let start = Instant::now();
        let mut scheduler = TickScheduler::new(10);
        scheduler.poll(start);

        let late = start + Duration::from_secs(2);
        assert!(scheduler.poll(late));
        assert!(!scheduler.poll(late + Duration::from_millis(10)));
        assert_eq!(scheduler.next_deadline(late), late + Duration::from_millis(100));
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let mut scheduler = TickScheduler::new(0);
        assert_eq!(scheduler.hz(), 1);
        scheduler.poll(Instant::now());
        scheduler.reset();
        assert_eq!(scheduler.ticks(), 0);
    }
}
