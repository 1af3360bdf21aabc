//! Race timer with pause rebasing.
//!
//! Times are offsets from an arbitrary host epoch (app start, frame clock).
//! The clock never reads the wall clock itself so replays stay
//! deterministic.

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaceClock {
    origin: Option<Duration>,
    paused_at: Option<Duration>,
}

impl RaceClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the green-light instant.
    pub fn start(&mut self, now: Duration) {
        self.origin = Some(now);
        self.paused_at = None;
    }

    pub fn started(&self) -> bool {
        self.origin.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self, now: Duration) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Shifts the origin forward by the time spent paused.
    pub fn resume(&mut self, now: Duration) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };
        if let Some(origin) = self.origin.as_mut() {
            *origin += now.saturating_sub(paused_at);
        }
    }

    /// Race time excluding pauses. Zero before the start.
    pub fn elapsed(&self, now: Duration) -> Duration {
        let Some(origin) = self.origin else {
            return Duration::ZERO;
        };
        let until = self.paused_at.unwrap_or(now);
        until.saturating_sub(origin)
    }

    pub fn elapsed_secs(&self, now: Duration) -> f32 {
        self.elapsed(now).as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_zero_before_start() {
        let clock = RaceClock::new();
        assert_eq!(clock.elapsed(secs(10.0)), Duration::ZERO);
        assert!(!clock.started());
    }

    #[test]
    fn test_pause_excluded_from_elapsed() {
        let mut clock = RaceClock::new();
        clock.start(secs(3.0));
        clock.pause(secs(8.0));
        assert!((clock.elapsed_secs(secs(20.0)) - 5.0).abs() < 1e-4);
        clock.resume(secs(20.0));
        assert!(!clock.is_paused());
        assert!((clock.elapsed_secs(secs(21.0)) - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_double_pause_keeps_first_instant() {
        let mut clock = RaceClock::new();
        clock.start(Duration::ZERO);
        clock.pause(secs(1.0));
        clock.pause(secs(4.0));
        clock.resume(secs(5.0));
        assert!((clock.elapsed_secs(secs(5.0)) - 1.0).abs() < 1e-4);
    }
}
