use std::time::SystemTime;

/// Whole-second countdown decremented locally once per tick.
///
/// Seeded from server values and never resynchronised per tick, so drift
/// between client and server clocks is tolerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    running: bool,
}

impl Countdown {
    /// Start counting down from `seconds`.
    pub fn seed(&mut self, seconds: u64) {
        self.remaining = seconds;
        self.running = seconds > 0;
    }

    /// Start counting down to `end`, measured from `now`.
    pub fn seed_until(&mut self, end: SystemTime, now: SystemTime) {
        let remaining = end
            .duration_since(now)
            .map(|left| left.as_secs() + u64::from(left.subsec_nanos() > 0))
            .unwrap_or(0);
        self.seed(remaining);
    }

    /// Freeze at the current value.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one second. Returns `true` on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return true;
        }
        false
    }

    /// Whole seconds left.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Still counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn reaches_zero_once() {
        let mut countdown = Countdown::default();
        countdown.seed(2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(!countdown.tick());
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }

    #[test]
    fn stopped_countdown_keeps_its_value() {
        let mut countdown = Countdown::default();
        countdown.seed(30);
        countdown.tick();
        countdown.stop();
        countdown.tick();
        assert_eq!(countdown.remaining(), 29);
    }

    #[test]
    fn seeding_from_an_end_time_rounds_up() {
        let now = SystemTime::now();
        let mut countdown = Countdown::default();
        countdown.seed_until(now + Duration::from_millis(119_400), now);
        assert_eq!(countdown.remaining(), 120);

        countdown.seed_until(now - Duration::from_secs(1), now);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }
}
