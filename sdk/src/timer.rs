use std::time::Duration;
use tokio::time::Instant;

/// Periodic timer handle owned by the session and fired by its scheduler.
#[derive(Debug, Clone)]
pub struct PeriodicTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl PeriodicTimer {
    /// Create a disarmed timer.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Arm or disarm. Arming an armed timer keeps its current deadline.
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        match (enabled, self.deadline) {
            (true, None) => self.deadline = Some(now + self.period),
            (false, _) => self.deadline = None,
            (true, Some(_)) => {}
        }
    }

    /// Restart the current period if armed.
    pub fn reset(&mut self, now: Instant) {
        if self.deadline.is_some() {
            self.deadline = Some(now + self.period);
        }
    }

    /// Returns true once per elapsed period and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                let next = deadline + self.period;
                self.deadline = Some(if next > now { next } else { now + self.period });
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_timer_never_fires() {
        let now = Instant::now();
        let mut timer = PeriodicTimer::new(Duration::from_secs(1));
        assert!(!timer.poll(now + Duration::from_secs(10)));
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn fires_once_per_period() {
        let now = Instant::now();
        let mut timer = PeriodicTimer::new(Duration::from_secs(1));
        timer.set_enabled(true, now);

        assert!(!timer.poll(now + Duration::from_millis(999)));
        assert!(timer.poll(now + Duration::from_secs(1)));
        assert!(!timer.poll(now + Duration::from_millis(1500)));
        assert!(timer.poll(now + Duration::from_secs(2)));
    }

    #[test]
    fn reset_pushes_deadline_out() {
        let now = Instant::now();
        let mut timer = PeriodicTimer::new(Duration::from_secs(30));
        timer.set_enabled(true, now);
        timer.reset(now + Duration::from_secs(20));

        assert!(!timer.poll(now + Duration::from_secs(31)));
        assert!(timer.poll(now + Duration::from_secs(50)));
    }

    #[test]
    fn rearming_keeps_deadline() {
        let now = Instant::now();
        let mut timer = PeriodicTimer::new(Duration::from_secs(1));
        timer.set_enabled(true, now);
        timer.set_enabled(true, now + Duration::from_millis(500));
        assert_eq!(timer.deadline(), Some(now + Duration::from_secs(1)));

        timer.set_enabled(false, now);
        timer.reset(now);
        assert!(!timer.is_enabled());
    }
}
