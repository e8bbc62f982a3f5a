//! Elapsed-time measurement and sleeping.

use crate::error::{PortkitError, Result};
use std::time::{Duration, Instant};

/// Stopwatch that accumulates time across start/stop sessions.
///
/// Typically wrapped around calls to external tools so that the total time
/// spent in them can be reported. Sessions do not nest: starting a running
/// timer or stopping an idle one is an error.
#[derive(Debug, Default)]
pub struct SysTimer {
    started: Option<Instant>,
    accumulated: Duration,
}

impl SysTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a session.
    pub fn start(&mut self) -> Result<()> {
        if self.started.is_some() {
            return Err(PortkitError::TimerAlreadyRunning);
        }
        self.started = Some(Instant::now());
        Ok(())
    }

    /// End the running session and return the total elapsed seconds.
    pub fn stop(&mut self) -> Result<f64> {
        let started = self.started.take().ok_or(PortkitError::TimerNotRunning)?;
        self.accumulated += started.elapsed();
        Ok(self.accumulated.as_secs_f64())
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Total seconds of all finished sessions plus the running one.
    ///
    /// Never decreases, since it is built on a monotonic clock.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn elapsed(&self) -> Duration {
        let running = self
            .started
            .map(|started| started.elapsed())
            .unwrap_or_default();
        self.accumulated + running
    }

    /// Stop any running session and discard the accumulated time.
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }
}

/// Block the calling thread for at least `ms` milliseconds.
pub fn sleep_milliseconds(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_non_decreasing() {
        let mut timer = SysTimer::new();
        timer.start().unwrap();
        let first = timer.elapsed_seconds();
        let second = timer.elapsed_seconds();
        assert!(second >= first);
        assert!(first >= 0.0);
    }

    #[test]
    fn test_no_nesting() {
        let mut timer = SysTimer::new();
        assert!(matches!(timer.stop(), Err(PortkitError::TimerNotRunning)));

        timer.start().unwrap();
        assert!(matches!(
            timer.start(),
            Err(PortkitError::TimerAlreadyRunning)
        ));
        assert!(timer.is_running());

        timer.stop().unwrap();
        assert!(!timer.is_running());
        assert!(matches!(timer.stop(), Err(PortkitError::TimerNotRunning)));
    }

    #[test]
    fn test_sessions_accumulate() {
        let mut timer = SysTimer::new();

        timer.start().unwrap();
        sleep_milliseconds(5);
        let after_first = timer.stop().unwrap();
        assert!(after_first >= 0.005);

        // Idle time is not counted
        sleep_milliseconds(20);
        assert_eq!(timer.elapsed_seconds(), after_first);

        timer.start().unwrap();
        sleep_milliseconds(5);
        let after_second = timer.stop().unwrap();
        assert!(after_second >= after_first + 0.005);
    }

    #[test]
    fn test_reset() {
        let mut timer = SysTimer::new();
        timer.start().unwrap();
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_sleep_never_undershoots() {
        let start = Instant::now();
        sleep_milliseconds(15);
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
