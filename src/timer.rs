use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};

/// Wall clock timer. Logs when it starts and when it is ended.
pub struct Timer {
    name: String,
    started_at: DateTime<Local>,
    start: Instant,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Timer {
        let timer = Timer {
            name: name.into(),
            started_at: Local::now(),
            start: Instant::now(),
        };
        log::debug!("{} Started {}", timer.started_at, timer.name);
        timer
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since start, without stopping the timer.
    pub fn seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn end(self) -> Duration {
        let took = self.elapsed();
        log::info!(
            "{} Finished {}, took: {}",
            Local::now(),
            self.name,
            MinSec(took)
        );
        took
    }
}

/// Formats a duration as `minutes:seconds min:sec`.
pub struct MinSec(pub Duration);

impl fmt::Display for MinSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs_f64();
        let minutes = (secs / 60.0).floor();
        write!(f, "{}:{:.3} min:sec", minutes, secs - minutes * 60.0)
    }
}

/// Usage:
/// ```
/// # use ucr_bench::time_it;
/// time_it!("some timer name",
///   let x = 10;
///   println!("{}", x);
/// );
/// ```
///
#[macro_export]
macro_rules! time_it {
    ($context:expr, $($tt:tt)+) => {
        let timer = $crate::timer::Timer::start($context);
        $(
            $tt
        )+
        timer.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_it_can_format_minutes_and_seconds() {
        assert_eq!("0:1.500 min:sec", MinSec(Duration::from_millis(1500)).to_string());
        assert_eq!("2:5.000 min:sec", MinSec(Duration::from_secs(125)).to_string());
    }

    #[test]
    fn test_it_can_measure_elapsed_time() {
        let t = Timer::start("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.seconds() >= 0.005);
        assert!(t.end() >= Duration::from_millis(5));
    }
}
