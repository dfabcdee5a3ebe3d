use std::time::Duration;

use chrono::{DateTime, Utc};

/// Wall-clock budget check for a run.
///
/// A run breaches its budget when strictly more than `budget` has elapsed
/// since it started. A run that has not started never breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineMonitor {
  budget: Duration,
}

impl DeadlineMonitor {
  pub fn new(budget: Duration) -> Self {
    Self { budget }
  }

  pub fn budget(&self) -> Duration {
    self.budget
  }

  /// Time elapsed between `started_at` and `now`. Zero when unset or when
  /// `now` precedes the start.
  pub fn elapsed(&self, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    started_at
      .and_then(|start| (now - start).to_std().ok())
      .unwrap_or(Duration::ZERO)
  }

  pub fn is_breached_at(&self, started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    started_at.is_some() && self.elapsed(started_at, now) > self.budget
  }

  pub fn is_breached(&self, started_at: Option<DateTime<Utc>>) -> bool {
    self.is_breached_at(started_at, Utc::now())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeDelta;

  #[test]
  fn test_unstarted_run_never_breaches() {
    let monitor = DeadlineMonitor::new(Duration::ZERO);
    assert!(!monitor.is_breached(None));
  }

  #[test]
  fn test_breach_is_strictly_greater_than_budget() {
    let monitor = DeadlineMonitor::new(Duration::from_secs(120));
    let start = Utc::now();

    assert!(!monitor.is_breached_at(Some(start), start + TimeDelta::seconds(120)));
    assert!(monitor.is_breached_at(Some(start), start + TimeDelta::milliseconds(120_001)));
  }

  #[test]
  fn test_clock_skew_counts_as_zero() {
    let monitor = DeadlineMonitor::new(Duration::from_secs(1));
    let start = Utc::now();
    let earlier = start - TimeDelta::seconds(30);

    assert_eq!(monitor.elapsed(Some(start), earlier), Duration::ZERO);
    assert!(!monitor.is_breached_at(Some(start), earlier));
  }
}
