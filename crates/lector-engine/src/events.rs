//! Progress notifiers for observing runs.
//!
//! Every timeline entry the supervisor appends is also handed to a
//! [`ProgressNotifier`] together with a snapshot of the run at that moment.
//! Notifiers are called synchronously from the orchestration loop and must
//! return promptly. Delivery failures are the notifier's concern and never
//! reach the run.

use std::collections::VecDeque;

use lector_state::{EventLevel, ProgressSnapshot, RunEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Trait for receiving progress updates.
pub trait ProgressNotifier: Send + Sync {
  /// Called once per appended event, in timeline order.
  fn notify(&self, event: &RunEvent, snapshot: &ProgressSnapshot);
}

/// A no-op notifier that discards all updates.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ProgressNotifier for NoopNotifier {
  fn notify(&self, _event: &RunEvent, _snapshot: &ProgressSnapshot) {}
}

/// One event together with the run snapshot taken when it was appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
  pub event: RunEvent,
  pub snapshot: ProgressSnapshot,
}

/// A notifier that sends updates to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls the loop; event volume is a
/// handful per step.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
    Self { sender }
  }

  /// Create a notifier and the receiving half of its channel.
  pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self::new(sender), receiver)
  }
}

impl ProgressNotifier for ChannelNotifier {
  fn notify(&self, event: &RunEvent, snapshot: &ProgressSnapshot) {
    // receiver may have been dropped
    let _ = self.sender.send(ProgressUpdate {
      event: event.clone(),
      snapshot: snapshot.clone(),
    });
  }
}

/// A notifier that writes each update to the tracing subscriber.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl ProgressNotifier for TracingNotifier {
  fn notify(&self, event: &RunEvent, snapshot: &ProgressSnapshot) {
    match event.level {
      EventLevel::Info => info!(
        run_id = %snapshot.run_id,
        step = %event.step,
        status = ?event.status,
        retry_count = snapshot.retry_count,
        "{}", event.message
      ),
      EventLevel::Warning => warn!(
        run_id = %snapshot.run_id,
        step = %event.step,
        status = ?event.status,
        "{}", event.message
      ),
      EventLevel::Error => error!(
        run_id = %snapshot.run_id,
        step = %event.step,
        status = ?event.status,
        "{}", event.message
      ),
    }
  }
}

impl<F> ProgressNotifier for F
where
  F: Fn(&RunEvent, &ProgressSnapshot) + Send + Sync,
{
  fn notify(&self, event: &RunEvent, snapshot: &ProgressSnapshot) {
    self(event, snapshot)
  }
}

/// Bounded, consumer-side view of the most recent events.
///
/// Keeps at most `capacity` entries; older ones fall off the front.
#[derive(Debug, Clone)]
pub struct EventWindow {
  capacity: usize,
  events: VecDeque<RunEvent>,
}

impl EventWindow {
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      events: VecDeque::with_capacity(capacity),
    }
  }

  pub fn push(&mut self, event: RunEvent) {
    if self.capacity == 0 {
      return;
    }
    if self.events.len() == self.capacity {
      self.events.pop_front();
    }
    self.events.push_back(event);
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  /// Events oldest first.
  pub fn iter(&self) -> impl Iterator<Item = &RunEvent> {
    self.events.iter()
  }

  pub fn to_vec(&self) -> Vec<RunEvent> {
    self.events.iter().cloned().collect()
  }
}

impl Extend<RunEvent> for EventWindow {
  fn extend<I: IntoIterator<Item = RunEvent>>(&mut self, iter: I) {
    for event in iter {
      self.push(event);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use lector_state::{EventStatus, Status};

  fn snapshot() -> ProgressSnapshot {
    ProgressSnapshot {
      run_id: "run-1".to_string(),
      current_step: None,
      status: Status::InProgress,
      run_status: None,
      step_status: Default::default(),
      retry_count: 0,
      warnings: Vec::new(),
      errors: Vec::new(),
    }
  }

  #[tokio::test]
  async fn test_channel_notifier_forwards_updates() {
    let (notifier, mut rx) = ChannelNotifier::channel();
    let event = RunEvent::info("workflow", EventStatus::Started, "Workflow started.");

    notifier.notify(&event, &snapshot());

    let update = rx.recv().await.unwrap();
    assert_eq!(update.event, event);
    assert_eq!(update.snapshot.run_id, "run-1");
  }

  #[test]
  fn test_channel_notifier_ignores_dropped_receiver() {
    let (notifier, rx) = ChannelNotifier::channel();
    drop(rx);
    notifier.notify(
      &RunEvent::info("workflow", EventStatus::Started, "Workflow started."),
      &snapshot(),
    );
  }

  #[test]
  fn test_closure_notifier() {
    let seen = Mutex::new(Vec::new());
    let notifier = |event: &RunEvent, _: &ProgressSnapshot| {
      seen.lock().unwrap().push(event.message.clone());
    };

    notifier.notify(
      &RunEvent::info("intake", EventStatus::InProgress, "intake started."),
      &snapshot(),
    );

    assert_eq!(*seen.lock().unwrap(), vec!["intake started.".to_string()]);
  }

  #[test]
  fn test_event_window_keeps_most_recent() {
    let mut window = EventWindow::new(3);
    window.extend((0..5).map(|i| {
      RunEvent::info("workflow", EventStatus::InProgress, format!("e{i}"))
    }));

    let messages: Vec<_> = window.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["e2", "e3", "e4"]);
    assert_eq!(window.len(), 3);
  }

  #[test]
  fn test_zero_capacity_window_stays_empty() {
    let mut window = EventWindow::new(0);
    window.push(RunEvent::info("workflow", EventStatus::Started, "x"));
    assert!(window.is_empty());
  }
}
