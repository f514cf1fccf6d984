//! Virtual-time scheduler for deterministic tests of time-based operators.
//!
//! Time only moves when the test calls [`TestScheduler::advance_by`],
//! [`TestScheduler::advance_to`] or [`TestScheduler::flush`]; due work then
//! runs synchronously on the calling thread, earliest first and FIFO among
//! equal due times.
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let values = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! let c_values = values.clone();
//!
//! rxflow::observable::of(42)
//!   .delay(Duration::from_millis(100), scheduler.clone())
//!   .subscribe(move |v| c_values.lock().unwrap().push(v));
//!
//! assert!(values.lock().unwrap().is_empty());
//! scheduler.advance_by(Duration::from_millis(100));
//! assert_eq!(*values.lock().unwrap(), vec![42]);
//! ```

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  sync::{Arc, Mutex},
};

use super::{Duration, Instant, Scheduler, Work};
use crate::{
  disposable::{BooleanDisposable, Disposable, Subscription},
  util::lock,
};

struct ScheduledTask {
  due: Duration,
  seq: u64,
  work: Work,
  cancelled: Arc<BooleanDisposable>,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier due first, then FIFO by sequence number
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct State {
  now: Duration,
  next_seq: u64,
  queue: BinaryHeap<ScheduledTask>,
}

/// A virtual time scheduler. Clones share the same clock and queue.
#[derive(Clone)]
pub struct TestScheduler {
  start: Instant,
  state: Arc<Mutex<State>>,
}

impl Default for TestScheduler {
  fn default() -> Self { Self::new() }
}

impl TestScheduler {
  pub fn new() -> Self { TestScheduler { start: Instant::now(), state: Arc::default() } }

  /// Virtual time elapsed since creation.
  pub fn elapsed(&self) -> Duration { lock(&self.state).now }

  /// Number of scheduled, not yet cancelled tasks.
  pub fn pending(&self) -> usize {
    lock(&self.state)
      .queue
      .iter()
      .filter(|t| !t.cancelled.is_disposed())
      .count()
  }

  /// Moves the clock forward by `delta`, running everything that becomes due.
  pub fn advance_by(&self, delta: Duration) {
    let target = self.elapsed() + delta;
    self.advance_to(target);
  }

  /// Moves the clock to `target` (never backwards), running everything due
  /// at or before it, including work scheduled by that work.
  pub fn advance_to(&self, target: Duration) {
    while let Some(task) = self.pop_due(Some(target)) {
      run(task);
    }
    let mut state = lock(&self.state);
    if state.now < target {
      state.now = target;
    }
  }

  /// Runs every queued task, advancing the clock as far as needed.
  pub fn flush(&self) {
    while let Some(task) = self.pop_due(None) {
      run(task);
    }
  }

  fn pop_due(&self, until: Option<Duration>) -> Option<ScheduledTask> {
    let mut state = lock(&self.state);
    let due = state.queue.peek()?.due;
    if until.is_some_and(|until| due > until) {
      return None;
    }
    let task = state.queue.pop()?;
    if state.now < task.due {
      state.now = task.due;
    }
    Some(task)
  }
}

fn run(task: ScheduledTask) {
  if !task.cancelled.is_disposed() {
    (task.work)();
    task.cancelled.dispose();
  }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription {
    let cancelled = Arc::new(BooleanDisposable::new());
    let mut state = lock(&self.state);
    let due = state.now + delay.unwrap_or_default();
    let seq = state.next_seq;
    state.next_seq += 1;
    state
      .queue
      .push(ScheduledTask { due, seq, work, cancelled: cancelled.clone() });
    Subscription::from_arc(cancelled)
  }

  fn now(&self) -> Instant { self.start + self.elapsed() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> Work {
    let log = log.clone();
    Box::new(move || log.lock().unwrap().push(value))
  }

  #[rxflow_macro::test]
  fn runs_in_due_order_then_fifo() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    scheduler.schedule(Some(Duration::from_millis(20)), record(&log, 3));
    scheduler.schedule(Some(Duration::from_millis(10)), record(&log, 1));
    scheduler.schedule(Some(Duration::from_millis(10)), record(&log, 2));

    scheduler.advance_by(Duration::from_millis(15));
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    assert_eq!(scheduler.elapsed(), Duration::from_millis(15));

    scheduler.advance_by(Duration::from_millis(5));
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
  }

  #[rxflow_macro::test]
  fn cancelled_task_is_skipped() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let handle = scheduler.schedule(Some(Duration::from_millis(5)), record(&log, 1));
    assert_eq!(scheduler.pending(), 1);
    handle.dispose();
    assert_eq!(scheduler.pending(), 0);

    scheduler.flush();
    assert!(log.lock().unwrap().is_empty());
  }

  #[rxflow_macro::test]
  fn flush_advances_clock_to_last_task() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    scheduler.schedule(Some(Duration::from_secs(3)), record(&log, 1));

    let before = scheduler.now();
    scheduler.flush();

    assert_eq!(scheduler.elapsed(), Duration::from_secs(3));
    assert_eq!(scheduler.now() - before, Duration::from_secs(3));
  }

  #[rxflow_macro::test]
  fn work_can_schedule_more_work() {
    let scheduler = TestScheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (c_scheduler, c_log) = (scheduler.clone(), log.clone());

    scheduler.schedule(
      Some(Duration::from_millis(1)),
      Box::new(move || {
        c_log.lock().unwrap().push(1);
        c_scheduler.schedule(Some(Duration::from_millis(1)), record(&c_log, 2));
      }),
    );

    scheduler.advance_by(Duration::from_millis(2));
    assert_eq!(*log.lock().unwrap(), vec![1, 2]);
  }
}
