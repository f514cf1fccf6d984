//! Trampoline scheduler for the calling thread.
//!
//! The first `schedule` (or `trampoline`) on a thread installs a queue and
//! runs its work; anything scheduled while that work runs is appended to the
//! queue and executed after it, in FIFO order, by the same outermost frame.
//! This turns recursive scheduling into iteration.

use std::{cell::RefCell, collections::VecDeque, sync::Arc, thread};

use tracing::trace;

use super::{Duration, Instant, Scheduler, Work};
use crate::disposable::{BooleanDisposable, Disposable, Subscription};

struct QueuedWork {
  work: Work,
  due: Option<Instant>,
  cancelled: Arc<BooleanDisposable>,
}

thread_local! {
  static QUEUE: RefCell<Option<VecDeque<QueuedWork>>> = const { RefCell::new(None) };
}

/// Removes the thread's queue when the outermost trampoline frame exits,
/// even by unwinding.
struct QueueGuard;

impl Drop for QueueGuard {
  fn drop(&mut self) { QUEUE.with(|q| q.borrow_mut().take()); }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {
  /// `true` when no trampoline is active on this thread, i.e. the caller is
  /// the outermost frame and must install one before running work.
  pub fn is_schedule_required() -> bool { QUEUE.with(|q| q.borrow().is_none()) }

  /// Runs `f` as the owner of this thread's work queue, then drains every
  /// item queued during `f`. When a trampoline is already active, `f` just
  /// runs.
  pub fn trampoline<R>(f: impl FnOnce() -> R) -> R {
    if !Self::is_schedule_required() {
      return f();
    }

    QUEUE.with(|q| *q.borrow_mut() = Some(VecDeque::new()));
    let _guard = QueueGuard;
    let result = f();
    Self::drain();
    result
  }

  fn drain() {
    let mut ran = 0usize;
    while let Some(item) = QUEUE.with(|q| q.borrow_mut().as_mut().and_then(VecDeque::pop_front)) {
      if item.cancelled.is_disposed() {
        continue;
      }
      if let Some(due) = item.due {
        let now = Instant::now();
        if due > now {
          thread::sleep(due - now);
        }
      }
      // A cancel may have landed while sleeping.
      if item.cancelled.is_disposed() {
        continue;
      }
      (item.work)();
      ran += 1;
    }
    trace!(ran, "trampoline drained");
  }

  fn enqueue(item: QueuedWork) -> Result<(), QueuedWork> {
    QUEUE.with(|q| match q.borrow_mut().as_mut() {
      Some(queue) => {
        queue.push_back(item);
        Ok(())
      }
      None => Err(item),
    })
  }
}

impl Scheduler for CurrentThreadScheduler {
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription {
    let cancelled = Arc::new(BooleanDisposable::new());
    let due = delay.filter(|d| !d.is_zero()).map(|d| Instant::now() + d);
    let item = QueuedWork { work, due, cancelled: cancelled.clone() };

    match Self::enqueue(item) {
      Ok(()) => Subscription::from_arc(cancelled),
      Err(item) => {
        // Idle thread: become the trampoline and run right away.
        Self::trampoline(move || {
          if let Some(due) = item.due {
            let now = Instant::now();
            if due > now {
              thread::sleep(due - now);
            }
          }
          (item.work)();
        });
        Subscription::empty()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;

  fn push(log: &Arc<Mutex<Vec<&'static str>>>, entry: &'static str) -> Work {
    let log = log.clone();
    Box::new(move || log.lock().unwrap().push(entry))
  }

  #[rxflow_macro::test]
  fn idle_schedule_runs_immediately() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let subscription = CurrentThreadScheduler.schedule(None, push(&log, "run"));

    assert_eq!(*log.lock().unwrap(), vec!["run"]);
    assert!(subscription.is_disposed());
    assert!(CurrentThreadScheduler::is_schedule_required());
  }

  #[rxflow_macro::test]
  fn nested_schedule_runs_after_current_work() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();

    CurrentThreadScheduler::trampoline(|| {
      CurrentThreadScheduler.schedule(None, push(&c_log, "queued"));
      c_log.lock().unwrap().push("outer");
    });

    assert_eq!(*log.lock().unwrap(), vec!["outer", "queued"]);
  }

  #[rxflow_macro::test]
  fn cancelled_queued_work_is_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let c_log = log.clone();

    CurrentThreadScheduler::trampoline(|| {
      let queued = CurrentThreadScheduler.schedule(None, push(&c_log, "cancelled"));
      CurrentThreadScheduler.schedule(None, push(&c_log, "kept"));
      queued.dispose();
    });

    assert_eq!(*log.lock().unwrap(), vec!["kept"]);
  }

  #[rxflow_macro::test]
  fn queue_is_removed_after_panic() {
    let result = std::panic::catch_unwind(|| {
      CurrentThreadScheduler::trampoline(|| panic!("boom"));
    });
    assert!(result.is_err());
    assert!(CurrentThreadScheduler::is_schedule_required());
  }
}
