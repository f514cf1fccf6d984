//! Schedulers: where and when work runs.
//!
//! The pipeline itself is scheduler-agnostic; only operators that hop threads
//! or wait (`observe_on`, `subscribe_on`, `delay`, `take_for`, `interval`,
//! `timer`) take a scheduler, and they take it as an explicit value.
//!
//! | Scheduler | Runs work |
//! |-----------|-----------|
//! | [`CurrentThreadScheduler`] | on the calling thread, after the work running there |
//! | [`ThreadPoolScheduler`] | on a `futures` thread pool (feature `futures-scheduler`) |
//! | [`TokioScheduler`] | on a tokio runtime (feature `tokio-scheduler`) |
//! | [`TestScheduler`] | when virtual time is advanced by the test |

use std::sync::{Arc, Mutex};
pub use std::time::{Duration, Instant};

use crate::{
  disposable::{Disposable, Subscription},
  util::lock,
};

mod current_thread;
pub mod test_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use current_thread::CurrentThreadScheduler;
pub use test_scheduler::TestScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// Boxed unit of work handed to a scheduler.
pub type Work = Box<dyn FnOnce() + Send>;

/// A Scheduler is an object to order work and schedule its execution.
pub trait Scheduler: Send + Sync {
  /// Runs `work` after `delay` (or as soon as possible for `None`).
  ///
  /// Disposing the returned subscription before the work starts cancels it.
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription;

  /// The scheduler's notion of the current time.
  fn now(&self) -> Instant { Instant::now() }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription {
    (**self).schedule(delay, work)
  }

  #[inline]
  fn now(&self) -> Instant { (**self).now() }
}

// ==================== Recursive scheduling ====================

struct RecursiveState {
  step: u64,
  pending: Option<Subscription>,
  disposed: bool,
}

struct Recursive<S, F> {
  scheduler: S,
  action: Mutex<F>,
  state: Mutex<RecursiveState>,
}

/// Schedules `action` after `delay`, and again each time it returns
/// `Some(next_delay)`, until it returns `None` or the returned subscription
/// is disposed.
///
/// Each round is scheduled from inside the previous one, so on the current
/// thread the rounds queue on the trampoline instead of nesting on the stack.
pub fn schedule_recursive<S, F>(scheduler: &S, delay: Option<Duration>, action: F) -> Subscription
where
  S: Scheduler + Clone + 'static,
  F: FnMut() -> Option<Duration> + Send + 'static,
{
  let recursive = Arc::new(Recursive {
    scheduler: scheduler.clone(),
    action: Mutex::new(action),
    state: Mutex::new(RecursiveState { step: 0, pending: None, disposed: false }),
  });
  Recursive::schedule_step(&recursive, 0, delay);
  Subscription::new(recursive)
}

impl<S, F> Recursive<S, F>
where
  S: Scheduler + 'static,
  F: FnMut() -> Option<Duration> + Send + 'static,
{
  fn schedule_step(this: &Arc<Self>, step: u64, delay: Option<Duration>) {
    let round = this.clone();
    let handle = this.scheduler.schedule(
      delay,
      Box::new(move || {
        if lock(&round.state).disposed {
          return;
        }
        let next = (lock(&round.action))();
        if let Some(next) = next {
          Recursive::schedule_step(&round, step + 1, Some(next));
        }
      }),
    );

    let mut state = lock(&this.state);
    if state.disposed {
      drop(state);
      handle.dispose();
    } else if state.step <= step {
      // A later round may already have registered itself if this one ran
      // synchronously; only the newest round owns the pending slot.
      state.step = step;
      state.pending = Some(handle);
    }
  }
}

impl<S, F> Disposable for Recursive<S, F>
where
  S: Send + Sync,
  F: Send,
{
  fn dispose(&self) {
    let pending = {
      let mut state = lock(&self.state);
      if state.disposed {
        return;
      }
      state.disposed = true;
      state.pending.take()
    };
    if let Some(pending) = pending {
      pending.dispose();
    }
  }

  fn is_disposed(&self) -> bool { lock(&self.state).disposed }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  #[rxflow_macro::test]
  fn recursive_runs_until_none() {
    let scheduler = TestScheduler::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();

    let _subscription =
      schedule_recursive(&scheduler, Some(Duration::from_millis(10)), move || {
        let n = c_count.fetch_add(1, Ordering::SeqCst) + 1;
        (n < 3).then_some(Duration::from_millis(10))
      });

    scheduler.advance_by(Duration::from_millis(25));
    assert_eq!(count.load(Ordering::SeqCst), 2);
    scheduler.flush();
    assert_eq!(count.load(Ordering::SeqCst), 3);
  }

  #[rxflow_macro::test]
  fn recursive_stops_when_disposed() {
    let scheduler = TestScheduler::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();

    let subscription = schedule_recursive(&scheduler, None, move || {
      c_count.fetch_add(1, Ordering::SeqCst);
      Some(Duration::from_millis(1))
    });

    scheduler.advance_by(Duration::from_millis(2));
    let seen = count.load(Ordering::SeqCst);
    subscription.dispose();
    scheduler.advance_by(Duration::from_millis(10));

    assert_eq!(seen, 3);
    assert_eq!(count.load(Ordering::SeqCst), 3);
  }

  #[rxflow_macro::test]
  fn recursive_on_current_thread_does_not_nest() {
    let count = Arc::new(AtomicUsize::new(0));
    let c_count = count.clone();

    schedule_recursive(&CurrentThreadScheduler, None, move || {
      let n = c_count.fetch_add(1, Ordering::SeqCst) + 1;
      (n < 10_000).then_some(Duration::ZERO)
    });

    assert_eq!(count.load(Ordering::SeqCst), 10_000);
  }
}
