use tokio::{runtime::Handle, task::AbortHandle};
use tracing::warn;

use super::{Duration, Scheduler, Work};
use crate::{
  disposable::{Disposable, Subscription},
  error::RxError,
};

struct AbortTask(AbortHandle);

impl Disposable for AbortTask {
  fn dispose(&self) { self.0.abort(); }

  fn is_disposed(&self) -> bool { self.0.is_finished() }
}

/// Runs work as tasks on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  pub fn new(handle: Handle) -> Self { TokioScheduler { handle } }

  /// Uses the runtime the caller is running in.
  pub fn try_current() -> Result<Self, RxError> {
    Handle::try_current()
      .map(Self::new)
      .map_err(|e| {
        warn!(error = %e, "no tokio runtime to schedule on");
        RxError::SchedulerUnavailable { reason: e.to_string() }
      })
  }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription {
    let join = self.handle.spawn(async move {
      if let Some(delay) = delay.filter(|d| !d.is_zero()) {
        tokio::time::sleep(delay).await;
      }
      work();
    });
    Subscription::new(AbortTask(join.abort_handle()))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use super::*;

  #[rxflow_macro::test]
  async fn runs_after_delay() {
    let scheduler = TokioScheduler::try_current().unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let c_ran = ran.clone();

    scheduler.schedule(
      Some(Duration::from_millis(10)),
      Box::new(move || c_ran.store(true, Ordering::SeqCst)),
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(ran.load(Ordering::SeqCst));
  }

  #[rxflow_macro::test]
  async fn aborted_task_does_not_run() {
    let scheduler = TokioScheduler::try_current().unwrap();
    let ran = Arc::new(AtomicBool::new(false));
    let c_ran = ran.clone();

    let subscription = scheduler.schedule(
      Some(Duration::from_millis(50)),
      Box::new(move || c_ran.store(true, Ordering::SeqCst)),
    );
    subscription.dispose();

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!ran.load(Ordering::SeqCst));
  }

  #[rxflow_macro::test]
  fn no_runtime_is_an_error() {
    let err = TokioScheduler::try_current().unwrap_err();
    assert_eq!(err.as_label(), "scheduler_unavailable");
  }
}
