use futures::{
  executor::ThreadPool,
  future::{abortable, AbortHandle},
};
use tracing::{debug, warn};

use super::{Duration, Scheduler, Work};
use crate::{
  disposable::{Disposable, Subscription},
  error::RxError,
};

struct AbortOnDispose(AbortHandle);

impl Disposable for AbortOnDispose {
  fn dispose(&self) { self.0.abort(); }

  fn is_disposed(&self) -> bool { self.0.is_aborted() }
}

/// Runs work on a `futures` thread pool. Cloning shares the pool.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// A pool with one worker per CPU.
  pub fn new() -> Result<Self, RxError> { Self::builder().create() }

  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }
}

/// Configures a [`ThreadPoolScheduler`].
#[derive(Debug, Default, Clone)]
pub struct ThreadPoolSchedulerBuilder {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolSchedulerBuilder {
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn create(self) -> Result<ThreadPoolScheduler, RxError> {
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    if let Some(prefix) = &self.name_prefix {
      builder.name_prefix(prefix.as_str());
    }
    let pool = builder.create().map_err(|e| {
      warn!(error = %e, "thread pool scheduler could not start");
      RxError::SchedulerUnavailable { reason: e.to_string() }
    })?;
    debug!(pool_size = ?self.pool_size, "thread pool scheduler created");
    Ok(ThreadPoolScheduler { pool })
  }
}

#[cfg(feature = "timer")]
async fn sleep(delay: Duration) {
  futures_time::task::sleep(futures_time::time::Duration::from(delay)).await;
}

#[cfg(not(feature = "timer"))]
async fn sleep(delay: Duration) { std::thread::sleep(delay); }

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, delay: Option<Duration>, work: Work) -> Subscription {
    let (task, handle) = abortable(async move {
      if let Some(delay) = delay.filter(|d| !d.is_zero()) {
        sleep(delay).await;
      }
      work();
    });
    self.pool.spawn_ok(async move {
      // Aborted tasks resolve to `Err(Aborted)`; nothing to report.
      let _ = task.await;
    });
    Subscription::new(AbortOnDispose(handle))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::mpsc::channel;

  use super::*;

  #[rxflow_macro::test]
  fn runs_work_on_pool() {
    let scheduler = ThreadPoolScheduler::builder()
      .pool_size(2)
      .name_prefix("rxflow-test-")
      .create()
      .unwrap();
    let (tx, rx) = channel();

    scheduler.schedule(
      Some(Duration::from_millis(5)),
      Box::new(move || tx.send(std::thread::current().name().map(str::to_owned)).unwrap()),
    );

    let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(name.unwrap_or_default().starts_with("rxflow-test-"));
  }

  #[rxflow_macro::test]
  fn disposed_work_does_not_run() {
    let scheduler = ThreadPoolScheduler::new().unwrap();
    let (tx, rx) = channel::<()>();

    let subscription = scheduler.schedule(
      Some(Duration::from_millis(200)),
      Box::new(move || tx.send(()).unwrap()),
    );
    subscription.dispose();

    assert!(subscription.is_disposed());
    assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
  }
}
