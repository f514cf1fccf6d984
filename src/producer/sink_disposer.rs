//! The per-subscription dispose coordinator.
//!
//! Two things can each end a subscription: `Producer::run` finishing and
//! handing over `(sink, subscription)`, and the caller disposing the handle
//! returned by `subscribe`. The second can happen before the first, because
//! `run` may emit synchronously and a downstream operator may dispose while
//! the upstream `subscribe` call is still on the stack. `SinkDisposer`
//! resolves that race with two bits updated by a single `fetch_or`: whichever
//! side observes the other's bit performs the disposal, so it happens exactly
//! once and never while a lock is held.

use std::sync::{
  atomic::{AtomicU8, Ordering},
  Arc, Mutex,
};

use tracing::trace;

use crate::{
  disposable::{Disposable, Subscription},
  util::lock,
};

const SINK_AND_SUBSCRIPTION_SET: u8 = 0b01;
const DISPOSED: u8 = 0b10;

#[derive(Default)]
pub struct SinkDisposer {
  state: AtomicU8,
  slot: Mutex<Option<(Subscription, Subscription)>>,
}

impl SinkDisposer {
  pub fn new() -> Self { Self::default() }

  /// Hands over the sink and the upstream subscription. Must be called once.
  ///
  /// If the coordinator was disposed in the meantime, both are disposed
  /// before this returns.
  pub fn set_sink_and_subscription(&self, sink: Subscription, subscription: Subscription) {
    *lock(&self.slot) = Some((sink, subscription));

    let previous = self
      .state
      .fetch_or(SINK_AND_SUBSCRIPTION_SET, Ordering::AcqRel);
    debug_assert!(
      previous & SINK_AND_SUBSCRIPTION_SET == 0,
      "sink and subscription already set"
    );

    if previous & DISPOSED != 0 {
      trace!("disposed before the subscription finished building; releasing now");
      self.release();
    }
  }

  fn release(&self) {
    let pair = lock(&self.slot).take();
    if let Some((sink, subscription)) = pair {
      sink.dispose();
      subscription.dispose();
    }
  }
}

impl Disposable for SinkDisposer {
  fn dispose(&self) {
    let previous = self.state.fetch_or(DISPOSED, Ordering::AcqRel);
    if previous & DISPOSED != 0 {
      return;
    }
    if previous & SINK_AND_SUBSCRIPTION_SET != 0 {
      self.release();
    }
  }

  fn is_disposed(&self) -> bool { self.state.load(Ordering::Acquire) & DISPOSED != 0 }
}

/// The cancel token a sink holds: disposing it disposes the whole
/// subscription edge through its coordinator.
///
/// The coordinator never holds the sink's observer, only the sink's disposed
/// flag, so this strong reference does not form a sink/coordinator cycle.
#[derive(Clone)]
pub struct SinkCancel(Arc<SinkDisposer>);

impl SinkCancel {
  pub(crate) fn new(disposer: Arc<SinkDisposer>) -> Self { SinkCancel(disposer) }

  /// A token not attached to any coordinator, for sinks driven by hand.
  pub fn detached() -> Self { SinkCancel(Arc::new(SinkDisposer::new())) }

  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }
}
