use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use super::SinkCancel;
use crate::{
  disposable::{Disposable, Subscription},
  event::Event,
  observer::Observer,
};

struct SinkFlag(AtomicBool);

impl Disposable for SinkFlag {
  #[inline]
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Per-subscription operator state: the downstream observer, the cancel
/// token of this subscription edge, and a disposed flag.
///
/// Operator sinks wrap a `Sink` and follow one contract: on `Next` transform
/// and `forward`; on a terminal event (or a failed transform) `forward` it and
/// then `dispose`. Once disposed, `forward` drops everything, so a straggling
/// upstream event can never reach a torn-down downstream.
pub struct Sink<O> {
  observer: O,
  cancel: SinkCancel,
  flag: Arc<SinkFlag>,
}

impl<O> Sink<O> {
  pub fn new(observer: O, cancel: SinkCancel) -> Self {
    Sink { observer, cancel, flag: Arc::new(SinkFlag(AtomicBool::new(false))) }
  }

  /// Delivers `event` downstream unless this sink is disposed.
  #[inline]
  pub fn forward<Item, Err>(&mut self, event: Event<Item, Err>)
  where
    O: Observer<Item, Err>,
  {
    if !self.is_disposed() {
      self.observer.on(event);
    }
  }

  /// Marks the sink disposed and cancels its subscription edge.
  pub fn dispose(&self) {
    if !self.flag.0.swap(true, Ordering::AcqRel) {
      self.cancel.dispose();
    }
  }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.flag.is_disposed() }

  /// `true` once nothing more will be accepted downstream: either this sink
  /// was disposed or the observer itself reports closed.
  pub fn is_closed<Item, Err>(&self) -> bool
  where
    O: Observer<Item, Err>,
  {
    self.is_disposed() || self.observer.is_closed()
  }

  /// The handle the coordinator disposes: it only flips the disposed flag.
  pub fn handle(&self) -> Subscription { Subscription::from_arc(self.flag.clone()) }

  pub fn cancel(&self) -> &SinkCancel { &self.cancel }
}
