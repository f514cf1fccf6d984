use std::sync::{
  atomic::{AtomicU8, Ordering},
  Mutex,
};

use super::{Disposable, Subscription};
use crate::util::lock;

const SET: u8 = 0b01;
const DISPOSED: u8 = 0b10;

/// A slot for a subscription that is only known after subscribing.
///
/// Disposing before `set` makes `set` dispose its argument immediately, so a
/// secondary source that terminates while its own `subscribe` call is still
/// running is released once the call returns.
#[derive(Default)]
pub struct SingleAssignmentDisposable {
  state: AtomicU8,
  current: Mutex<Option<Subscription>>,
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  /// Stores `subscription`. Must be called at most once.
  pub fn set(&self, subscription: Subscription) {
    *lock(&self.current) = Some(subscription);
    let previous = self.state.fetch_or(SET, Ordering::AcqRel);
    debug_assert!(previous & SET == 0, "SingleAssignmentDisposable set twice");
    if previous & DISPOSED != 0 {
      let current = lock(&self.current).take();
      if let Some(current) = current {
        current.dispose();
      }
    }
  }

  pub fn is_set(&self) -> bool { self.state.load(Ordering::Acquire) & SET != 0 }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    let previous = self.state.fetch_or(DISPOSED, Ordering::AcqRel);
    if previous & DISPOSED != 0 {
      return;
    }
    if previous & SET != 0 {
      let current = lock(&self.current).take();
      if let Some(current) = current {
        current.dispose();
      }
    }
  }

  fn is_disposed(&self) -> bool { self.state.load(Ordering::Acquire) & DISPOSED != 0 }
}
