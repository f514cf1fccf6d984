use std::sync::Mutex;

use super::{Disposable, Subscription};
use crate::util::lock;

/// Holds two subscriptions and disposes both, once.
///
/// Operators with a primary and a secondary source (`take_until`,
/// `with_latest_from`, `combine_latest`) return one of these as their
/// upstream subscription.
pub struct BinaryDisposable {
  pair: Mutex<Option<(Subscription, Subscription)>>,
}

impl BinaryDisposable {
  pub fn new(first: Subscription, second: Subscription) -> Self {
    BinaryDisposable { pair: Mutex::new(Some((first, second))) }
  }
}

impl Disposable for BinaryDisposable {
  fn dispose(&self) {
    let pair = lock(&self.pair).take();
    if let Some((first, second)) = pair {
      first.dispose();
      second.dispose();
    }
  }

  fn is_disposed(&self) -> bool { lock(&self.pair).is_none() }
}

impl From<BinaryDisposable> for Subscription {
  fn from(value: BinaryDisposable) -> Self { Subscription::new(value) }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  };

  use super::*;

  #[rxflow_macro::test]
  fn disposes_both_exactly_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let counted = |count: &Arc<AtomicUsize>| {
      let count = count.clone();
      Subscription::from_fn(move || {
        count.fetch_add(1, Ordering::SeqCst);
      })
    };

    let binary = BinaryDisposable::new(counted(&count), counted(&count));
    assert!(!binary.is_disposed());
    binary.dispose();
    binary.dispose();

    assert!(binary.is_disposed());
    assert_eq!(count.load(Ordering::SeqCst), 2);
  }
}
