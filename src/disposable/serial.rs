use std::sync::Mutex;

use super::{Disposable, Subscription};
use crate::util::lock;

struct SerialState {
  current: Option<Subscription>,
  disposed: bool,
}

/// Holds one replaceable subscription; replacing disposes the previous one.
///
/// After disposal, every newly set subscription is disposed right away.
/// `retry` keeps the subscription of its current attempt here.
pub struct SerialDisposable(Mutex<SerialState>);

impl Default for SerialDisposable {
  fn default() -> Self { Self(Mutex::new(SerialState { current: None, disposed: false })) }
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn set(&self, subscription: Subscription) {
    let previous = {
      let mut state = lock(&self.0);
      if state.disposed {
        Some(subscription)
      } else {
        state.current.replace(subscription)
      }
    };
    if let Some(previous) = previous {
      previous.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let current = {
      let mut state = lock(&self.0);
      if state.disposed {
        return;
      }
      state.disposed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.dispose();
    }
  }

  fn is_disposed(&self) -> bool { lock(&self.0).disposed }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::disposable::BooleanDisposable;

  #[rxflow_macro::test]
  fn replacing_disposes_previous() {
    let first = Arc::new(BooleanDisposable::new());
    let second = Arc::new(BooleanDisposable::new());
    let serial = SerialDisposable::new();

    serial.set(Subscription::from_arc(first.clone()));
    serial.set(Subscription::from_arc(second.clone()));
    assert!(first.is_disposed());
    assert!(!second.is_disposed());

    serial.dispose();
    assert!(second.is_disposed());
  }

  #[rxflow_macro::test]
  fn set_after_dispose() {
    let late = Arc::new(BooleanDisposable::new());
    let serial = SerialDisposable::new();
    serial.dispose();
    serial.set(Subscription::from_arc(late.clone()));
    assert!(late.is_disposed());
  }
}
