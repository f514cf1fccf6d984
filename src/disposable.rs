//! Disposables: once-only resource release capabilities.
//!
//! [`Disposable`] is the capability, [`Subscription`] the clonable handle every
//! `subscribe` returns. Disposal is idempotent and callable from any thread;
//! only the first call releases anything.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};

use crate::util::lock;

mod binary;
mod composite;
mod serial;
mod single_assignment;

pub use binary::BinaryDisposable;
pub use composite::{CompositeDisposable, DisposeKey};
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

/// A resource that can be released exactly once.
pub trait Disposable: Send + Sync {
  /// Releases the resource. Calling it again is a no-op.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

/// Unit subscription: nothing to release, always disposed.
impl Disposable for () {
  #[inline]
  fn dispose(&self) {}

  #[inline]
  fn is_disposed(&self) -> bool { true }
}

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

// ==================== Subscription ====================

/// Type-erased, clonable handle to a running subscription.
///
/// Clones refer to the same underlying resource, so a clone can be moved to
/// another thread and disposed there.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let subscription = Subscription::from_fn(|| println!("released"));
/// let other = subscription.clone();
/// subscription.dispose();
/// other.dispose(); // no-op
/// assert!(other.is_disposed());
/// ```
#[derive(Clone, Default)]
pub struct Subscription(Option<Arc<dyn Disposable>>);

impl Subscription {
  pub fn new(disposable: impl Disposable + 'static) -> Self { Self(Some(Arc::new(disposable))) }

  /// A subscription that holds nothing.
  #[inline]
  pub fn empty() -> Self { Self(None) }

  /// A subscription that runs `teardown` on its first disposal.
  pub fn from_fn(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self::new(AnonymousDisposable::new(teardown))
  }

  #[inline]
  pub(crate) fn from_arc(inner: Arc<dyn Disposable>) -> Self { Self(Some(inner)) }

  /// Activates "RAII" behavior for this subscription: the returned guard
  /// disposes it when dropped.
  ///
  /// **Attention:** If you don't bind the return value to a variable, the
  /// subscription is disposed immediately.
  pub fn dispose_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard::new(self) }
}

impl Disposable for Subscription {
  #[inline]
  fn dispose(&self) {
    if let Some(inner) = &self.0 {
      inner.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.as_ref().is_none_or(|inner| inner.is_disposed()) }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}

// ==================== Guard ====================

/// An RAII implementation of a "scoped subscription". When this structure is
/// dropped (falls out of scope), the subscription is disposed.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Option<Subscription>);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> Self { SubscriptionGuard(Some(subscription)) }

  /// Gives the subscription back without disposing it.
  pub fn into_inner(mut self) -> Subscription { self.0.take().unwrap_or_default() }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.dispose();
    }
  }
}

// ==================== Leaf disposables ====================

/// A disposable that only records whether it was disposed.
#[derive(Debug, Default)]
pub struct BooleanDisposable(AtomicBool);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// Runs a closure on first disposal.
pub struct AnonymousDisposable {
  teardown: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl AnonymousDisposable {
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self { teardown: Mutex::new(Some(Box::new(teardown))) }
  }
}

impl Disposable for AnonymousDisposable {
  fn dispose(&self) {
    let teardown = lock(&self.teardown).take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }

  fn is_disposed(&self) -> bool { lock(&self.teardown).is_none() }
}
