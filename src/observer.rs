//! Observer trait and implementations
//!
//! An Observer is the consumer side of a sequence: a single `on` method that
//! receives [`Event`]s. Observers are plain values (closures wrapped in
//! [`FnObserver`], boxed trait objects, operator sinks), never a class
//! hierarchy.

use std::convert::Infallible;

use crate::event::Event;

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: The consumer of data in reactive programming
///
/// Sources call `on` in order, never concurrently for the same subscription,
/// and deliver at most one terminal event.
pub trait Observer<Item, Err>: Send {
  /// Receive the next event from the observable.
  fn on(&mut self, event: Event<Item, Err>);

  /// Checks if the observer is closed.
  ///
  /// Synchronous sources (like `from_iter`) poll this to stop emitting early,
  /// e.g. once a downstream `take` has completed.
  fn is_closed(&self) -> bool { false }
}

/// Boxed observer, used where the concrete observer type must be erased
/// (subject registries, boxed observables).
pub type BoxedObserver<Item, Err> = Box<dyn Observer<Item, Err>>;

impl<Item, Err, O> Observer<Item, Err> for Box<O>
where
  O: Observer<Item, Err> + ?Sized,
{
  #[inline]
  fn on(&mut self, event: Event<Item, Err>) { (**self).on(event) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Option observer - None ignores all events, Some delegates to inner
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn on(&mut self, event: Event<Item, Err>) {
    if let Some(inner) = self {
      inner.on(event);
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Observer::is_closed) }
}

// ============================================================================
// FnObserver - Closure adapter
// ============================================================================

/// Observer assembled from closures.
///
/// Stops itself after the first terminal event, so `error` and `complete`
/// are `FnOnce` and run at most once.
pub struct FnObserver<N, E, C> {
  next: N,
  error: Option<E>,
  complete: Option<C>,
  stopped: bool,
}

impl<N, E, C> FnObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    FnObserver { next, error: Some(error), complete: Some(complete), stopped: false }
  }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for FnObserver<N, E, C>
where
  N: FnMut(Item) + Send,
  E: FnOnce(Err) + Send,
  C: FnOnce() + Send,
{
  fn on(&mut self, event: Event<Item, Err>) {
    if self.stopped {
      return;
    }
    match event {
      Event::Next(value) => (self.next)(value),
      Event::Error(err) => {
        self.stopped = true;
        if let Some(error) = self.error.take() {
          error(err);
        }
      }
      Event::Completed => {
        self.stopped = true;
        if let Some(complete) = self.complete.take() {
          complete();
        }
      }
    }
  }

  fn is_closed(&self) -> bool { self.stopped }
}

/// Observer that only handles values, for streams that cannot fail.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item) + Send,
{
  #[inline]
  fn on(&mut self, event: Event<Item, Infallible>) {
    if let Event::Next(value) = event {
      (self.0)(value);
    }
  }
}
