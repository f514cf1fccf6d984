//! Observable trait and creation functions
//!
//! An [`Observable`] is a re-subscribable *description* of a sequence.
//! Composing operators only builds nested structs; nothing runs until
//! `subscribe` is called on the outermost one, which subscribes each wrapped
//! source in turn. Subscribing through `&self` means a description can be
//! subscribed any number of times, from any thread.
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! let values = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! let c_values = values.clone();
//!
//! observable::from_iter(1..=5)
//!   .filter(|v| v % 2 == 1)
//!   .map(|v| v * 10)
//!   .subscribe(move |v| c_values.lock().unwrap().push(v));
//!
//! assert_eq!(*values.lock().unwrap(), vec![10, 30, 50]);
//! ```

use std::time::Duration;

use crate::{
  disposable::Subscription,
  event::Event,
  observer::{FnMutObserver, FnObserver, Observer},
  ops::{
    box_it::BoxedObservable,
    catch_error::CatchError,
    combine_latest::CombineLatest,
    delay::Delay,
    element_at::ElementAt,
    filter::Filter,
    map::{Map, TryMap},
    observe_on::ObserveOn,
    retry::Retry,
    share::{Share, SubjectLifetimeScope},
    start_with::StartWith,
    subscribe_on::SubscribeOn,
    take::Take,
    take_for::TakeFor,
    take_until::TakeUntil,
    take_while::{TakeBehavior, TakeWhile},
    tap::{OnComplete, Tap},
    with_latest_from::WithLatestFrom,
  },
  scheduler::Scheduler,
  RxError,
};

mod create;
mod defer;
mod from_iter;
mod interval;
mod of;
mod trivial;

pub use create::{create, Create, Emitter};
pub use defer::{defer, Defer};
pub use from_iter::{from_iter, FromIter};
pub use interval::{interval, timer, Interval, Timer};
pub use of::{of, Of};
pub use trivial::{empty, never, throw_err, Empty, Never, ThrowErr};

/// A re-subscribable description of a push-based sequence.
pub trait Observable: Send + Sync + 'static {
  type Item: Send + 'static;
  type Err: Send + 'static;

  /// Subscribes `observer` and returns the handle that cancels it.
  ///
  /// Disposing the handle never delivers a terminal event to `observer`.
  fn actual_subscribe<O>(&self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static;
}

/// Operator and subscribe methods available on every [`Observable`].
pub trait ObservableExt: Observable + Sized {
  // ==================== Subscribe ====================

  /// Subscribes with a value callback. Only available when the stream
  /// cannot fail.
  fn subscribe<F>(&self, next: F) -> Subscription
  where
    F: FnMut(Self::Item) + Send + 'static,
    FnMutObserver<F>: Observer<Self::Item, Self::Err>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  fn subscribe_err<N, E>(&self, next: N, error: E) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, error, || {}))
  }

  fn subscribe_all<N, E, C>(&self, next: N, error: E, complete: C) -> Subscription
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnOnce(Self::Err) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.actual_subscribe(FnObserver::new(next, error, complete))
  }

  // ==================== Transform ====================

  fn map<F, U>(self, f: F) -> Map<Self, F>
  where
    F: Fn(Self::Item) -> U + Send + Sync + 'static,
    U: Send + 'static,
  {
    Map::new(self, f)
  }

  /// Like `map`, but an `Err` from `f` terminates the stream with that error.
  fn try_map<F, U>(self, f: F) -> TryMap<Self, F>
  where
    F: Fn(Self::Item) -> Result<U, Self::Err> + Send + Sync + 'static,
    U: Send + 'static,
  {
    TryMap::new(self, f)
  }

  fn filter<F>(self, predicate: F) -> Filter<Self, F>
  where
    F: Fn(&Self::Item) -> bool + Send + Sync + 'static,
  {
    Filter::new(self, predicate)
  }

  // ==================== Take ====================

  /// Emits the first `count` values, then completes. `take(0)` completes
  /// without subscribing to the source.
  fn take(self, count: usize) -> Take<Self> { Take::new(self, count) }

  /// Emits while `predicate` holds, then completes.
  fn take_while<F>(self, predicate: F, behavior: TakeBehavior) -> TakeWhile<Self, F>
  where
    F: Fn(&Self::Item) -> bool + Send + Sync + 'static,
  {
    TakeWhile::new(self, predicate, false, behavior)
  }

  /// Emits until `predicate` first holds, then completes.
  fn take_until_predicate<F>(self, predicate: F, behavior: TakeBehavior) -> TakeWhile<Self, F>
  where
    F: Fn(&Self::Item) -> bool + Send + Sync + 'static,
  {
    TakeWhile::new(self, predicate, true, behavior)
  }

  /// Emits until `notifier` emits its first value.
  fn take_until<N>(self, notifier: N) -> TakeUntil<Self, N>
  where
    N: Observable<Err = Self::Err>,
  {
    TakeUntil::new(self, notifier)
  }

  /// Mirrors the source for `duration`, then completes.
  fn take_for<SD>(self, duration: Duration, scheduler: SD) -> TakeFor<Self, SD>
  where
    SD: Scheduler + 'static,
  {
    TakeFor::new(self, duration, scheduler)
  }

  /// Emits only the element at `index`, then completes.
  ///
  /// When the source completes first, `throw_on_empty` turns that into
  /// [`RxError::ArgumentOutOfRange`].
  fn element_at(self, index: usize, throw_on_empty: bool) -> ElementAt<Self>
  where
    Self::Err: From<RxError>,
  {
    ElementAt::new(self, index, throw_on_empty)
  }

  // ==================== Combine ====================

  /// Emits `values` before anything from the source.
  fn start_with(self, values: Vec<Self::Item>) -> StartWith<Self>
  where
    Self::Item: Clone + Sync,
  {
    StartWith::new(self, values)
  }

  /// Combines each source value with the latest value of `other`. Source
  /// values arriving before `other` emitted are dropped.
  fn with_latest_from<B, F, U>(self, other: B, combiner: F) -> WithLatestFrom<Self, B, F>
  where
    B: Observable<Err = Self::Err>,
    B::Item: Clone,
    F: Fn(Self::Item, B::Item) -> U + Send + Sync + 'static,
    U: Send + 'static,
  {
    WithLatestFrom::new(self, other, combiner)
  }

  /// Emits `combiner(a, b)` of the latest values each time either side
  /// emits, once both have emitted.
  fn combine_latest<B, F, U>(self, other: B, combiner: F) -> CombineLatest<Self, B, F>
  where
    B: Observable<Err = Self::Err>,
    Self::Item: Clone,
    B::Item: Clone,
    F: Fn(Self::Item, B::Item) -> U + Send + Sync + 'static,
    U: Send + 'static,
  {
    CombineLatest::new(self, other, combiner)
  }

  // ==================== Multicast ====================

  /// Multicasts one upstream subscription to all subscribers, replaying up
  /// to `replay` values to late ones.
  fn share_with(self, replay: usize, scope: SubjectLifetimeScope) -> Share<Self>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    Share::new(self, replay, scope)
  }

  /// `share_with(0, SubjectLifetimeScope::WhileConnected)`.
  fn share(self) -> Share<Self>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    Share::new(self, 0, SubjectLifetimeScope::WhileConnected)
  }

  /// `share_with(replay, SubjectLifetimeScope::WhileConnected)`.
  fn share_replay(self, replay: usize) -> Share<Self>
  where
    Self::Item: Clone,
    Self::Err: Clone,
  {
    Share::new(self, replay, SubjectLifetimeScope::WhileConnected)
  }

  // ==================== Error handling ====================

  /// Re-subscribes to the source up to `count` times after an error.
  fn retry(self, count: usize) -> Retry<Self> { Retry::new(self, count) }

  /// Continues with the observable `handler` returns for the error.
  fn catch_error<F, B>(self, handler: F) -> CatchError<Self, F>
  where
    F: Fn(Self::Err) -> B + Send + Sync + 'static,
    B: Observable<Item = Self::Item>,
  {
    CatchError::new(self, handler)
  }

  // ==================== Side effects ====================

  /// Calls `f` with every event before passing it on.
  fn tap<F>(self, f: F) -> Tap<Self, F>
  where
    F: Fn(&Event<Self::Item, Self::Err>) + Send + Sync + 'static,
  {
    Tap::new(self, f)
  }

  /// Calls `f` when the source completes, before passing completion on.
  fn on_complete<F>(self, f: F) -> OnComplete<Self, F>
  where
    F: Fn() + Send + Sync + 'static,
  {
    OnComplete::new(self, f)
  }

  // ==================== Scheduling ====================

  /// Delivers events downstream on `scheduler`, in order.
  fn observe_on<SD>(self, scheduler: SD) -> ObserveOn<Self, SD>
  where
    SD: Scheduler + Clone + 'static,
  {
    ObserveOn::new(self, scheduler)
  }

  /// Subscribes to the source on `scheduler`.
  fn subscribe_on<SD>(self, scheduler: SD) -> SubscribeOn<Self, SD>
  where
    SD: Scheduler + 'static,
  {
    SubscribeOn::new(self, scheduler)
  }

  /// Shifts values and completion by `delay`. Errors pass through at once.
  fn delay<SD>(self, delay: Duration, scheduler: SD) -> Delay<Self, SD>
  where
    SD: Scheduler + Clone + 'static,
  {
    Delay::new(self, delay, scheduler)
  }

  /// Erases the concrete type.
  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err> { BoxedObservable::new(self) }
}

impl<T: Observable> ObservableExt for T {}
