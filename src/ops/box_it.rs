//! Type erasure for observables.
//!
//! [`BoxedObservable`] hides the nested operator type behind a trait object,
//! so differently built pipelines with the same `Item`/`Err` can be stored in
//! one collection or returned from one function.

use std::sync::Arc;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

trait DynObservable<Item, Err>: Send + Sync {
  fn dyn_subscribe(&self, observer: BoxedObserver<Item, Err>) -> Subscription;
}

impl<S: Observable> DynObservable<S::Item, S::Err> for S {
  fn dyn_subscribe(&self, observer: BoxedObserver<S::Item, S::Err>) -> Subscription {
    self.actual_subscribe(observer)
  }
}

/// A type-erased, clonable observable.
///
/// ```
/// use rxflow::prelude::*;
///
/// let sources: Vec<BoxedObservable<i32, std::convert::Infallible>> = vec![
///   observable::of(1).box_it(),
///   observable::from_iter(vec![2, 3]).map(|v| v * 10).box_it(),
/// ];
/// for source in &sources {
///   source.subscribe(|v| print!("{v} "));
/// }
/// // print: 1 20 30
/// ```
pub struct BoxedObservable<Item, Err>(Arc<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub(crate) fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err>,
  {
    BoxedObservable(Arc::new(source))
  }
}

impl<Item, Err> Clone for BoxedObservable<Item, Err> {
  fn clone(&self) -> Self { BoxedObservable(self.0.clone()) }
}

impl<Item, Err> Observable for BoxedObservable<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(&self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.dyn_subscribe(Box::new(observer))
  }
}
