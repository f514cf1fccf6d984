use std::sync::Arc;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SinkCancel},
};

/// Creates the observable to subscribe to lazily, once per subscription.
///
/// ```
/// use rxflow::prelude::*;
///
/// let source = observable::defer(|| observable::of(std::process::id()));
/// source.subscribe(|pid| println!("{pid}"));
/// ```
pub fn defer<F, S>(factory: F) -> Defer<F>
where
  F: Fn() -> S + Send + Sync + 'static,
  S: Observable,
{
  Defer { factory: Arc::new(factory) }
}

pub struct Defer<F> {
  factory: Arc<F>,
}

impl<F> Clone for Defer<F> {
  fn clone(&self) -> Self { Defer { factory: self.factory.clone() } }
}

impl<F, S> Producer for Defer<F>
where
  F: Fn() -> S + Send + Sync + 'static,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, _cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let source = (self.factory)();
    (Subscription::empty(), source.actual_subscribe(observer))
  }
}
