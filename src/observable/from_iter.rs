use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  event::Event,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Creates an observable that produces values from an iterator.
///
/// The iterable is cloned per subscription. Emission stops early once the
/// downstream closes, e.g. behind a `take`.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::from_iter(vec![0, 1, 2, 3]).subscribe(|v| println!("{v}"));
/// ```
pub fn from_iter<I, Err>(iter: I) -> FromIter<I, Err>
where
  I: IntoIterator + Clone,
{
  FromIter { iter, _err: PhantomData }
}

pub struct FromIter<I, Err> {
  iter: I,
  _err: PhantomData<fn() -> Err>,
}

impl<I: Clone, Err> Clone for FromIter<I, Err> {
  fn clone(&self) -> Self { FromIter { iter: self.iter.clone(), _err: PhantomData } }
}

impl<I, Err> Producer for FromIter<I, Err>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
  I::Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = I::Item;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<I::Item, Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    for value in self.iter.clone() {
      if sink.is_closed() {
        return (sink.handle(), Subscription::empty());
      }
      sink.forward(Event::Next(value));
    }
    sink.forward(Event::Completed);
    sink.dispose();
    (sink.handle(), Subscription::empty())
  }
}
