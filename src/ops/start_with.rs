use std::sync::Arc;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Emits `values` synchronously on subscription, then mirrors the source.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::of(3)
///   .start_with(vec![1, 2])
///   .subscribe(|v| print!("{v} "));
/// // print: 1 2 3
/// ```
pub struct StartWith<S: Observable> {
  source: S,
  values: Arc<Vec<S::Item>>,
}

impl<S: Observable> StartWith<S> {
  pub(crate) fn new(source: S, values: Vec<S::Item>) -> Self {
    StartWith { source, values: Arc::new(values) }
  }
}

impl<S: Observable + Clone> Clone for StartWith<S> {
  fn clone(&self) -> Self { StartWith { source: self.source.clone(), values: self.values.clone() } }
}

impl<S> Producer for StartWith<S>
where
  S: Observable,
  S::Item: Clone + Sync,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    for value in self.values.iter() {
      if sink.is_closed() {
        return (sink.handle(), Subscription::empty());
      }
      sink.forward(Event::Next(value.clone()));
    }
    if sink.is_closed() {
      return (sink.handle(), Subscription::empty());
    }

    let handle = sink.handle();
    (handle, self.source.actual_subscribe(PassThrough::new(sink)))
  }
}

/// Forwards everything and disposes on the terminal event.
pub struct PassThrough<O> {
  sink: Sink<O>,
}

impl<O> PassThrough<O> {
  pub(crate) fn new(sink: Sink<O>) -> Self { PassThrough { sink } }
}

impl<O, Item, Err> Observer<Item, Err> for PassThrough<O>
where
  O: Observer<Item, Err>,
{
  fn on(&mut self, event: Event<Item, Err>) {
    let stop = event.is_stop_event();
    self.sink.forward(event);
    if stop {
      self.sink.dispose();
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
