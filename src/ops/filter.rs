use std::sync::Arc;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Forwards only the values `predicate` accepts.
pub struct Filter<S, F> {
  source: S,
  predicate: Arc<F>,
}

impl<S, F> Filter<S, F> {
  pub(crate) fn new(source: S, predicate: F) -> Self {
    Filter { source, predicate: Arc::new(predicate) }
  }
}

impl<S, F> Producer for Filter<S, F>
where
  S: Observable,
  F: Fn(&S::Item) -> bool + Send + Sync + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = FilterSink { sink: Sink::new(observer, cancel), predicate: self.predicate.clone() };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct FilterSink<O, F> {
  sink: Sink<O>,
  predicate: Arc<F>,
}

impl<O, F, Item, Err> Observer<Item, Err> for FilterSink<O, F>
where
  O: Observer<Item, Err>,
  F: Fn(&Item) -> bool + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => {
        if (self.predicate)(&value) {
          self.sink.forward(Event::Next(value));
        }
      }
      terminal => {
        self.sink.forward(terminal);
        self.sink.dispose();
      }
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
