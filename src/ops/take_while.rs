use std::sync::Arc;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Whether the value that ends a `take_while` / `take_until_predicate` is
/// emitted before completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TakeBehavior {
  /// Emit the deciding value, then complete.
  Inclusive,
  /// Complete without emitting the deciding value.
  #[default]
  Exclusive,
}

/// Emits values until the predicate's answer flips to `stop_on`.
///
/// `take_while` stops when the predicate returns `false`,
/// `take_until_predicate` when it returns `true`.
pub struct TakeWhile<S, F> {
  source: S,
  predicate: Arc<F>,
  stop_on: bool,
  behavior: TakeBehavior,
}

impl<S, F> TakeWhile<S, F> {
  pub(crate) fn new(source: S, predicate: F, stop_on: bool, behavior: TakeBehavior) -> Self {
    TakeWhile { source, predicate: Arc::new(predicate), stop_on, behavior }
  }
}

impl<S, F> Producer for TakeWhile<S, F>
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
    let sink = TakeWhileSink {
      sink: Sink::new(observer, cancel),
      predicate: self.predicate.clone(),
      stop_on: self.stop_on,
      behavior: self.behavior,
    };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct TakeWhileSink<O, F> {
  sink: Sink<O>,
  predicate: Arc<F>,
  stop_on: bool,
  behavior: TakeBehavior,
}

impl<O, F, Item, Err> Observer<Item, Err> for TakeWhileSink<O, F>
where
  O: Observer<Item, Err>,
  F: Fn(&Item) -> bool + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => {
        if (self.predicate)(&value) != self.stop_on {
          self.sink.forward(Event::Next(value));
          return;
        }
        if self.behavior == TakeBehavior::Inclusive {
          self.sink.forward(Event::Next(value));
        }
        self.sink.forward(Event::Completed);
        self.sink.dispose();
      }
      terminal => {
        self.sink.forward(terminal);
        self.sink.dispose();
      }
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
