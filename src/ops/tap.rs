use std::sync::Arc;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Calls a side-effect function with every event, then passes it on.
pub struct Tap<S, F> {
  source: S,
  f: Arc<F>,
}

impl<S, F> Tap<S, F> {
  pub(crate) fn new(source: S, f: F) -> Self { Tap { source, f: Arc::new(f) } }
}

impl<S, F> Producer for Tap<S, F>
where
  S: Observable,
  F: Fn(&Event<S::Item, S::Err>) + Send + Sync + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = TapSink { sink: Sink::new(observer, cancel), f: self.f.clone() };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct TapSink<O, F> {
  sink: Sink<O>,
  f: Arc<F>,
}

impl<O, F, Item, Err> Observer<Item, Err> for TapSink<O, F>
where
  O: Observer<Item, Err>,
  F: Fn(&Event<Item, Err>) + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    if self.sink.is_disposed() {
      return;
    }
    (self.f)(&event);
    let stop = event.is_stop_event();
    self.sink.forward(event);
    if stop {
      self.sink.dispose();
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

/// Calls `f` when the source completes, before the completion is passed on.
pub struct OnComplete<S, F> {
  source: S,
  f: Arc<F>,
}

impl<S, F> OnComplete<S, F> {
  pub(crate) fn new(source: S, f: F) -> Self { OnComplete { source, f: Arc::new(f) } }
}

impl<S, F> Producer for OnComplete<S, F>
where
  S: Observable,
  F: Fn() + Send + Sync + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = OnCompleteSink { sink: Sink::new(observer, cancel), f: self.f.clone() };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct OnCompleteSink<O, F> {
  sink: Sink<O>,
  f: Arc<F>,
}

impl<O, F, Item, Err> Observer<Item, Err> for OnCompleteSink<O, F>
where
  O: Observer<Item, Err>,
  F: Fn() + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    let stop = event.is_stop_event();
    if matches!(event, Event::Completed) && !self.sink.is_disposed() {
      (self.f)();
    }
    self.sink.forward(event);
    if stop {
      self.sink.dispose();
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
