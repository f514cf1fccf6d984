use std::sync::Arc;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Applies `f` to each value.
pub struct Map<S, F> {
  source: S,
  f: Arc<F>,
}

impl<S, F> Map<S, F> {
  pub(crate) fn new(source: S, f: F) -> Self { Map { source, f: Arc::new(f) } }
}

impl<S: Clone, F> Clone for Map<S, F> {
  fn clone(&self) -> Self { Map { source: self.source.clone(), f: self.f.clone() } }
}

impl<S, F, U> Producer for Map<S, F>
where
  S: Observable,
  F: Fn(S::Item) -> U + Send + Sync + 'static,
  U: Send + 'static,
{
  type Item = U;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<U, S::Err> + 'static,
  {
    let sink = MapSink { sink: Sink::new(observer, cancel), f: self.f.clone() };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct MapSink<O, F> {
  sink: Sink<O>,
  f: Arc<F>,
}

impl<O, F, Item, Err, U> Observer<Item, Err> for MapSink<O, F>
where
  O: Observer<U, Err>,
  F: Fn(Item) -> U + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => {
        let mapped = (self.f)(value);
        self.sink.forward(Event::Next(mapped));
      }
      Event::Error(err) => {
        self.sink.forward(Event::Error(err));
        self.sink.dispose();
      }
      Event::Completed => {
        self.sink.forward(Event::Completed);
        self.sink.dispose();
      }
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

/// Applies a fallible `f` to each value; the first `Err` ends the stream.
pub struct TryMap<S, F> {
  source: S,
  f: Arc<F>,
}

impl<S, F> TryMap<S, F> {
  pub(crate) fn new(source: S, f: F) -> Self { TryMap { source, f: Arc::new(f) } }
}

impl<S, F, U> Producer for TryMap<S, F>
where
  S: Observable,
  F: Fn(S::Item) -> Result<U, S::Err> + Send + Sync + 'static,
  U: Send + 'static,
{
  type Item = U;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<U, S::Err> + 'static,
  {
    let sink = TryMapSink { sink: Sink::new(observer, cancel), f: self.f.clone() };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct TryMapSink<O, F> {
  sink: Sink<O>,
  f: Arc<F>,
}

impl<O, F, Item, Err, U> Observer<Item, Err> for TryMapSink<O, F>
where
  O: Observer<U, Err>,
  F: Fn(Item) -> Result<U, Err> + Send + Sync,
{
  fn on(&mut self, event: Event<Item, Err>) {
    let event = match event {
      Event::Next(value) => match (self.f)(value) {
        Ok(mapped) => {
          self.sink.forward(Event::Next(mapped));
          return;
        }
        Err(err) => Event::Error(err),
      },
      Event::Error(err) => Event::Error(err),
      Event::Completed => Event::Completed,
    };
    self.sink.forward(event);
    self.sink.dispose();
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
