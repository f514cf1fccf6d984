use std::{sync::Arc, time::Duration};

use crate::{
  disposable::{BinaryDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
  scheduler::Scheduler,
};

/// Mirrors the source until `duration` has passed on `scheduler`, then
/// completes.
#[derive(Clone)]
pub struct TakeFor<S, SD> {
  source: S,
  duration: Duration,
  scheduler: SD,
}

impl<S, SD> TakeFor<S, SD> {
  pub(crate) fn new(source: S, duration: Duration, scheduler: SD) -> Self {
    TakeFor { source, duration, scheduler }
  }
}

impl<S, SD> Producer for TakeFor<S, SD>
where
  S: Observable,
  SD: Scheduler + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = Arc::new(SerializedSink::new(Sink::new(observer, cancel)));
    let handle = sink.handle();

    let c_sink = sink.clone();
    let timer = self
      .scheduler
      .schedule(Some(self.duration), Box::new(move || c_sink.on(Event::Completed)));

    let source_subscription = self.source.actual_subscribe(TakeForSink { sink });
    (handle, BinaryDisposable::new(timer, source_subscription).into())
  }
}

pub struct TakeForSink<O, Item, Err> {
  sink: Arc<SerializedSink<O, Item, Err>>,
}

impl<O, Item, Err> Observer<Item, Err> for TakeForSink<O, Item, Err>
where
  O: Observer<Item, Err>,
  Item: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<Item, Err>) { self.sink.on(event); }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
