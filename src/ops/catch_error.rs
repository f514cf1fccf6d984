use std::sync::Arc;

use crate::{
  disposable::{BinaryDisposable, SingleAssignmentDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
};

/// On error, continues with the observable `handler` builds from it.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::throw_err::<i32, _>("offline")
///   .catch_error(|_| observable::of::<_, std::convert::Infallible>(-1))
///   .subscribe(|v| assert_eq!(v, -1));
/// ```
pub struct CatchError<S, F> {
  source: S,
  handler: Arc<F>,
}

impl<S, F> CatchError<S, F> {
  pub(crate) fn new(source: S, handler: F) -> Self {
    CatchError { source, handler: Arc::new(handler) }
  }
}

impl<S, F, B> Producer for CatchError<S, F>
where
  S: Observable,
  F: Fn(S::Err) -> B + Send + Sync + 'static,
  B: Observable<Item = S::Item>,
{
  type Item = S::Item;
  type Err = B::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, B::Err> + 'static,
  {
    let sink = Arc::new(SerializedSink::new(Sink::new(observer, cancel)));
    let handle = sink.handle();
    let source_subscription = Arc::new(SingleAssignmentDisposable::new());
    let fallback_subscription = Arc::new(SingleAssignmentDisposable::new());

    let main = CatchErrorSink {
      sink,
      handler: self.handler.clone(),
      fallback_subscription: fallback_subscription.clone(),
    };
    source_subscription.set(self.source.actual_subscribe(main));

    let upstream = BinaryDisposable::new(
      Subscription::from_arc(source_subscription),
      Subscription::from_arc(fallback_subscription),
    );
    (handle, upstream.into())
  }
}

/// Source and fallback deliver through one serialized sink. The handler
/// runs and the fallback is subscribed without holding any lock.
pub struct CatchErrorSink<O, F, Item, E> {
  sink: Arc<SerializedSink<O, Item, E>>,
  handler: Arc<F>,
  fallback_subscription: Arc<SingleAssignmentDisposable>,
}

impl<O, F, B, Item, Err, E> Observer<Item, Err> for CatchErrorSink<O, F, Item, E>
where
  O: Observer<Item, E> + 'static,
  F: Fn(Err) -> B + Send + Sync,
  B: Observable<Item = Item, Err = E>,
  Item: Send + 'static,
  E: Send + 'static,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => self.sink.on(Event::Next(value)),
      Event::Completed => self.sink.on(Event::Completed),
      Event::Error(err) => {
        if self.sink.is_disposed() {
          return;
        }
        let fallback = (self.handler)(err);
        let subscription = fallback.actual_subscribe(FallbackObserver { sink: self.sink.clone() });
        self.fallback_subscription.set(subscription);
      }
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

struct FallbackObserver<O, Item, Err> {
  sink: Arc<SerializedSink<O, Item, Err>>,
}

impl<O, Item, Err> Observer<Item, Err> for FallbackObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
  Item: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<Item, Err>) { self.sink.on(event); }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}
