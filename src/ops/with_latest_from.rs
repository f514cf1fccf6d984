use std::sync::{Arc, Mutex};

use crate::{
  disposable::{BinaryDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
  util::lock,
};

/// Combines each source value with the latest value from `other`.
///
/// `other` is subscribed first. Source values that arrive before `other`
/// has emitted are dropped. `other` completing changes nothing (its latest
/// value stays in use); `other` failing fails the whole stream.
pub struct WithLatestFrom<S, B, F> {
  source: S,
  other: B,
  combiner: Arc<F>,
}

impl<S, B, F> WithLatestFrom<S, B, F> {
  pub(crate) fn new(source: S, other: B, combiner: F) -> Self {
    WithLatestFrom { source, other, combiner: Arc::new(combiner) }
  }
}

impl<S, B, F, U> Producer for WithLatestFrom<S, B, F>
where
  S: Observable,
  B: Observable<Err = S::Err>,
  B::Item: Clone,
  F: Fn(S::Item, B::Item) -> U + Send + Sync + 'static,
  U: Send + 'static,
{
  type Item = U;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<U, S::Err> + 'static,
  {
    let sink = Arc::new(SerializedSink::new(Sink::new(observer, cancel)));
    let handle = sink.handle();
    let latest = Arc::new(Mutex::new(None));

    let other_subscription = Arc::new(SingleAssignmentDisposable::new());
    let other_observer = OtherObserver {
      sink: sink.clone(),
      latest: latest.clone(),
      own_subscription: other_subscription.clone(),
    };
    other_subscription.set(self.other.actual_subscribe(other_observer));

    let main = WithLatestFromSink { sink, latest, combiner: self.combiner.clone() };
    let source_subscription = self.source.actual_subscribe(main);
    let upstream =
      BinaryDisposable::new(Subscription::from_arc(other_subscription), source_subscription);
    (handle, upstream.into())
  }
}

/// The source and `other` share one serialized sink. The latest value has
/// its own lock, held only to read or replace it.
pub struct WithLatestFromSink<O, B, F, U, Err> {
  sink: Arc<SerializedSink<O, U, Err>>,
  latest: Arc<Mutex<Option<B>>>,
  combiner: Arc<F>,
}

impl<O, B, F, A, U, Err> Observer<A, Err> for WithLatestFromSink<O, B, F, U, Err>
where
  O: Observer<U, Err>,
  B: Clone + Send,
  F: Fn(A, B) -> U + Send + Sync,
  U: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<A, Err>) {
    match event {
      Event::Next(value) => {
        let latest = lock(&self.latest).clone();
        if let Some(latest) = latest {
          self.sink.on(Event::Next((self.combiner)(value, latest)));
        }
      }
      Event::Error(err) => self.sink.on(Event::Error(err)),
      Event::Completed => self.sink.on(Event::Completed),
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

struct OtherObserver<O, B, U, Err> {
  sink: Arc<SerializedSink<O, U, Err>>,
  latest: Arc<Mutex<Option<B>>>,
  own_subscription: Arc<SingleAssignmentDisposable>,
}

impl<O, B, U, Err> Observer<B, Err> for OtherObserver<O, B, U, Err>
where
  O: Observer<U, Err>,
  B: Send,
  U: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<B, Err>) {
    match event {
      Event::Next(value) => *lock(&self.latest) = Some(value),
      Event::Error(err) => self.sink.on(Event::Error(err)),
      Event::Completed => self.own_subscription.dispose(),
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_disposed() }
}
