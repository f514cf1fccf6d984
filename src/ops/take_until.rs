use std::sync::Arc;

use crate::{
  disposable::{BinaryDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
};

/// Emits the values emitted by the source until a `notifier` emits a value.
///
/// The notifier is subscribed first. Its first value completes the stream,
/// its error errors it, and its completion only releases the notifier.
///
/// ```
/// use rxflow::prelude::*;
///
/// let source = Subject::<i32, std::convert::Infallible>::new();
/// let stop = Subject::<(), std::convert::Infallible>::new();
///
/// source.clone().take_until(stop.clone()).subscribe(|v| println!("{v}"));
/// source.next(1);
/// stop.next(());
/// source.next(2); // not delivered
/// ```
#[derive(Clone)]
pub struct TakeUntil<S, N> {
  source: S,
  notifier: N,
}

impl<S, N> TakeUntil<S, N> {
  pub(crate) fn new(source: S, notifier: N) -> Self { TakeUntil { source, notifier } }
}

impl<S, N> Producer for TakeUntil<S, N>
where
  S: Observable,
  N: Observable<Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = Arc::new(SerializedSink::new(Sink::new(observer, cancel)));
    let handle = sink.handle();

    let notifier_subscription = Arc::new(SingleAssignmentDisposable::new());
    let notifier_observer = NotifierObserver {
      sink: sink.clone(),
      own_subscription: notifier_subscription.clone(),
    };
    notifier_subscription.set(self.notifier.actual_subscribe(notifier_observer));

    let source_subscription = self.source.actual_subscribe(TakeUntilSink { sink });
    let upstream = BinaryDisposable::new(
      Subscription::from_arc(notifier_subscription),
      source_subscription,
    );
    (handle, upstream.into())
  }
}

/// Both the source and the notifier feed one serialized sink, so either may
/// fire from inside the other's downstream callback.
pub struct TakeUntilSink<O, Item, Err> {
  sink: Arc<SerializedSink<O, Item, Err>>,
}

impl<O, Item, Err> Observer<Item, Err> for TakeUntilSink<O, Item, Err>
where
  O: Observer<Item, Err>,
  Item: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<Item, Err>) { self.sink.on(event); }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

/// Observes the notifier on behalf of a sink emitting `Item`s.
struct NotifierObserver<O, Item, Err> {
  sink: Arc<SerializedSink<O, Item, Err>>,
  own_subscription: Arc<SingleAssignmentDisposable>,
}

impl<O, NItem, Item, Err> Observer<NItem, Err> for NotifierObserver<O, Item, Err>
where
  O: Observer<Item, Err>,
  Item: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<NItem, Err>) {
    match event {
      Event::Next(_) => self.sink.on(Event::Completed),
      Event::Error(err) => self.sink.on(Event::Error(err)),
      Event::Completed => self.own_subscription.dispose(),
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_disposed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{from_iter, never, ObservableExt},
    subject::Subject,
    test_util::{finishes_in_time, EventRecorder},
  };

  #[rxflow_macro::test]
  fn notifier_value_completes() {
    let source = Subject::<i32, ()>::new();
    let notifier = Subject::<&str, ()>::new();
    let recorder = EventRecorder::new();
    source
      .clone()
      .take_until(notifier.clone())
      .actual_subscribe(recorder.clone());

    source.next(1);
    notifier.next("stop");
    source.next(2);

    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Completed]);
    assert_eq!(source.observer_count(), 0);
    assert_eq!(notifier.observer_count(), 0);
  }

  #[rxflow_macro::test]
  fn notifier_error_errors() {
    let source = Subject::<i32, &str>::new();
    let notifier = Subject::<(), &str>::new();
    let recorder = EventRecorder::new();
    source
      .clone()
      .take_until(notifier.clone())
      .actual_subscribe(recorder.clone());

    notifier.error("boom");
    source.next(1);
    assert_eq!(recorder.events(), vec![Event::Error("boom")]);
  }

  #[rxflow_macro::test]
  fn notifier_completion_is_inert() {
    let source = Subject::<i32, ()>::new();
    let notifier = Subject::<(), ()>::new();
    let recorder = EventRecorder::new();
    source
      .clone()
      .take_until(notifier.clone())
      .actual_subscribe(recorder.clone());

    notifier.complete();
    source.next(1);
    source.complete();
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn synchronous_notifier_wins() {
    let recorder = EventRecorder::<i32, ()>::new();
    from_iter(1..5)
      .take_until(from_iter(vec![()]))
      .actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Completed]);
  }

  #[rxflow_macro::test]
  fn silent_notifier_lets_everything_through() {
    let recorder = EventRecorder::<i32, ()>::new();
    from_iter(1..4)
      .take_until(never::<(), ()>())
      .actual_subscribe(recorder.clone());
    assert_eq!(recorder.values(), vec![1, 2, 3]);
  }

  #[rxflow_macro::test]
  fn notifier_fired_from_downstream_callback() {
    let recorder = EventRecorder::<i32, ()>::new();
    let c_recorder = recorder.clone();
    finishes_in_time(move || {
      let source = Subject::<i32, ()>::new();
      let stop = Subject::<(), ()>::new();
      let c_stop = stop.clone();
      source
        .clone()
        .take_until(stop)
        .tap(move |event| {
          if let Event::Next(2) = event {
            c_stop.next(());
          }
        })
        .actual_subscribe(c_recorder);
      source.next(1);
      source.next(2);
      source.next(3);
    });
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
  }
}
