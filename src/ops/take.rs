use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Emits only the first `count` values emitted by the source, then
/// completes and releases the source.
///
/// If the source emits fewer than `count` values then all of its values are
/// emitted and its own terminal event is passed on. `take(0)` completes
/// without subscribing to the source at all.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::from_iter(0..10)
///   .take(5)
///   .subscribe(|v| println!("{v}"));
///
/// // print logs:
/// // 0
/// // 1
/// // 2
/// // 3
/// // 4
/// ```
#[derive(Clone)]
pub struct Take<S> {
  source: S,
  count: usize,
}

impl<S> Take<S> {
  pub(crate) fn new(source: S, count: usize) -> Self { Take { source, count } }
}

impl<S: Observable> Producer for Take<S> {
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    if self.count == 0 {
      sink.forward(Event::Completed);
      sink.dispose();
      return (sink.handle(), Subscription::empty());
    }

    let sink = TakeSink { sink, remaining: self.count };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct TakeSink<O> {
  sink: Sink<O>,
  remaining: usize,
}

impl<O, Item, Err> Observer<Item, Err> for TakeSink<O>
where
  O: Observer<Item, Err>,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => {
        if self.remaining == 0 {
          return;
        }
        self.remaining -= 1;
        self.sink.forward(Event::Next(value));
        if self.remaining == 0 {
          self.sink.forward(Event::Completed);
          self.sink.dispose();
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

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  };

  use super::*;
  use crate::{
    disposable::Disposable,
    observable::{create, from_iter, Emitter, ObservableExt},
    subject::Subject,
    test_util::EventRecorder,
  };

  #[rxflow_macro::test]
  fn base_function() {
    let recorder = EventRecorder::<i32, ()>::new();
    from_iter(vec![1, 2, 3, 4, 5])
      .take(3)
      .actual_subscribe(recorder.clone());

    assert_eq!(
      recorder.events(),
      vec![Event::Next(1), Event::Next(2), Event::Next(3), Event::Completed]
    );
  }

  #[rxflow_macro::test]
  fn take_zero_never_subscribes() {
    let subscribed = Arc::new(AtomicBool::new(false));
    let c_subscribed = subscribed.clone();
    let source = create(move |emitter: Emitter<i32, ()>| {
      c_subscribed.store(true, Ordering::SeqCst);
      emitter.next(1);
    });

    let recorder = EventRecorder::new();
    let subscription = source.take(0).actual_subscribe(recorder.clone());

    assert!(!subscribed.load(Ordering::SeqCst));
    assert_eq!(recorder.events(), vec![Event::Completed]);
    assert!(subscription.is_disposed());
  }

  #[rxflow_macro::test]
  fn fewer_values_than_count() {
    let recorder = EventRecorder::<i32, ()>::new();
    from_iter(vec![1, 2]).take(5).actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn releases_source_right_after_last_value() {
    let subject = Subject::<i32, ()>::new();
    let recorder = EventRecorder::new();
    subject.clone().take(2).actual_subscribe(recorder.clone());
    assert_eq!(subject.observer_count(), 1);

    subject.next(1);
    assert_eq!(subject.observer_count(), 1);
    subject.next(2);
    assert_eq!(subject.observer_count(), 0);

    subject.next(3);
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
  }
}
