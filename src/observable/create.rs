use std::{marker::PhantomData, sync::Arc};

use crate::{
  disposable::{Disposable, Subscription},
  event::Event,
  observer::{BoxedObserver, Observer},
  producer::{Producer, SerializedSink, Sink, SinkCancel},
};

/// Creates an observable from a function that drives an [`Emitter`].
///
/// `subscribe` runs once per subscription and returns that subscription's
/// teardown: any [`Disposable`], or `()` when there is nothing to release.
/// The teardown runs once, when the subscription is disposed or the emitter
/// delivers a terminal event. The emitter can be cloned and moved to other
/// threads; after a terminal event, or once the subscription is disposed,
/// everything it is given is dropped.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::create(|emitter: Emitter<i32, &str>| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
///   Subscription::from_fn(|| println!("released"))
/// })
/// .subscribe_err(|v| println!("{v}"), |e| println!("error {e}"));
/// ```
pub fn create<Item, Err, F, D>(subscribe: F) -> Create<F, Item, Err>
where
  F: Fn(Emitter<Item, Err>) -> D + Send + Sync + 'static,
  D: Disposable + 'static,
{
  Create { subscribe: Arc::new(subscribe), _marker: PhantomData }
}

pub struct Create<F, Item, Err> {
  subscribe: Arc<F>,
  _marker: PhantomData<fn() -> (Item, Err)>,
}

impl<F, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { subscribe: self.subscribe.clone(), _marker: PhantomData } }
}

/// The handle a [`create`] function emits through.
///
/// It may be called again from inside a downstream callback; such events are
/// delivered once the current one has been.
pub struct Emitter<Item, Err> {
  sink: Arc<SerializedSink<BoxedObserver<Item, Err>, Item, Err>>,
}

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter { sink: self.sink.clone() } }
}

impl<Item: Send, Err: Send> Emitter<Item, Err> {
  pub fn next(&self, value: Item) { self.sink.on(Event::Next(value)); }

  pub fn error(&self, err: Err) { self.sink.on(Event::Error(err)); }

  pub fn complete(&self) { self.sink.on(Event::Completed); }

  /// `true` once nothing more will be delivered; long-running producers
  /// should stop when they see it.
  pub fn is_closed(&self) -> bool { self.sink.is_closed() }
}

impl<F, Item, Err, D> Producer for Create<F, Item, Err>
where
  F: Fn(Emitter<Item, Err>) -> D + Send + Sync + 'static,
  D: Disposable + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Item, Err> + 'static,
  {
    let observer: BoxedObserver<Item, Err> = Box::new(observer);
    let sink = Arc::new(SerializedSink::new(Sink::new(observer, cancel)));
    let handle = sink.handle();
    let teardown = (self.subscribe)(Emitter { sink });
    (handle, Subscription::new(teardown))
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      mpsc::channel,
      Mutex,
    },
    thread,
  };

  use super::*;
  use crate::{
    observable::{Observable, ObservableExt},
    test_util::{finishes_in_time, EventRecorder},
  };

  fn counting_teardown(count: &Arc<AtomicUsize>) -> Subscription {
    let count = count.clone();
    Subscription::from_fn(move || {
      count.fetch_add(1, Ordering::SeqCst);
    })
  }

  #[rxflow_macro::test]
  fn nothing_after_terminal() {
    let recorder = EventRecorder::<i32, &str>::new();
    create(|emitter: Emitter<i32, &str>| {
      emitter.next(1);
      emitter.error("boom");
      emitter.next(2);
      emitter.complete();
    })
    .actual_subscribe(recorder.clone());

    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Error("boom")]);
  }

  #[rxflow_macro::test]
  fn emitter_can_move_to_another_thread() {
    let (tx, rx) = channel();
    let source = create(move |emitter: Emitter<i32, ()>| {
      tx.send(emitter).unwrap();
    });
    let recorder = EventRecorder::new();
    let subscription = source.actual_subscribe(recorder.clone());

    let emitter = rx.recv().unwrap();
    thread::spawn(move || {
      emitter.next(1);
      emitter.next(2);
    })
    .join()
    .unwrap();
    subscription.dispose();

    assert_eq!(recorder.values(), vec![1, 2]);
  }

  #[rxflow_macro::test]
  fn disposing_closes_emitter() {
    let (tx, rx) = channel();
    let source = create(move |emitter: Emitter<i32, ()>| {
      tx.send(emitter).unwrap();
    });
    let recorder = EventRecorder::new();
    let subscription = source.actual_subscribe(recorder.clone());
    let emitter = rx.recv().unwrap();

    subscription.dispose();
    assert!(emitter.is_closed());
    emitter.next(1);
    assert!(recorder.events().is_empty());
  }

  #[rxflow_macro::test]
  fn teardown_runs_once_on_dispose() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let c_teardowns = teardowns.clone();
    let source = create(move |emitter: Emitter<i32, ()>| {
      emitter.next(1);
      counting_teardown(&c_teardowns)
    });
    let recorder = EventRecorder::new();
    let subscription = source.actual_subscribe(recorder.clone());
    assert_eq!(teardowns.load(Ordering::SeqCst), 0);

    subscription.dispose();
    subscription.dispose();
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.events(), vec![Event::Next(1)]);
  }

  #[rxflow_macro::test]
  fn teardown_runs_once_after_complete() {
    let teardowns = Arc::new(AtomicUsize::new(0));
    let c_teardowns = teardowns.clone();
    let source = create(move |emitter: Emitter<i32, ()>| {
      emitter.next(1);
      emitter.complete();
      counting_teardown(&c_teardowns)
    });
    let recorder = EventRecorder::new();
    let subscription = source.actual_subscribe(recorder.clone());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    subscription.dispose();
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn emitter_called_from_downstream_callback() {
    let recorder = EventRecorder::<i32, ()>::new();
    let c_recorder = recorder.clone();
    finishes_in_time(move || {
      let slot = Arc::new(Mutex::new(None));
      let c_slot = slot.clone();
      let source = create(move |emitter: Emitter<i32, ()>| {
        *c_slot.lock().unwrap() = Some(emitter.clone());
        emitter.next(1);
      });
      source
        .tap(move |event| {
          let emitter = slot.lock().unwrap().clone();
          if let (Event::Next(1), Some(emitter)) = (event, emitter) {
            emitter.next(2);
            emitter.complete();
          }
        })
        .actual_subscribe(c_recorder);
    });
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
  }
}
