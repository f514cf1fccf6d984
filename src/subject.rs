//! Publish subject: a hot source you push events into by hand.
//!
//! A [`Subject`] is both an [`Observable`] and an [`Observer`]. Values go to
//! the observers registered at the time they are pushed; a late subscriber
//! to a terminated subject receives the terminal event immediately.
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! let subject = Subject::<i32, std::convert::Infallible>::new();
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//! let c_seen = seen.clone();
//!
//! subject.next(1); // nobody is listening yet
//! let subscription = subject.subscribe(move |v| c_seen.lock().unwrap().push(v));
//! subject.next(2);
//! subscription.dispose();
//! subject.next(3);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![2]);
//! ```

use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use crate::{
  disposable::Subscription,
  event::Event,
  observable::Observable,
  observer::Observer,
  util::lock,
};

pub(crate) mod subscribers;

use subscribers::{broadcast, shared_observer, Subscribers};

struct SubjectState<Item, Err> {
  observers: Subscribers<Item, Err>,
  terminal: Option<Event<Item, Err>>,
}

/// Multicasting hot source. Clones share the same observers.
pub struct Subject<Item, Err> {
  state: Arc<Mutex<SubjectState<Item, Err>>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { state: self.state.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      state: Arc::new(Mutex::new(SubjectState {
        observers: Subscribers::default(),
        terminal: None,
      })),
    }
  }
}

impl<Item, Err> Subject<Item, Err>
where
  Item: Clone,
  Err: Clone,
{
  pub fn new() -> Self { Self::default() }

  pub fn next(&self, value: Item) { self.emit(Event::Next(value)) }

  pub fn error(&self, err: Err) { self.emit(Event::Error(err)) }

  pub fn complete(&self) { self.emit(Event::Completed) }

  /// `true` once the subject has seen a terminal event.
  pub fn is_stopped(&self) -> bool { lock(&self.state).terminal.is_some() }

  pub fn observer_count(&self) -> usize { lock(&self.state).observers.len() }

  fn emit(&self, event: Event<Item, Err>) {
    let observers = {
      let mut state = lock(&self.state);
      if state.terminal.is_some() {
        return;
      }
      if event.is_next() {
        state.observers.snapshot()
      } else {
        state.terminal = Some(event.clone());
        state.observers.take_all()
      }
    };
    broadcast(observers, event);
  }
}

impl<Item, Err> Observer<Item, Err> for Subject<Item, Err>
where
  Item: Clone + Send,
  Err: Clone + Send,
{
  fn on(&mut self, event: Event<Item, Err>) { self.emit(event) }

  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err> Observable for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(&self, mut observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut state = lock(&self.state);
    let terminal = state.terminal.clone();
    if let Some(terminal) = terminal {
      drop(state);
      observer.on(terminal);
      return Subscription::empty();
    }

    let id = state.observers.add(shared_observer(observer));
    trace!(id, observers = state.observers.len(), "subject observer registered");
    drop(state);

    let weak: Weak<Mutex<SubjectState<Item, Err>>> = Arc::downgrade(&self.state);
    Subscription::from_fn(move || {
      if let Some(state) = weak.upgrade() {
        lock(&state).observers.remove(id);
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
  };

  use super::*;
  use crate::{
    disposable::Disposable,
    observable::ObservableExt,
    test_util::{finishes_in_time, EventRecorder},
  };

  #[rxflow_macro::test]
  fn base_data_flow() {
    let subject = Subject::<i32, ()>::new();
    let (a, b) = (EventRecorder::new(), EventRecorder::new());
    subject.actual_subscribe(a.clone());
    subject.next(1);
    subject.actual_subscribe(b.clone());
    subject.next(2);
    subject.complete();

    assert_eq!(a.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
    assert_eq!(b.events(), vec![Event::Next(2), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn late_subscriber_gets_terminal() {
    let subject = Subject::<i32, &str>::new();
    subject.error("boom");
    subject.next(1);

    let late = EventRecorder::new();
    let subscription = subject.actual_subscribe(late.clone());
    assert_eq!(late.events(), vec![Event::Error("boom")]);
    assert!(subscription.is_disposed());
  }

  #[rxflow_macro::test]
  fn unsubscribe_removes_observer() {
    let subject = Subject::<i32, ()>::new();
    let recorder = EventRecorder::new();
    let subscription = subject.actual_subscribe(recorder.clone());
    assert_eq!(subject.observer_count(), 1);

    subscription.dispose();
    subscription.dispose();
    subject.next(1);

    assert_eq!(subject.observer_count(), 0);
    assert!(recorder.events().is_empty());
  }

  #[rxflow_macro::test]
  fn observer_may_unsubscribe_itself_during_delivery() {
    let subject = Subject::<i32, ()>::new();
    let slot = Arc::new(Mutex::new(Subscription::empty()));
    let count = Arc::new(AtomicUsize::new(0));
    let (c_slot, c_count) = (slot.clone(), count.clone());

    let subscription = subject.actual_subscribe(crate::observer::FnObserver::new(
      move |_: i32| {
        c_count.fetch_add(1, Ordering::SeqCst);
        c_slot.lock().unwrap().dispose();
      },
      |_: ()| {},
      || {},
    ));
    *slot.lock().unwrap() = subscription;

    subject.next(1);
    subject.next(2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[rxflow_macro::test]
  fn concurrent_emitters() {
    let subject = Subject::<usize, ()>::new();
    let recorder = EventRecorder::new();
    subject.actual_subscribe(recorder.clone());

    let handles: Vec<_> = (0..4)
      .map(|t| {
        let subject = subject.clone();
        thread::spawn(move || (0..100).for_each(|i| subject.next(t * 100 + i)))
      })
      .collect();
    handles.into_iter().for_each(|h| h.join().unwrap());

    let mut values = recorder.values();
    values.sort_unstable();
    assert_eq!(values, (0..400).collect::<Vec<_>>());
  }

  #[rxflow_macro::test]
  fn next_from_inside_own_delivery_is_queued() {
    let recorder = EventRecorder::<i32, ()>::new();
    let c_recorder = recorder.clone();
    finishes_in_time(move || {
      let subject = Subject::<i32, ()>::new();
      let c_subject = subject.clone();
      subject
        .clone()
        .tap(move |event| {
          if let Event::Next(v @ 1..=2) = event {
            c_subject.next(v * 10);
          }
        })
        .actual_subscribe(c_recorder);
      subject.next(1);
      subject.next(2);
    });
    assert_eq!(recorder.values(), vec![1, 10, 2, 20]);
  }
}
