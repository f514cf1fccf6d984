//! Retry operator implementation
//!
//! `retry(count)` re-subscribes to the source after an error, up to `count`
//! times. The error that exhausts the budget is passed on. Each new attempt
//! is queued on the current-thread trampoline, so a source that fails
//! synchronously is retried iteratively rather than recursively.
//!
//! ```rust
//! use std::sync::{
//!   atomic::{AtomicUsize, Ordering},
//!   Arc, Mutex,
//! };
//!
//! use rxflow::prelude::*;
//!
//! let attempts = Arc::new(AtomicUsize::new(0));
//! let c_attempts = attempts.clone();
//! let source = observable::create(move |emitter: Emitter<i32, &str>| {
//!   if c_attempts.fetch_add(1, Ordering::SeqCst) < 2 {
//!     emitter.error("flaky");
//!   } else {
//!     emitter.next(1);
//!     emitter.complete();
//!   }
//! });
//!
//! let result = Arc::new(Mutex::new(Vec::new()));
//! let c_result = result.clone();
//! source
//!   .retry(3)
//!   .subscribe_err(move |v| c_result.lock().unwrap().push(v), |_| {});
//!
//! assert_eq!(*result.lock().unwrap(), vec![1]);
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! ```

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::{
  disposable::{Disposable, SerialDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
  scheduler::{CurrentThreadScheduler, Scheduler},
  util::lock,
};

pub struct Retry<S> {
  source: Arc<S>,
  count: usize,
}

impl<S> Retry<S> {
  pub(crate) fn new(source: S, count: usize) -> Self { Retry { source: Arc::new(source), count } }
}

impl<S> Clone for Retry<S> {
  fn clone(&self) -> Self { Retry { source: self.source.clone(), count: self.count } }
}

struct RetryShared<S: Observable, O> {
  source: Arc<S>,
  sink: SerializedSink<O, S::Item, S::Err>,
  remaining: Mutex<usize>,
  current: Arc<SerialDisposable>,
}

impl<S> Producer for Retry<S>
where
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = SerializedSink::new(Sink::new(observer, cancel));
    let handle = sink.handle();
    let current = Arc::new(SerialDisposable::new());
    let shared = Arc::new(RetryShared {
      source: self.source.clone(),
      sink,
      remaining: Mutex::new(self.count),
      current: current.clone(),
    });
    subscribe_attempt(&shared);
    (handle, Subscription::from_arc(current))
  }
}

fn subscribe_attempt<S, O>(shared: &Arc<RetryShared<S, O>>)
where
  S: Observable,
  O: Observer<S::Item, S::Err> + 'static,
{
  let subscription = shared
    .source
    .actual_subscribe(RetryObserver { shared: shared.clone() });
  shared.current.set(subscription);
}

struct RetryObserver<S: Observable, O> {
  shared: Arc<RetryShared<S, O>>,
}

impl<S, O> Observer<S::Item, S::Err> for RetryObserver<S, O>
where
  S: Observable,
  O: Observer<S::Item, S::Err> + 'static,
{
  fn on(&mut self, event: Event<S::Item, S::Err>) {
    match event {
      Event::Next(value) => self.shared.sink.on(Event::Next(value)),
      Event::Error(err) => {
        let retry = {
          let mut remaining = lock(&self.shared.remaining);
          let retry = *remaining > 0;
          if retry {
            *remaining -= 1;
          }
          retry
        };
        if !retry {
          self.shared.sink.on(Event::Error(err));
          return;
        }
        if self.shared.sink.is_disposed() || self.shared.current.is_disposed() {
          return;
        }
        debug!(remaining = *lock(&self.shared.remaining), "source failed, resubscribing");
        let shared = self.shared.clone();
        CurrentThreadScheduler.schedule(None, Box::new(move || subscribe_attempt(&shared)));
      }
      Event::Completed => self.shared.sink.on(Event::Completed),
    }
  }

  fn is_closed(&self) -> bool { self.shared.sink.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    observable::{create, throw_err, Emitter, ObservableExt},
    subject::Subject,
    test_util::{finishes_in_time, EventRecorder},
  };

  #[rxflow_macro::test]
  fn gives_up_after_count() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let c_attempts = attempts.clone();
    let source = create(move |emitter: Emitter<i32, &str>| {
      c_attempts.fetch_add(1, Ordering::SeqCst);
      emitter.next(0);
      emitter.error("boom");
    });

    let recorder = EventRecorder::new();
    source.retry(2).actual_subscribe(recorder.clone());

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(
      recorder.events(),
      vec![Event::Next(0), Event::Next(0), Event::Next(0), Event::Error("boom")]
    );
  }

  #[rxflow_macro::test]
  fn retry_zero_is_passthrough() {
    let recorder = EventRecorder::<i32, &str>::new();
    throw_err("boom").retry(0).actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Error("boom")]);
  }

  #[rxflow_macro::test]
  fn resubscribes_to_hot_source() {
    let subject = Subject::<i32, &str>::new();
    let recorder = EventRecorder::new();
    subject.clone().retry(1).actual_subscribe(recorder.clone());

    subject.next(1);
    subject.error("first");
    // A terminated subject replays its error to the new attempt.
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Error("first")]);
  }

  #[rxflow_macro::test]
  fn many_synchronous_failures_do_not_overflow() {
    let source = create(|emitter: Emitter<i32, ()>| emitter.error(()));
    let recorder = EventRecorder::new();
    source.retry(50_000).actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Error(())]);
  }

  #[rxflow_macro::test]
  fn source_pushed_from_downstream_callback() {
    let recorder = EventRecorder::<i32, &str>::new();
    let c_recorder = recorder.clone();
    finishes_in_time(move || {
      let subject = Subject::<i32, &str>::new();
      let c_subject = subject.clone();
      subject
        .clone()
        .retry(1)
        .tap(move |event| {
          if let Event::Next(1) = event {
            c_subject.next(2);
          }
        })
        .actual_subscribe(c_recorder);
      subject.next(1);
      subject.complete();
    });
    assert_eq!(recorder.events(), vec![Event::Next(1), Event::Next(2), Event::Completed]);
  }
}
