use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
  disposable::{BinaryDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
  util::lock,
};

/// Emits `combiner(a, b)` with the latest value of each side whenever either
/// side emits, once both sides have emitted at least once.
///
/// Completes when both sides have completed, or as soon as one side
/// completes without ever having emitted.
pub struct CombineLatest<A, B, F> {
  a: A,
  b: B,
  combiner: Arc<F>,
}

impl<A, B, F> CombineLatest<A, B, F> {
  pub(crate) fn new(a: A, b: B, combiner: F) -> Self {
    CombineLatest { a, b, combiner: Arc::new(combiner) }
  }
}

struct Latest<VA, VB> {
  a: Option<VA>,
  b: Option<VB>,
  a_done: bool,
  b_done: bool,
}

/// The latest values are only locked while they are read or replaced. The
/// combiner and the downstream run outside that lock.
struct CombineShared<O, VA, VB, F, U, Err> {
  sink: SerializedSink<O, U, Err>,
  latest: Mutex<Latest<VA, VB>>,
  combiner: Arc<F>,
}

impl<O, VA, VB, F, U, Err> CombineShared<O, VA, VB, F, U, Err>
where
  O: Observer<U, Err>,
  VA: Clone,
  VB: Clone,
  F: Fn(VA, VB) -> U,
  U: Send,
  Err: Send,
{
  fn emit(&self, latest: MutexGuard<'_, Latest<VA, VB>>) {
    let pair = match (&latest.a, &latest.b) {
      (Some(a), Some(b)) => Some((a.clone(), b.clone())),
      _ => None,
    };
    drop(latest);
    if let Some((a, b)) = pair {
      self.sink.on(Event::Next((self.combiner)(a, b)));
    }
  }

  fn side_completed(&self, has_value: bool, other_done: bool) {
    if !has_value || other_done {
      self.sink.on(Event::Completed);
    }
  }
}

impl<A, B, F, U> Producer for CombineLatest<A, B, F>
where
  A: Observable,
  B: Observable<Err = A::Err>,
  A::Item: Clone,
  B::Item: Clone,
  F: Fn(A::Item, B::Item) -> U + Send + Sync + 'static,
  U: Send + 'static,
{
  type Item = U;
  type Err = A::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<U, A::Err> + 'static,
  {
    let shared = Arc::new(CombineShared {
      sink: SerializedSink::new(Sink::new(observer, cancel)),
      latest: Mutex::new(Latest { a: None, b: None, a_done: false, b_done: false }),
      combiner: self.combiner.clone(),
    });
    let handle = shared.sink.handle();

    let a = self.a.actual_subscribe(LeftObserver(shared.clone()));
    let b = self.b.actual_subscribe(RightObserver(shared));
    (handle, BinaryDisposable::new(a, b).into())
  }
}

struct LeftObserver<O, VA, VB, F, U, Err>(Arc<CombineShared<O, VA, VB, F, U, Err>>);

struct RightObserver<O, VA, VB, F, U, Err>(Arc<CombineShared<O, VA, VB, F, U, Err>>);

impl<O, VA, VB, F, U, Err> Observer<VA, Err> for LeftObserver<O, VA, VB, F, U, Err>
where
  O: Observer<U, Err>,
  VA: Clone + Send,
  VB: Clone + Send,
  F: Fn(VA, VB) -> U + Send + Sync,
  U: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<VA, Err>) {
    let shared = &self.0;
    match event {
      Event::Next(value) => {
        let mut latest = lock(&shared.latest);
        latest.a = Some(value);
        shared.emit(latest);
      }
      Event::Error(err) => shared.sink.on(Event::Error(err)),
      Event::Completed => {
        let (has_value, other_done) = {
          let mut latest = lock(&shared.latest);
          latest.a_done = true;
          (latest.a.is_some(), latest.b_done)
        };
        shared.side_completed(has_value, other_done);
      }
    }
  }

  fn is_closed(&self) -> bool { self.0.sink.is_closed() }
}

impl<O, VA, VB, F, U, Err> Observer<VB, Err> for RightObserver<O, VA, VB, F, U, Err>
where
  O: Observer<U, Err>,
  VA: Clone + Send,
  VB: Clone + Send,
  F: Fn(VA, VB) -> U + Send + Sync,
  U: Send,
  Err: Send,
{
  fn on(&mut self, event: Event<VB, Err>) {
    let shared = &self.0;
    match event {
      Event::Next(value) => {
        let mut latest = lock(&shared.latest);
        latest.b = Some(value);
        shared.emit(latest);
      }
      Event::Error(err) => shared.sink.on(Event::Error(err)),
      Event::Completed => {
        let (has_value, other_done) = {
          let mut latest = lock(&shared.latest);
          latest.b_done = true;
          (latest.b.is_some(), latest.a_done)
        };
        shared.side_completed(has_value, other_done);
      }
    }
  }

  fn is_closed(&self) -> bool { self.0.sink.is_closed() }
}
