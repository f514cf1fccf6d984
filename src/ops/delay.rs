use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use crate::{
  disposable::{BinaryDisposable, Disposable, SerialDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, SerializedSink, Sink, SinkCancel},
  scheduler::Scheduler,
  util::lock,
};

/// Shifts every value and the completion forward in time by `delay`.
///
/// Relative spacing between values is kept. An error is not delayed: it
/// drops whatever is still queued and terminates at once.
///
/// ```
/// use rxflow::prelude::*;
///
/// let scheduler = TestScheduler::new();
/// observable::of(1)
///   .delay(Duration::from_secs(1), scheduler.clone())
///   .subscribe(|v| println!("{v}"));
///
/// scheduler.advance_by(Duration::from_secs(1));
/// // print: 1
/// ```
#[derive(Clone)]
pub struct Delay<S, SD> {
  source: S,
  delay: Duration,
  scheduler: SD,
}

impl<S, SD> Delay<S, SD> {
  pub(crate) fn new(source: S, delay: Duration, scheduler: SD) -> Self {
    Delay { source, delay, scheduler }
  }
}

struct DelayQueue<Item, Err> {
  events: VecDeque<(Instant, Event<Item, Err>)>,
  active: bool,
}

struct DelayShared<O, SD, Item, Err> {
  scheduler: SD,
  delay: Duration,
  sink: SerializedSink<O, Item, Err>,
  queue: Mutex<DelayQueue<Item, Err>>,
  task: SerialDisposable,
}

impl<S, SD> Producer for Delay<S, SD>
where
  S: Observable,
  SD: Scheduler + Clone + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = SerializedSink::new(Sink::new(observer, cancel));
    let handle = sink.handle();
    let shared = Arc::new(DelayShared {
      scheduler: self.scheduler.clone(),
      delay: self.delay,
      sink,
      queue: Mutex::new(DelayQueue { events: VecDeque::new(), active: false }),
      task: SerialDisposable::new(),
    });

    let task = {
      let shared = shared.clone();
      Subscription::from_fn(move || shared.task.dispose())
    };
    let source_subscription = self.source.actual_subscribe(DelayObserver { shared });
    (handle, BinaryDisposable::new(source_subscription, task).into())
  }
}

pub struct DelayObserver<O, SD, Item, Err> {
  shared: Arc<DelayShared<O, SD, Item, Err>>,
}

impl<O, SD, Item, Err> Observer<Item, Err> for DelayObserver<O, SD, Item, Err>
where
  O: Observer<Item, Err> + 'static,
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn on(&mut self, event: Event<Item, Err>) {
    let shared = &self.shared;
    if let Event::Error(_) = event {
      lock(&shared.queue).events.clear();
      shared.task.dispose();
      shared.sink.on(event);
      return;
    }

    let due = shared.scheduler.now() + shared.delay;
    let start = {
      let mut queue = lock(&shared.queue);
      queue.events.push_back((due, event));
      !std::mem::replace(&mut queue.active, true)
    };
    if start {
      schedule_drain(shared, shared.delay);
    }
  }

  fn is_closed(&self) -> bool { self.shared.sink.is_closed() }
}

fn schedule_drain<O, SD, Item, Err>(shared: &Arc<DelayShared<O, SD, Item, Err>>, after: Duration)
where
  O: Observer<Item, Err> + 'static,
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  let c_shared = shared.clone();
  let task = shared.scheduler.schedule(Some(after), Box::new(move || drain(&c_shared)));
  shared.task.set(task);
}

fn drain<O, SD, Item, Err>(shared: &Arc<DelayShared<O, SD, Item, Err>>)
where
  O: Observer<Item, Err> + 'static,
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  loop {
    let now = shared.scheduler.now();
    let event = {
      let mut queue = lock(&shared.queue);
      match queue.events.front().map(|(due, _)| *due) {
        None => {
          queue.active = false;
          return;
        }
        Some(due) if due > now => {
          drop(queue);
          schedule_drain(shared, due - now);
          return;
        }
        Some(_) => match queue.events.pop_front() {
          Some((_, event)) => event,
          None => return,
        },
      }
    };

    let stop = event.is_stop_event();
    shared.sink.on(event);
    if stop {
      return;
    }
  }
}
