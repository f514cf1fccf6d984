use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use crate::{
  disposable::{BinaryDisposable, Disposable, SerialDisposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
  scheduler::Scheduler,
  util::lock,
};

/// Re-emits every event on `scheduler`.
///
/// Events are queued and delivered by one drain task at a time, so they keep
/// their order even on a multi-threaded scheduler.
#[derive(Clone)]
pub struct ObserveOn<S, SD> {
  source: S,
  scheduler: SD,
}

impl<S, SD> ObserveOn<S, SD> {
  pub(crate) fn new(source: S, scheduler: SD) -> Self { ObserveOn { source, scheduler } }
}

struct Queue<Item, Err> {
  events: VecDeque<Event<Item, Err>>,
  draining: bool,
}

struct ObserveOnShared<O, SD, Item, Err> {
  scheduler: SD,
  queue: Mutex<Queue<Item, Err>>,
  sink: Mutex<Sink<O>>,
  drain_task: SerialDisposable,
}

impl<S, SD> Producer for ObserveOn<S, SD>
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
    let sink = Sink::new(observer, cancel);
    let handle = sink.handle();
    let shared = Arc::new(ObserveOnShared {
      scheduler: self.scheduler.clone(),
      queue: Mutex::new(Queue { events: VecDeque::new(), draining: false }),
      sink: Mutex::new(sink),
      drain_task: SerialDisposable::new(),
    });

    let drain_task = {
      let shared = shared.clone();
      Subscription::from_fn(move || shared.drain_task.dispose())
    };
    let source_subscription = self.source.actual_subscribe(ObserveOnObserver { shared });
    (handle, BinaryDisposable::new(source_subscription, drain_task).into())
  }
}

pub struct ObserveOnObserver<O, SD, Item, Err> {
  shared: Arc<ObserveOnShared<O, SD, Item, Err>>,
}

impl<O, SD, Item, Err> Observer<Item, Err> for ObserveOnObserver<O, SD, Item, Err>
where
  O: Observer<Item, Err> + 'static,
  SD: Scheduler + 'static,
  Item: Send + 'static,
  Err: Send + 'static,
{
  fn on(&mut self, event: Event<Item, Err>) {
    let start_drain = {
      let mut queue = lock(&self.shared.queue);
      queue.events.push_back(event);
      !std::mem::replace(&mut queue.draining, true)
    };
    if start_drain {
      let shared = self.shared.clone();
      let task = self.shared.scheduler.schedule(None, Box::new(move || drain(&shared)));
      self.shared.drain_task.set(task);
    }
  }

  /// A sink busy delivering counts as open.
  fn is_closed(&self) -> bool {
    self.shared.sink.try_lock().is_ok_and(|sink| sink.is_closed::<Item, Err>())
  }
}

fn drain<O, SD, Item, Err>(shared: &ObserveOnShared<O, SD, Item, Err>)
where
  O: Observer<Item, Err>,
{
  loop {
    let event = {
      let mut queue = lock(&shared.queue);
      match queue.events.pop_front() {
        Some(event) => event,
        None => {
          queue.draining = false;
          return;
        }
      }
    };
    let stop = event.is_stop_event();
    let mut sink = lock(&shared.sink);
    sink.forward(event);
    if stop {
      sink.dispose();
      return;
    }
  }
}
