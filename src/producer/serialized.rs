use std::{collections::VecDeque, sync::Mutex};

use super::{Sink, SinkCancel};
use crate::{
  disposable::{Disposable, Subscription},
  event::Event,
  observer::Observer,
  util::lock,
};

struct Pending<Item, Err> {
  events: VecDeque<Event<Item, Err>>,
  delivering: bool,
}

/// Events waiting for whichever caller is currently delivering.
///
/// A caller that gets `true` from [`enqueue`](Self::enqueue) or
/// [`claim`](Self::claim) owns delivery and must [`pop`](Self::pop) until it
/// returns `None`. Everyone else just leaves their event in the queue.
pub(crate) struct DeliveryQueue<Item, Err>(Mutex<Pending<Item, Err>>);

impl<Item, Err> DeliveryQueue<Item, Err> {
  pub(crate) fn new() -> Self {
    DeliveryQueue(Mutex::new(Pending { events: VecDeque::new(), delivering: false }))
  }

  pub(crate) fn enqueue(&self, event: Event<Item, Err>) -> bool {
    let mut pending = lock(&self.0);
    pending.events.push_back(event);
    !std::mem::replace(&mut pending.delivering, true)
  }

  /// Takes over delivery without queuing anything.
  pub(crate) fn claim(&self) -> bool { !std::mem::replace(&mut lock(&self.0).delivering, true) }

  /// The next event to deliver. `None` hands delivery back.
  pub(crate) fn pop(&self) -> Option<Event<Item, Err>> {
    let mut pending = lock(&self.0);
    let event = pending.events.pop_front();
    if event.is_none() {
      pending.delivering = false;
    }
    event
  }

  pub(crate) fn clear(&self) { lock(&self.0).events.clear(); }
}

/// A [`Sink`] fed from several sources, or from a source that can be
/// re-entered by its own downstream.
///
/// Only one caller delivers at a time. An event arriving while delivery is
/// in progress, from another thread or from inside the downstream callback
/// itself, is queued and delivered by the caller already draining, so no
/// lock is ever taken twice on one thread. Disposal and the closed check
/// never wait for a delivery to finish.
pub struct SerializedSink<O, Item, Err> {
  sink: Mutex<Sink<O>>,
  queue: DeliveryQueue<Item, Err>,
  flag: Subscription,
  cancel: SinkCancel,
}

impl<O, Item, Err> SerializedSink<O, Item, Err> {
  pub fn new(sink: Sink<O>) -> Self {
    SerializedSink {
      flag: sink.handle(),
      cancel: sink.cancel().clone(),
      sink: Mutex::new(sink),
      queue: DeliveryQueue::new(),
    }
  }

  /// See [`Sink::handle`].
  pub fn handle(&self) -> Subscription { self.flag.clone() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.flag.is_disposed() }

  /// Marks the sink disposed and cancels its subscription edge.
  pub fn dispose(&self) {
    if !self.flag.is_disposed() {
      self.flag.dispose();
      self.cancel.dispose();
    }
  }
}

impl<O, Item, Err> SerializedSink<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  /// Delivers `event`, or queues it behind the delivery in progress. A
  /// terminal event disposes the sink once delivered.
  pub fn on(&self, event: Event<Item, Err>) {
    if self.is_disposed() || !self.queue.enqueue(event) {
      return;
    }
    while let Some(event) = self.queue.pop() {
      let stop = event.is_stop_event();
      lock(&self.sink).forward(event);
      if stop {
        self.dispose();
        self.queue.clear();
      }
    }
  }

  /// Closed once disposed, or when the observer says so. An observer busy
  /// receiving an event counts as open.
  pub fn is_closed(&self) -> bool {
    self.is_disposed() || self.sink.try_lock().is_ok_and(|sink| sink.is_closed::<Item, Err>())
  }
}
