use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use crate::{
  event::Event,
  observer::{BoxedObserver, Observer},
  producer::DeliveryQueue,
  util::lock,
};

/// One registered observer, shared between a registry and whichever thread
/// is delivering to it.
///
/// Deliveries never overlap. An event sent while another is being delivered,
/// including one sent from inside the observer's own callback, waits in the
/// queue and is delivered right after it.
pub(crate) struct SerializedObserver<Item, Err> {
  observer: Mutex<BoxedObserver<Item, Err>>,
  queue: DeliveryQueue<Item, Err>,
}

pub(crate) type SharedObserver<Item, Err> = Arc<SerializedObserver<Item, Err>>;

pub(crate) fn shared_observer<Item, Err, O>(observer: O) -> SharedObserver<Item, Err>
where
  O: Observer<Item, Err> + 'static,
{
  let observer: BoxedObserver<Item, Err> = Box::new(observer);
  Arc::new(SerializedObserver { observer: Mutex::new(observer), queue: DeliveryQueue::new() })
}

impl<Item, Err> SerializedObserver<Item, Err> {
  pub(crate) fn on(&self, event: Event<Item, Err>) {
    if self.queue.enqueue(event) {
      self.drain();
    }
  }

  /// An observer busy receiving an event counts as open.
  pub(crate) fn is_closed(&self) -> bool {
    self.observer.try_lock().is_ok_and(|observer| Observer::<Item, Err>::is_closed(&*observer))
  }

  /// Delivers through the returned guard first. Everything sent meanwhile
  /// is held back until the guard drops.
  pub(crate) fn hold(&self) -> HeldDelivery<'_, Item, Err> {
    HeldDelivery { observer: self, claimed: self.queue.claim() }
  }

  fn drain(&self) {
    while let Some(event) = self.queue.pop() {
      lock(&self.observer).on(event);
    }
  }
}

pub(crate) struct HeldDelivery<'a, Item, Err> {
  observer: &'a SerializedObserver<Item, Err>,
  claimed: bool,
}

impl<Item, Err> HeldDelivery<'_, Item, Err> {
  pub(crate) fn on(&mut self, event: Event<Item, Err>) {
    if self.claimed {
      lock(&self.observer.observer).on(event);
    } else {
      self.observer.on(event);
    }
  }
}

impl<Item, Err> Drop for HeldDelivery<'_, Item, Err> {
  fn drop(&mut self) {
    if self.claimed {
      self.observer.drain();
    }
  }
}

/// Observers of a multicast source, keyed by subscription id.
///
/// - **SmallVec Optimization**: one or two subscribers live inline.
/// - **Snapshot delivery**: callers copy the observer list out under their
///   lock and deliver with [`broadcast`] after releasing it, so an observer
///   may subscribe or unsubscribe from inside its own callback.
pub(crate) struct Subscribers<Item, Err> {
  next_id: usize,
  observers: SmallVec<[(usize, SharedObserver<Item, Err>); 2]>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Subscribers { next_id: 0, observers: SmallVec::new() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  /// Add an observer and return its unique ID.
  pub(crate) fn add(&mut self, observer: SharedObserver<Item, Err>) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.observers.push((id, observer));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<SharedObserver<Item, Err>> {
    let index = self.observers.iter().position(|(key, _)| *key == id)?;
    Some(self.observers.remove(index).1)
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool { self.observers.is_empty() }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.observers.len() }

  pub(crate) fn snapshot(&self) -> SmallVec<[SharedObserver<Item, Err>; 2]> {
    self.observers.iter().map(|(_, o)| o.clone()).collect()
  }

  /// Empties the registry, returning everyone that was in it.
  pub(crate) fn take_all(&mut self) -> SmallVec<[SharedObserver<Item, Err>; 2]> {
    std::mem::take(&mut self.observers)
      .into_iter()
      .map(|(_, o)| o)
      .collect()
  }
}

/// Delivers `event` to every observer, cloning it for all but the last one.
pub(crate) fn broadcast<Item, Err>(
  observers: impl IntoIterator<Item = SharedObserver<Item, Err>>, event: Event<Item, Err>,
) where
  Item: Clone,
  Err: Clone,
{
  let mut iter = observers.into_iter().peekable();
  while let Some(observer) = iter.next() {
    if iter.peek().is_some() {
      observer.on(event.clone());
    } else {
      observer.on(event);
      break;
    }
  }
}
