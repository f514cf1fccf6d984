//! Helpers shared by the unit tests.

use std::{
  sync::{mpsc, Arc, Mutex},
  thread,
  time::Duration,
};

use crate::{event::Event, observer::Observer};

/// Observer that appends every event it receives to a shared log.
pub(crate) struct EventRecorder<Item, Err> {
  log: Arc<Mutex<Vec<Event<Item, Err>>>>,
}

impl<Item, Err> Clone for EventRecorder<Item, Err> {
  fn clone(&self) -> Self { EventRecorder { log: self.log.clone() } }
}

impl<Item, Err> EventRecorder<Item, Err> {
  pub(crate) fn new() -> Self { EventRecorder { log: Arc::default() } }

  pub(crate) fn events(&self) -> Vec<Event<Item, Err>>
  where
    Item: Clone,
    Err: Clone,
  {
    self.log.lock().unwrap().clone()
  }

  pub(crate) fn values(&self) -> Vec<Item>
  where
    Item: Clone,
  {
    self
      .log
      .lock()
      .unwrap()
      .iter()
      .filter_map(|e| match e {
        Event::Next(v) => Some(v.clone()),
        _ => None,
      })
      .collect()
  }
}

impl<Item: Send, Err: Send> Observer<Item, Err> for EventRecorder<Item, Err> {
  fn on(&mut self, event: Event<Item, Err>) { self.log.lock().unwrap().push(event); }
}

/// Runs `f` on a worker thread and fails unless it returns within three
/// seconds. A lock taken twice on one thread shows up as a timeout here.
pub(crate) fn finishes_in_time(f: impl FnOnce() + Send + 'static) {
  let (tx, rx) = mpsc::channel();
  thread::spawn(move || {
    f();
    let _ = tx.send(());
  });
  match rx.recv_timeout(Duration::from_secs(3)) {
    Ok(()) => {}
    Err(mpsc::RecvTimeoutError::Timeout) => panic!("pipeline did not finish, likely deadlocked"),
    Err(mpsc::RecvTimeoutError::Disconnected) => panic!("pipeline panicked"),
  }
}
