//! Multicasting with an optional replay buffer.
//!
//! Every subscriber of a [`Share`] attaches to one *connection*: a registry of
//! observers fed by a single upstream subscription. The connection subscribes
//! upstream when its first observer arrives and keeps the latest `replay`
//! values for observers that join later.
//!
//! [`SubjectLifetimeScope`] decides what happens once the connection ends:
//!
//! - `WhileConnected`: when upstream terminates or the last observer leaves,
//!   the connection is dropped and the next subscriber starts fresh.
//! - `Forever`: when upstream terminates, later subscribers get the buffer
//!   and the terminal event. When the last observer leaves, upstream is
//!   released but the buffer is kept, and the next subscriber reconnects.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex, Weak},
};

use tracing::{debug, trace};

use crate::{
  disposable::{Disposable, Subscription},
  event::Event,
  observable::Observable,
  observer::Observer,
  subject::subscribers::{broadcast, shared_observer, Subscribers},
  util::lock,
};

/// How long the connection behind a [`Share`] lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubjectLifetimeScope {
  /// Dropped when the source terminates or the last observer unsubscribes.
  #[default]
  WhileConnected,
  /// Kept for the lifetime of the `Share`, terminal event included.
  Forever,
}

struct Slot<Item, Err> {
  connection: Option<Arc<Connection<Item, Err>>>,
  generation: u64,
}

/// See the [module documentation](self). Clones share the same connection.
pub struct Share<S: Observable> {
  source: Arc<S>,
  replay: usize,
  scope: SubjectLifetimeScope,
  slot: Arc<Mutex<Slot<S::Item, S::Err>>>,
}

impl<S: Observable> Share<S> {
  pub(crate) fn new(source: S, replay: usize, scope: SubjectLifetimeScope) -> Self {
    Share {
      source: Arc::new(source),
      replay,
      scope,
      slot: Arc::new(Mutex::new(Slot { connection: None, generation: 0 })),
    }
  }

  fn connection(&self) -> Arc<Connection<S::Item, S::Err>> {
    let mut slot = lock(&self.slot);
    if let Some(connection) = &slot.connection {
      return connection.clone();
    }
    slot.generation += 1;
    let connection = Arc::new(Connection {
      generation: slot.generation,
      slot: Arc::downgrade(&self.slot),
      scope: self.scope,
      replay: self.replay,
      state: Mutex::new(ConnState {
        observers: Subscribers::default(),
        buffer: VecDeque::with_capacity(self.replay),
        terminal: None,
        upstream: None,
        connected: false,
        closed: false,
        epoch: 0,
      }),
    });
    slot.connection = Some(connection.clone());
    connection
  }
}

impl<S: Observable> Clone for Share<S> {
  fn clone(&self) -> Self {
    Share {
      source: self.source.clone(),
      replay: self.replay,
      scope: self.scope,
      slot: self.slot.clone(),
    }
  }
}

enum Registration<Item, Err> {
  Live {
    connection: Arc<Connection<Item, Err>>,
    id: usize,
    replay: Vec<Item>,
    connect_epoch: Option<u64>,
  },
  Finished {
    replay: Vec<Item>,
    terminal: Event<Item, Err>,
  },
}

impl<S> Observable for Share<S>
where
  S: Observable,
  S::Item: Clone,
  S::Err: Clone,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(&self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let observer = shared_observer(observer);
    // Held through registration and replay: a live broadcast that already
    // sees this observer is queued behind the replayed values.
    let mut delivery = observer.hold();

    let registration = loop {
      let connection = self.connection();
      let mut state = lock(&connection.state);
      if state.closed {
        drop(state);
        connection.detach();
        continue;
      }

      let replay: Vec<_> = state.buffer.iter().cloned().collect();
      if let Some(terminal) = state.terminal.clone() {
        break Registration::Finished { replay, terminal };
      }

      let id = state.observers.add(observer.clone());
      let connect_epoch = (!state.connected).then(|| {
        state.connected = true;
        state.epoch += 1;
        state.epoch
      });
      trace!(
        generation = connection.generation,
        id,
        observers = state.observers.len(),
        "share observer registered"
      );
      drop(state);
      break Registration::Live { connection, id, replay, connect_epoch };
    };

    match registration {
      Registration::Finished { replay, terminal } => {
        for value in replay {
          delivery.on(Event::Next(value));
        }
        delivery.on(terminal);
        Subscription::empty()
      }
      Registration::Live { connection, id, replay, connect_epoch } => {
        for value in replay {
          delivery.on(Event::Next(value));
        }
        drop(delivery);

        if let Some(epoch) = connect_epoch {
          connection.connect(&*self.source, epoch);
        }
        let connection = Arc::downgrade(&connection);
        Subscription::from_fn(move || {
          if let Some(connection) = connection.upgrade() {
            connection.remove(id);
          }
        })
      }
    }
  }
}

// ==================== Connection ====================

struct ConnState<Item, Err> {
  observers: Subscribers<Item, Err>,
  buffer: VecDeque<Item>,
  terminal: Option<Event<Item, Err>>,
  upstream: Option<Subscription>,
  connected: bool,
  /// A `WhileConnected` connection that must not take new observers.
  closed: bool,
  /// Bumped on every connect; events from an older upstream are ignored.
  epoch: u64,
}

struct Connection<Item, Err> {
  generation: u64,
  slot: Weak<Mutex<Slot<Item, Err>>>,
  scope: SubjectLifetimeScope,
  replay: usize,
  state: Mutex<ConnState<Item, Err>>,
}

impl<Item, Err> Connection<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn connect<S>(self: &Arc<Self>, source: &S, epoch: u64)
  where
    S: Observable<Item = Item, Err = Err>,
  {
    debug!(generation = self.generation, epoch, "share connection connecting upstream");
    let subscription =
      source.actual_subscribe(ConnectionObserver { connection: self.clone(), epoch });

    let mut state = lock(&self.state);
    if state.epoch == epoch && state.connected && state.terminal.is_none() {
      state.upstream = Some(subscription);
    } else {
      drop(state);
      subscription.dispose();
    }
  }

  fn remove(&self, id: usize) {
    let (removed, upstream) = {
      let mut state = lock(&self.state);
      let removed = state.observers.remove(id);
      if removed.is_none() || !state.observers.is_empty() || state.terminal.is_some() {
        return;
      }
      state.connected = false;
      if self.scope == SubjectLifetimeScope::WhileConnected {
        state.closed = true;
      }
      (removed, state.upstream.take())
    };
    drop(removed);

    debug!(generation = self.generation, "share connection disconnected");
    if let Some(upstream) = upstream {
      upstream.dispose();
    }
    if self.scope == SubjectLifetimeScope::WhileConnected {
      self.detach();
    }
  }

  fn next(&self, epoch: u64, value: Item) {
    let observers = {
      let mut state = lock(&self.state);
      if !state.accepts(epoch) {
        return;
      }
      if self.replay > 0 {
        if state.buffer.len() == self.replay {
          state.buffer.pop_front();
        }
        state.buffer.push_back(value.clone());
      }
      state.observers.snapshot()
    };
    broadcast(observers, Event::Next(value));
  }

  fn terminate(&self, epoch: u64, event: Event<Item, Err>) {
    let (observers, upstream) = {
      let mut state = lock(&self.state);
      if !state.accepts(epoch) {
        return;
      }
      state.terminal = Some(event.clone());
      if self.scope == SubjectLifetimeScope::WhileConnected {
        state.closed = true;
      }
      (state.observers.take_all(), state.upstream.take())
    };

    debug!(
      generation = self.generation,
      error = !matches!(event, Event::Completed),
      "share connection terminated"
    );
    broadcast(observers, event);
    if let Some(upstream) = upstream {
      upstream.dispose();
    }
    if self.scope == SubjectLifetimeScope::WhileConnected {
      self.detach();
    }
  }
}

impl<Item, Err> Connection<Item, Err> {
  /// Clears the parent's slot if it still points at this connection.
  fn detach(&self) {
    let Some(slot) = self.slot.upgrade() else { return };
    let detached = {
      let mut slot = lock(&slot);
      if slot
        .connection
        .as_ref()
        .is_some_and(|c| c.generation == self.generation)
      {
        slot.connection.take()
      } else {
        None
      }
    };
    drop(detached);
  }
}

impl<Item, Err> ConnState<Item, Err> {
  fn accepts(&self, epoch: u64) -> bool {
    self.epoch == epoch && self.connected && self.terminal.is_none()
  }
}

/// The single observer a connection subscribes upstream with.
struct ConnectionObserver<Item, Err> {
  connection: Arc<Connection<Item, Err>>,
  epoch: u64,
}

impl<Item, Err> Observer<Item, Err> for ConnectionObserver<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => self.connection.next(self.epoch, value),
      terminal => self.connection.terminate(self.epoch, terminal),
    }
  }

  /// Closed once this upstream is stale or every registered observer is.
  ///
  /// An observer busy receiving an event counts as open.
  fn is_closed(&self) -> bool {
    let observers = {
      let state = lock(&self.connection.state);
      if !state.accepts(self.epoch) {
        return true;
      }
      state.observers.snapshot()
    };
    !observers.is_empty() && observers.iter().all(|o| o.is_closed())
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
    observable::{create, defer, from_iter, Emitter, ObservableExt},
    subject::Subject,
    test_util::EventRecorder,
  };

  /// A subject-backed source that counts its upstream subscriptions.
  fn counted(
    subject: &Subject<i32, &'static str>,
  ) -> (impl Observable<Item = i32, Err = &'static str>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let (c_count, subject) = (count.clone(), subject.clone());
    let source = defer(move || {
      c_count.fetch_add(1, Ordering::SeqCst);
      subject.clone()
    });
    (source, count)
  }

  #[rxflow_macro::test]
  fn one_upstream_for_many_subscribers() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share();
    let (a, b) = (EventRecorder::new(), EventRecorder::new());

    shared.actual_subscribe(a.clone());
    shared.actual_subscribe(b.clone());
    subject.next(1);
    subject.complete();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(subject.observer_count(), 0);
    assert_eq!(a.events(), vec![Event::Next(1), Event::Completed]);
    assert_eq!(b.events(), vec![Event::Next(1), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn replay_one_late_subscriber_gets_latest_first() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share_replay(1);
    let (a, b) = (EventRecorder::new(), EventRecorder::new());

    shared.actual_subscribe(a.clone());
    subject.next(1);
    subject.next(2);
    shared.actual_subscribe(b.clone());
    subject.next(3);

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(a.values(), vec![1, 2, 3]);
    assert_eq!(b.values(), vec![2, 3]);
  }

  #[rxflow_macro::test]
  fn replay_keeps_the_last_n() {
    let shared = from_iter::<_, ()>(1..=5).share_with(3, SubjectLifetimeScope::Forever);
    shared.actual_subscribe(EventRecorder::new());

    let late = EventRecorder::new();
    shared.actual_subscribe(late.clone());
    assert_eq!(
      late.events(),
      vec![Event::Next(3), Event::Next(4), Event::Next(5), Event::Completed]
    );
  }

  #[rxflow_macro::test]
  fn synchronous_source_reaches_first_subscriber() {
    let recorder = EventRecorder::<i32, ()>::new();
    from_iter(vec![1, 2, 3])
      .share()
      .actual_subscribe(recorder.clone());
    assert_eq!(
      recorder.events(),
      vec![Event::Next(1), Event::Next(2), Event::Next(3), Event::Completed]
    );
  }

  #[rxflow_macro::test]
  fn last_unsubscribe_disposes_upstream() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share();

    let a = shared.actual_subscribe(EventRecorder::new());
    let b = shared.actual_subscribe(EventRecorder::new());
    assert_eq!(subject.observer_count(), 1);

    a.dispose();
    assert_eq!(subject.observer_count(), 1);
    b.dispose();
    assert_eq!(subject.observer_count(), 0);

    shared.actual_subscribe(EventRecorder::new());
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(subject.observer_count(), 1);
  }

  #[rxflow_macro::test]
  fn while_connected_starts_fresh_after_termination() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share_replay(1);

    shared.actual_subscribe(EventRecorder::new());
    subject.next(1);
    subject.complete();

    // The subject is terminated, so the fresh connection gets its terminal
    // event straight from upstream; nothing is replayed from before.
    let late = EventRecorder::new();
    shared.actual_subscribe(late.clone());
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(late.events(), vec![Event::Completed]);
  }

  #[rxflow_macro::test]
  fn forever_replays_terminal_without_resubscribing() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share_with(1, SubjectLifetimeScope::Forever);

    shared.actual_subscribe(EventRecorder::new());
    subject.next(7);
    subject.error("boom");

    let late = EventRecorder::new();
    let subscription = shared.actual_subscribe(late.clone());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(late.events(), vec![Event::Next(7), Event::Error("boom")]);
    assert!(subscription.is_disposed());
  }

  #[rxflow_macro::test]
  fn forever_keeps_buffer_across_reconnects() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share_with(1, SubjectLifetimeScope::Forever);

    let first = shared.actual_subscribe(EventRecorder::new());
    subject.next(1);
    first.dispose();
    assert_eq!(subject.observer_count(), 0);

    let again = EventRecorder::new();
    shared.actual_subscribe(again.clone());
    subject.next(2);
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(again.values(), vec![1, 2]);
  }

  #[rxflow_macro::test]
  fn take_on_shared_synchronous_source_stops_upstream() {
    let emitted = Arc::new(AtomicUsize::new(0));
    let c_emitted = emitted.clone();
    let source = create(move |emitter: Emitter<usize, ()>| {
      for i in 0..100 {
        if emitter.is_closed() {
          break;
        }
        c_emitted.fetch_add(1, Ordering::SeqCst);
        emitter.next(i);
      }
      emitter.complete();
    });

    let recorder = EventRecorder::new();
    source.share().take(2).actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Next(0), Event::Next(1), Event::Completed]);
    assert_eq!(emitted.load(Ordering::SeqCst), 2);
  }

  #[rxflow_macro::test]
  fn concurrent_subscribers_share_one_connection() {
    let subject = Subject::new();
    let (source, count) = counted(&subject);
    let shared = source.share_replay(1);

    let recorders: Vec<_> = (0..8).map(|_| EventRecorder::new()).collect();
    let handles: Vec<_> = recorders
      .iter()
      .map(|recorder| {
        let (shared, recorder) = (shared.clone(), recorder.clone());
        thread::spawn(move || shared.actual_subscribe(recorder))
      })
      .collect();
    let subscriptions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    subject.next(1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(recorders.iter().all(|r| r.values() == vec![1]));

    subscriptions.iter().for_each(Disposable::dispose);
    assert_eq!(subject.observer_count(), 0);
  }
}
