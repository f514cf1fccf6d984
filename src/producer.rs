//! Producers: the operator-side half of [`Observable`].
//!
//! A [`Producer`] only knows how to `run`: wrap the downstream observer in
//! its sink and subscribe upstream. The blanket [`Observable`] impl below
//! supplies everything around it, the dispose coordinator and the trampoline,
//! so every operator gets the same teardown behavior for free.

use std::sync::Arc;

use crate::{
  disposable::Subscription, observable::Observable, observer::Observer,
  scheduler::CurrentThreadScheduler,
};

mod serialized;
mod sink;
mod sink_disposer;

pub(crate) use serialized::DeliveryQueue;
pub use serialized::SerializedSink;
pub use sink::Sink;
pub use sink_disposer::{SinkCancel, SinkDisposer};

/// An observable description that materializes one [`Sink`] per subscriber.
pub trait Producer: Send + Sync + 'static {
  type Item: Send + 'static;
  type Err: Send + 'static;

  /// Subscribes `observer`, returning `(sink handle, upstream subscription)`.
  ///
  /// The sink handle is normally [`Sink::handle`]; `cancel` must end up in
  /// the sink so a terminal event can release the whole edge.
  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Self::Item, Self::Err> + 'static;
}

impl<P: Producer> Observable for P {
  type Item = P::Item;
  type Err = P::Err;

  fn actual_subscribe<O>(&self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let disposer = Arc::new(SinkDisposer::new());
    let cancel = SinkCancel::new(disposer.clone());

    CurrentThreadScheduler::trampoline(|| {
      let (sink, subscription) = self.run(observer, cancel);
      disposer.set_sink_and_subscription(sink, subscription);
    });

    Subscription::from_arc(disposer)
  }
}
