use std::sync::Arc;

use crate::{
  disposable::{BinaryDisposable, Disposable, SerialDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  ops::start_with::PassThrough,
  producer::{Producer, Sink, SinkCancel},
  scheduler::Scheduler,
};

/// Performs the subscription to the source as a task on `scheduler`.
///
/// Events themselves are delivered on whatever thread the source emits them
/// on. Disposing before the task runs means the source is never subscribed.
pub struct SubscribeOn<S, SD> {
  source: Arc<S>,
  scheduler: SD,
}

impl<S, SD> SubscribeOn<S, SD> {
  pub(crate) fn new(source: S, scheduler: SD) -> Self {
    SubscribeOn { source: Arc::new(source), scheduler }
  }
}

impl<S, SD: Clone> Clone for SubscribeOn<S, SD> {
  fn clone(&self) -> Self {
    SubscribeOn { source: self.source.clone(), scheduler: self.scheduler.clone() }
  }
}

impl<S, SD> Producer for SubscribeOn<S, SD>
where
  S: Observable,
  SD: Scheduler + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = Sink::new(observer, cancel);
    let handle = sink.handle();
    let source_subscription = Arc::new(SerialDisposable::new());

    let source = self.source.clone();
    let c_source_subscription = source_subscription.clone();
    let task = self.scheduler.schedule(
      None,
      Box::new(move || {
        if !c_source_subscription.is_disposed() {
          c_source_subscription.set(source.actual_subscribe(PassThrough::new(sink)));
        }
      }),
    );

    let upstream = BinaryDisposable::new(task, Subscription::from_arc(source_subscription));
    (handle, upstream.into())
  }
}
