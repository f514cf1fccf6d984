use std::{
  marker::PhantomData,
  sync::{Arc, Mutex},
  time::Duration,
};

use crate::{
  disposable::Subscription,
  event::Event,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
  scheduler::{schedule_recursive, Scheduler},
  util::lock,
};

/// Emits `0, 1, 2, ...` every `period` on `scheduler`, forever.
///
/// ```
/// use rxflow::prelude::*;
///
/// let scheduler = TestScheduler::new();
/// let ticks = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
/// let c_ticks = ticks.clone();
/// observable::interval(Duration::from_secs(1), scheduler.clone())
///   .subscribe(move |i| c_ticks.lock().unwrap().push(i));
///
/// scheduler.advance_by(Duration::from_secs(3));
/// assert_eq!(*ticks.lock().unwrap(), vec![0, 1, 2]);
/// ```
pub fn interval<SD, Err>(period: Duration, scheduler: SD) -> Interval<SD, Err>
where
  SD: Scheduler + Clone + 'static,
{
  Interval { period, scheduler, _err: PhantomData }
}

/// Emits `0` after `delay` on `scheduler`, then completes.
pub fn timer<SD, Err>(delay: Duration, scheduler: SD) -> Timer<SD, Err>
where
  SD: Scheduler + 'static,
{
  Timer { delay, scheduler, _err: PhantomData }
}

#[derive(Clone)]
pub struct Interval<SD, Err> {
  period: Duration,
  scheduler: SD,
  _err: PhantomData<fn() -> Err>,
}

#[derive(Clone)]
pub struct Timer<SD, Err> {
  delay: Duration,
  scheduler: SD,
  _err: PhantomData<fn() -> Err>,
}

impl<SD, Err> Producer for Interval<SD, Err>
where
  SD: Scheduler + Clone + 'static,
  Err: Send + 'static,
{
  type Item = usize;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<usize, Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    let handle = sink.handle();
    let period = self.period;
    let mut tick = 0;
    let task = schedule_recursive(&self.scheduler, Some(period), move || {
      if sink.is_disposed() {
        return None;
      }
      sink.forward(Event::Next(tick));
      tick += 1;
      Some(period)
    });
    (handle, task)
  }
}

impl<SD, Err> Producer for Timer<SD, Err>
where
  SD: Scheduler + 'static,
  Err: Send + 'static,
{
  type Item = usize;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<usize, Err> + 'static,
  {
    let sink = Arc::new(Mutex::new(Sink::new(observer, cancel)));
    let handle = lock(&sink).handle();
    let task = self.scheduler.schedule(
      Some(self.delay),
      Box::new(move || {
        let mut sink = lock(&sink);
        sink.forward(Event::Next(0));
        sink.forward(Event::Completed);
        sink.dispose();
      }),
    );
    (handle, task)
  }
}
