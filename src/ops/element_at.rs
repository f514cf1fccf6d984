use crate::{
  disposable::Subscription,
  error::RxError,
  event::Event,
  observable::Observable,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Emits the single value at `index` (zero-based), then completes.
#[derive(Clone)]
pub struct ElementAt<S> {
  source: S,
  index: usize,
  throw_on_empty: bool,
}

impl<S> ElementAt<S> {
  pub(crate) fn new(source: S, index: usize, throw_on_empty: bool) -> Self {
    ElementAt { source, index, throw_on_empty }
  }
}

impl<S> Producer for ElementAt<S>
where
  S: Observable,
  S::Err: From<RxError>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let sink = ElementAtSink {
      sink: Sink::new(observer, cancel),
      index: self.index,
      remaining: self.index,
      throw_on_empty: self.throw_on_empty,
    };
    let handle = sink.sink.handle();
    (handle, self.source.actual_subscribe(sink))
  }
}

pub struct ElementAtSink<O> {
  sink: Sink<O>,
  index: usize,
  remaining: usize,
  throw_on_empty: bool,
}

impl<O, Item, Err> Observer<Item, Err> for ElementAtSink<O>
where
  O: Observer<Item, Err>,
  Err: From<RxError>,
{
  fn on(&mut self, event: Event<Item, Err>) {
    match event {
      Event::Next(value) => {
        if self.remaining > 0 {
          self.remaining -= 1;
          return;
        }
        self.sink.forward(Event::Next(value));
        self.sink.forward(Event::Completed);
        self.sink.dispose();
      }
      Event::Error(err) => {
        self.sink.forward(Event::Error(err));
        self.sink.dispose();
      }
      Event::Completed => {
        if self.throw_on_empty {
          let err: Err = RxError::ArgumentOutOfRange { index: self.index }.into();
          self.sink.forward(Event::<Item, Err>::Error(err));
        } else {
          self.sink.forward(Event::Completed);
        }
        self.sink.dispose();
      }
    }
  }

  fn is_closed(&self) -> bool { self.sink.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    observable::{from_iter, ObservableExt},
    test_util::EventRecorder,
  };

  #[rxflow_macro::test]
  fn emits_element_at_index() {
    let recorder = EventRecorder::<i32, RxError>::new();
    from_iter(vec![10, 20, 30])
      .element_at(1, true)
      .actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Next(20), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn out_of_range_errors_when_asked() {
    let recorder = EventRecorder::<i32, RxError>::new();
    from_iter(vec![10, 20])
      .element_at(2, true)
      .actual_subscribe(recorder.clone());
    assert_eq!(
      recorder.events(),
      vec![Event::Error(RxError::ArgumentOutOfRange { index: 2 })]
    );
  }

  #[rxflow_macro::test]
  fn out_of_range_completes_otherwise() {
    let recorder = EventRecorder::<i32, RxError>::new();
    from_iter(vec![10, 20])
      .element_at(2, false)
      .actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Completed]);
  }

  #[derive(Debug, Clone, PartialEq)]
  enum AppError {
    Rx(RxError),
  }

  impl From<RxError> for AppError {
    fn from(err: RxError) -> Self { AppError::Rx(err) }
  }

  #[rxflow_macro::test]
  fn converts_into_caller_error_type() {
    let recorder = EventRecorder::<i32, AppError>::new();
    from_iter(Vec::<i32>::new())
      .element_at(0, true)
      .actual_subscribe(recorder.clone());
    assert_eq!(
      recorder.events(),
      vec![Event::Error(AppError::Rx(RxError::ArgumentOutOfRange { index: 0 }))]
    );
  }
}
