use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  event::Event,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Creates an observable producing a single value.
///
/// Completes immediately after emitting the value given.
///
/// ```
/// use rxflow::prelude::*;
///
/// observable::of(123).subscribe(|v| println!("{v}"));
/// ```
pub fn of<Item, Err>(value: Item) -> Of<Item, Err> { Of { value, _err: PhantomData } }

pub struct Of<Item, Err> {
  value: Item,
  _err: PhantomData<fn() -> Err>,
}

impl<Item: Clone, Err> Clone for Of<Item, Err> {
  fn clone(&self) -> Self { of(self.value.clone()) }
}

impl<Item, Err> Producer for Of<Item, Err>
where
  Item: Clone + Send + Sync + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    sink.forward(Event::Next(self.value.clone()));
    sink.forward(Event::Completed);
    sink.dispose();
    (sink.handle(), Subscription::empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{observable::Observable, test_util::EventRecorder};

  #[rxflow_macro::test]
  fn emits_value_then_completes() {
    let recorder = EventRecorder::<i32, ()>::new();
    of(7).actual_subscribe(recorder.clone());
    assert_eq!(recorder.events(), vec![Event::Next(7), Event::Completed]);
  }

  #[rxflow_macro::test]
  fn each_subscription_gets_its_own_copy() {
    let source = of::<_, ()>(String::from("v"));
    let (a, b) = (EventRecorder::new(), EventRecorder::new());
    source.actual_subscribe(a.clone());
    source.actual_subscribe(b.clone());
    assert_eq!(a.events(), b.events());
  }
}
