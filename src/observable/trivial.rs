use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  event::Event,
  observer::Observer,
  producer::{Producer, Sink, SinkCancel},
};

/// Creates an observable that emits no items and completes immediately.
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

/// Creates an observable that never emits and never terminates.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

/// Creates an observable that emits no items, just terminates with `err`.
pub fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr(err, PhantomData) }

pub struct Empty<Item, Err>(PhantomData<fn() -> (Item, Err)>);

pub struct Never<Item, Err>(PhantomData<fn() -> (Item, Err)>);

pub struct ThrowErr<Item, Err>(Err, PhantomData<fn() -> Item>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { empty() }
}

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { never() }
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { throw_err(self.0.clone()) }
}

impl<Item, Err> Producer for Empty<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    sink.forward(Event::Completed);
    sink.dispose();
    (sink.handle(), Subscription::empty())
  }
}

impl<Item, Err> Producer for Never<Item, Err>
where
  Item: Send + 'static,
  Err: Send + 'static,
{
  type Item = Item;
  type Err = Err;

  fn run<O>(&self, observer: O, _cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Item, Err> + 'static,
  {
    drop(observer);
    (Subscription::empty(), Subscription::empty())
  }
}

impl<Item, Err> Producer for ThrowErr<Item, Err>
where
  Item: Send + 'static,
  Err: Clone + Send + Sync + 'static,
{
  type Item = Item;
  type Err = Err;

  fn run<O>(&self, observer: O, cancel: SinkCancel) -> (Subscription, Subscription)
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut sink = Sink::new(observer, cancel);
    sink.forward(Event::Error(self.0.clone()));
    sink.dispose();
    (sink.handle(), Subscription::empty())
  }
}
