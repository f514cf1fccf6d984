use std::sync::Mutex;

use smallvec::SmallVec;

use super::{Disposable, Subscription};
use crate::util::lock;

/// Key returned by [`CompositeDisposable::add`], used to remove the entry
/// again without disposing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisposeKey(usize);

struct Inner {
  disposed: bool,
  next_id: usize,
  items: SmallVec<[(usize, Subscription); 2]>,
}

/// A group of subscriptions disposed together.
///
/// - **SmallVec Optimization**: the common case of 0-2 children needs no heap
///   allocation beyond the group itself.
/// - Adding to a disposed group disposes the newcomer immediately and returns
///   `None`.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let group = CompositeDisposable::new();
/// let key = group.add(Subscription::from_fn(|| {})).unwrap();
/// assert_eq!(group.len(), 1);
/// group.remove(key);
/// assert_eq!(group.len(), 0);
/// group.dispose();
/// ```
pub struct CompositeDisposable(Mutex<Inner>);

impl Default for CompositeDisposable {
  fn default() -> Self {
    Self(Mutex::new(Inner { disposed: false, next_id: 0, items: SmallVec::new() }))
  }
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn add(&self, subscription: Subscription) -> Option<DisposeKey> {
    {
      let mut inner = lock(&self.0);
      if !inner.disposed {
        let id = inner.next_id;
        inner.next_id += 1;
        inner.items.retain(|(_, s)| !s.is_disposed());
        inner.items.push((id, subscription));
        return Some(DisposeKey(id));
      }
    }
    subscription.dispose();
    None
  }

  /// Removes an entry without disposing it.
  pub fn remove(&self, key: DisposeKey) -> Option<Subscription> {
    let mut inner = lock(&self.0);
    let index = inner.items.iter().position(|(id, _)| *id == key.0)?;
    Some(inner.items.remove(index).1)
  }

  pub fn len(&self) -> usize { lock(&self.0).items.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let items = {
      let mut inner = lock(&self.0);
      if inner.disposed {
        return;
      }
      inner.disposed = true;
      std::mem::take(&mut inner.items)
    };
    for (_, subscription) in items {
      subscription.dispose();
    }
  }

  fn is_disposed(&self) -> bool { lock(&self.0).disposed }
}
