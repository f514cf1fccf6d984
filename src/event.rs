//! The three-variant signal every observer receives.

/// A single notification in a sequence.
///
/// `Error` and `Completed` are terminal: once an observer has seen one of
/// them, nothing else is delivered to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

impl<Item, Err> Event<Item, Err> {
  /// `true` for `Error` and `Completed`.
  #[inline]
  pub fn is_stop_event(&self) -> bool { !matches!(self, Event::Next(_)) }

  #[inline]
  pub fn is_next(&self) -> bool { matches!(self, Event::Next(_)) }

  /// The carried element, if this is a `Next`.
  pub fn element(self) -> Option<Item> {
    match self {
      Event::Next(value) => Some(value),
      _ => None,
    }
  }

  /// The carried error, if this is an `Error`.
  pub fn error(self) -> Option<Err> {
    match self {
      Event::Error(err) => Some(err),
      _ => None,
    }
  }

  /// Transforms the element of a `Next`, leaving terminal events untouched.
  pub fn map<U>(self, f: impl FnOnce(Item) -> U) -> Event<U, Err> {
    match self {
      Event::Next(value) => Event::Next(f(value)),
      Event::Error(err) => Event::Error(err),
      Event::Completed => Event::Completed,
    }
  }

  /// Transforms the error of an `Error`, leaving other events untouched.
  pub fn map_err<E>(self, f: impl FnOnce(Err) -> E) -> Event<Item, E> {
    match self {
      Event::Next(value) => Event::Next(value),
      Event::Error(err) => Event::Error(f(err)),
      Event::Completed => Event::Completed,
    }
  }

  /// Converts a terminal event into the same terminal event of another item
  /// type. Returns the element back for `Next`.
  pub(crate) fn into_stop<U>(self) -> Result<Event<U, Err>, Item> {
    match self {
      Event::Next(value) => Err(value),
      Event::Error(err) => Ok(Event::Error(err)),
      Event::Completed => Ok(Event::Completed),
    }
  }
}
