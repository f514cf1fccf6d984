//! Errors raised by the library itself.
//!
//! Stream errors are ordinary values of each stream's own `Err` type and
//! travel as [`Event::Error`](crate::event::Event::Error). [`RxError`] covers
//! the few failures the library produces on its own; operators that can raise
//! one require `Err: From<RxError>`.

use thiserror::Error;

/// # Errors produced by rxflow operators and schedulers.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RxError {
  /// The source completed before the requested element index was reached.
  #[error("argument out of range: source completed before element {index}")]
  ArgumentOutOfRange {
    /// The index that was requested.
    index: usize,
  },

  /// A scheduler backend could not be started.
  #[error("scheduler unavailable: {reason}")]
  SchedulerUnavailable {
    /// The reason reported by the backend.
    reason: String,
  },
}

impl RxError {
  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// # Example
  /// ```
  /// use rxflow::RxError;
  ///
  /// let err = RxError::ArgumentOutOfRange { index: 3 };
  /// assert_eq!(err.as_label(), "argument_out_of_range");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      RxError::ArgumentOutOfRange { .. } => "argument_out_of_range",
      RxError::SchedulerUnavailable { .. } => "scheduler_unavailable",
    }
  }
}
