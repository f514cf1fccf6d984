//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Creation functions live under `observable::`
pub use crate::observable;
// Core traits
pub use crate::observable::{Observable, ObservableExt};
pub use crate::observer::{BoxedObserver, FnMutObserver, FnObserver, Observer};
pub use crate::producer::{Producer, SerializedSink, Sink, SinkCancel};
// Events and errors
pub use crate::{event::Event, RxError};
// Disposables
pub use crate::disposable::{
  AnonymousDisposable, BinaryDisposable, BooleanDisposable, CompositeDisposable, DisposeKey,
  Disposable, SerialDisposable, SingleAssignmentDisposable, Subscription, SubscriptionGuard,
};
// Schedulers
pub use crate::scheduler::{
  schedule_recursive, CurrentThreadScheduler, Duration, Instant, Scheduler, TestScheduler,
};
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Subject and operator options
pub use crate::{
  observable::Emitter,
  ops::{box_it::BoxedObservable, share::SubjectLifetimeScope, take_while::TakeBehavior},
  subject::Subject,
};
