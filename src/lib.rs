//! # rxflow: a push-based reactive pipeline core
//!
//! Observables are re-subscribable descriptions of sequences. Composing
//! operators builds nested structs; `subscribe` walks the chain, creating one
//! sink per operator and one dispose coordinator per subscription edge, so
//! cancellation is race-free even when a source emits synchronously while it
//! is still being subscribed.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .take(3)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A re-subscribable sequence description |
//! | [`Producer`] | The hook every built-in operator implements |
//! | [`Observer`] | Consumes [`Event`]s: `Next`, `Error`, `Completed` |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Where and when deferred work runs |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): [`ThreadPoolScheduler`] on a `futures` thread pool
//! - **`timer`** (default): non-blocking delays for the thread pool scheduler
//! - **`tokio-scheduler`**: [`TokioScheduler`] on a tokio runtime
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (connection lifecycle, retries,
//! scheduler setup) and installs no subscriber.
//!
//! [`Observable`]: observable::Observable
//! [`Producer`]: producer::Producer
//! [`Observer`]: observer::Observer
//! [`Event`]: event::Event
//! [`Subscription`]: disposable::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`ThreadPoolScheduler`]: scheduler::ThreadPoolScheduler
//! [`TokioScheduler`]: scheduler::TokioScheduler

pub mod disposable;
pub mod error;
pub mod event;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod producer;
pub mod scheduler;
pub mod subject;

#[cfg(test)]
mod test_util;
mod util;

pub use error::RxError;
pub use scheduler::{Duration, Instant};
