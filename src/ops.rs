//! Operators. Each one is a description struct (a [`Producer`] over its
//! source) plus the sink it materializes per subscription.
//!
//! [`Producer`]: crate::producer::Producer

pub mod box_it;
pub mod catch_error;
pub mod combine_latest;
pub mod delay;
pub mod element_at;
pub mod filter;
pub mod map;
pub mod observe_on;
pub mod retry;
pub mod share;
pub mod start_with;
pub mod subscribe_on;
pub mod take;
pub mod take_for;
pub mod take_until;
pub mod take_while;
pub mod tap;
pub mod with_latest_from;
