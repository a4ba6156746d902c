//! # Event subscribers for the loader.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out for handling lifecycle events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Loader ── publish(Event) ──► Bus ──► forwarder task ──► SubscriberSet
//!                                              │
//!                                         ┌────┴─────┬─────────┐
//!                                         ▼          ▼         ▼
//!                                      LogWriter  Metrics   Custom ...
//! ```
//!
//! Subscribers observe and react (logging, metrics, alerts); the loader's
//! control flow never depends on them.

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
