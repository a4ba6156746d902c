//! Loader lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by registration, discovery,
//! the observation listener, and activation tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! The loader forwards bus events to the [`SubscriberSet`](crate::SubscriberSet)
//! through a dedicated listener task; subscribing to the raw bus is also
//! supported via `Loader::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
