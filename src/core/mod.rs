//! Runtime core: the loader and its collaborators.
//!
//! This module contains the embedded implementation of the lazy-registration
//! runtime. The public API from this module is [`Loader`] (with its builder),
//! [`Config`], and the [`Dispatch`] scheduling knob.
//!
//! Internal modules:
//! - [`loader`]: registry façade, activation state machine, lifecycle;
//! - [`discovery`]: one scan pass routing definitions to activate/watch/skip;
//! - [`listener`]: drains host observation events back into the core;
//! - [`schedule`]: eager-vs-idle dispatch of activation work.

mod config;
mod discovery;
mod listener;
mod loader;
mod schedule;

pub use config::Config;
pub use loader::{Loader, LoaderBuilder};
pub use schedule::Dispatch;
