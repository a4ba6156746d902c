//! # Definition abstractions.
//!
//! This module provides the definition-related types:
//! - [`Produce`] - trait for implementing asynchronous implementation producers
//! - [`ProducerFn`] - function-backed producer implementation
//! - [`ProducerRef`] - shared reference to a producer (`Arc<dyn Produce>`)
//! - [`Constructor`] - opaque implementation constructor handle
//! - [`DefineOptions`] - per-definition overrides of the loader defaults
//! - [`Catalog`] - declarative name → producer factory

mod catalog;
mod definition;
mod producer;

pub use catalog::Catalog;
pub use definition::DefineOptions;
pub use producer::{Constructor, Produce, ProducerFn, ProducerRef};

pub(crate) use definition::{Activation, Definition, Outcome};
