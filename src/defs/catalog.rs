//! # Declarative loader construction.
//!
//! [`Catalog`] collects a plain name → producer mapping (with optional
//! per-entry overrides), then builds a [`Loader`] in one step: construction
//! with auto-run disabled, registration of every entry, a single `run()`.
//! This keeps the first discovery pass from racing the registrations.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use lazy_elements::{Catalog, Config, Constructor, DefineOptions, MemoryHost, ProduceError, ProducerFn};
//!
//! # async fn demo() {
//! let host = MemoryHost::new();
//! let loader = Catalog::new()
//!     .with("x-widget", ProducerFn::arc(|| async {
//!         let ctor: Constructor = Arc::new("widget");
//!         Ok::<_, ProduceError>(Some(ctor))
//!     }))
//!     .with_options(
//!         "x-eager",
//!         ProducerFn::arc(|| async {
//!             let ctor: Constructor = Arc::new("eager");
//!             Ok::<_, ProduceError>(Some(ctor))
//!         }),
//!         DefineOptions::new().with_contextual(false),
//!     )
//!     .build(Config::default(), host);
//! # let _ = loader;
//! # }
//! ```

use std::sync::Arc;

use crate::core::{Config, Loader};
use crate::host::HostRef;
use crate::subscribers::Subscribe;

use super::definition::DefineOptions;
use super::producer::ProducerRef;

struct Entry {
    name: String,
    producer: ProducerRef,
    options: DefineOptions,
}

/// Ordered, declarative list of definitions to register.
#[derive(Default)]
pub struct Catalog {
    entries: Vec<Entry>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry with default options.
    pub fn with(self, name: &str, producer: ProducerRef) -> Self {
        self.with_options(name, producer, DefineOptions::new())
    }

    /// Adds an entry with per-entry overrides.
    pub fn with_options(mut self, name: &str, producer: ProducerRef, options: DefineOptions) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            producer,
            options,
        });
        self
    }

    /// Attaches an event subscriber to the built loader.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the loader: registers every entry, then runs it.
    ///
    /// The caller's `init` setting is overridden to `false` so that
    /// registration happens before the first discovery pass.
    pub fn build(self, mut cfg: Config, host: HostRef) -> Loader {
        cfg.init = false;
        let loader = Loader::builder(cfg, host)
            .with_subscribers(self.subscribers)
            .build();
        for entry in self.entries {
            loader.register(&entry.name, entry.producer, entry.options);
        }
        loader.run();
        loader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::producer::{Constructor, ProducerFn};
    use crate::host::MemoryHost;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting(counter: Arc<AtomicU32>) -> ProducerRef {
        ProducerFn::arc(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let ctor: Constructor = Arc::new(());
                Ok(Some(ctor))
            }
        })
    }

    #[tokio::test]
    async fn test_catalog_registers_everything_then_runs() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));

        let loader = Catalog::new()
            .with("x-a", counting(calls.clone()))
            .with_options(
                "x-b",
                counting(calls.clone()),
                DefineOptions::new().with_contextual(false),
            )
            .build(Config::default(), host);

        assert!(loader.is_running());
        // x-a has no matching element; x-b is non-contextual.
        let ctor = loader.load("x-b").await.expect("x-b activates");
        assert!(ctor.downcast_ref::<()>().is_some());
        assert!(loader.load("x-a").await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
