//! # lazy-elements
//!
//! **lazy-elements** is a lazy-registration manager for pluggable element
//! implementations in a document tree.
//!
//! It defers the expensive act of fetching and registering an implementation
//! until the component is actually needed: already present in the visible
//! document, scrolled into proximity, or inserted into the tree later. The
//! crate is a building block — the document tree, the observation facilities,
//! and the implementation registry are supplied by a [`Host`]; the crate owns
//! the registry of deferred definitions, discovery, visibility gating, and the
//! idempotent activation state machine.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Definition  │   │  Definition  │   │  Definition  │
//!     │ ("x-widget") │   │ ("x-chart")  │   │ ("x-eager")  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Loader (façade)                                                  │
//! │  - registry (insertion-ordered name → Definition)                 │
//! │  - discovery engine (scan / watch / activate routing)             │
//! │  - activation state machine (Idle → Pending → Ready)              │
//! │  - Bus (broadcast lifecycle events) + SubscriberSet (fan-out)     │
//! └──────┬──────────────────────┬─────────────────────────┬──────────┘
//!        │ query/observe        │ install/lookup          │ events
//!        ▼                      ▼                         ▼
//! ┌───────────────────────────────────────────────┐   ┌──────────────┐
//! │  Host (platform seam)                         │   │ Subscribers  │
//! │  - document query facility                    │   │ (logging,    │
//! │  - proximity observer (margin, per element)   │   │  metrics...) │
//! │  - subtree mutation observer (childList)      │   └──────────────┘
//! │  - implementation registry (lookup/install)   │
//! └──────────────────────┬────────────────────────┘
//!                        │ broadcast<HostEvent>
//!                        ▼
//!            listener task (one per loader)
//!              Entered{el}    → unwatch, activate tag (idle dispatch)
//!              ChildAdded{el} → re-discover that subtree
//! ```
//!
//! ### Lifecycle
//! ```text
//! register(name, producer, opts) ──► registry (overwrite allowed)
//!         │ (when already running: scoped discovery for that name)
//! run() ──► arm mutation watching ──► full discovery pass
//!
//! discovery, per definition:
//!   ├─ contextual: false ─► activate now
//!   ├─ no matching element ─► nothing (a later mutation re-discovers)
//!   ├─ defer: true  ─► watch every candidate element
//!   └─ defer: false ─► activate now
//!
//! activate(name)  [at most one producer invocation per settle]:
//!   ├─ memoized     ─► return cached constructor
//!   ├─ in flight    ─► await the shared outcome
//!   ├─ installed externally ─► adopt
//!   └─ invoke producer
//!        ├─ Ok(Some) ─► install (unless define:false) ─► memoize
//!        └─ Ok(None) / Err ─► fail, stay retryable
//!
//! destroy() ──► disarm watchers, clear registry, permanently inert
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                  |
//! |-----------------|----------------------------------------------------------|-------------------------------------|
//! | **Definitions** | Register producers with per-name activation policy.      | [`Produce`], [`ProducerFn`], [`DefineOptions`] |
//! | **Loading**     | Point activation converging with automatic discovery.    | [`Loader::load`]                    |
//! | **Discovery**   | Initial scan + mutation-driven rescans.                  | [`Loader::run`], [`Config::observe`] |
//! | **Visibility**  | Proximity-gated activation with a construction margin.   | [`Config::margin`], [`DefineOptions::with_defer`] |
//! | **Hosts**       | Platform seam; in-memory reference host included.        | [`Host`], [`MemoryHost`]            |
//! | **Events**      | Lifecycle events with subscriber fan-out.                | [`Subscribe`], [`SubscriberSet`], [`Event`] |
//! | **Errors**      | Typed failures, never cached, retry on next trigger.     | [`LoadError`], [`ProduceError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use lazy_elements::{Catalog, Config, Constructor, Host, MemoryHost, ProduceError, ProducerFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The reference host; real embeddings implement `Host` themselves.
//!     let host = MemoryHost::new();
//!     host.insert(&host.root(), "x-widget");
//!
//!     // Declarative construction: register everything, then run once.
//!     let loader = Catalog::new()
//!         .with(
//!             "x-widget",
//!             ProducerFn::arc(|| async {
//!                 let ctor: Constructor = Arc::new("widget-impl");
//!                 Ok::<_, ProduceError>(Some(ctor))
//!             }),
//!         )
//!         .build(Config::default(), host.clone());
//!
//!     // Point activation converges with discovery on one producer call.
//!     let ctor = loader.load("x-widget").await?;
//!     assert!(ctor.downcast_ref::<&str>().is_some());
//!     Ok(())
//! }
//! ```

mod core;
mod defs;
mod error;
mod events;
mod host;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Config, Dispatch, Loader, LoaderBuilder};
pub use defs::{Catalog, Constructor, DefineOptions, Produce, ProducerFn, ProducerRef};
pub use error::{LoadError, ProduceError};
pub use events::{Bus, Event, EventKind};
pub use host::{Element, ElementRef, Host, HostEvent, HostRef, MemoryHost, Selector, SelectorFn};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logging subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
