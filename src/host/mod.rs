//! # Host platform seam.
//!
//! The loader consumes five platform facilities and reimplements none of them:
//! a document query facility, a proximity/intersection observation facility, a
//! subtree-mutation observation facility, an implementation registry, and event
//! delivery for the two observers. [`Host`] bundles them behind one trait so an
//! embedding supplies a single collaborator object.
//!
//! ## Architecture
//! ```text
//! Loader ──(query/observe/install)──► Host
//!   ▲                                  │
//!   └──── broadcast<HostEvent> ◄───────┘
//!          Entered { element }      (element came within the margin)
//!          ChildAdded { element }   (element inserted under the watched root)
//! ```
//!
//! ## Rules
//! - `observe()` is idempotent per element; hosts deduplicate by
//!   [`Element::node_id`].
//! - An element already within the margin at watch-start receives one initial
//!   synthetic intersection check, delivered as a normal `Entered` event.
//! - Mutation events carry *added* elements only; removals are never reported.
//! - Hosts deliver element nodes only (the [`ElementRef`] seam cannot carry
//!   anything else).
//!
//! The crate ships one complete reference host, [`MemoryHost`], used by the
//! test suite and the demo programs. Real embeddings (a browser bridge, a
//! polling visibility checker, a virtual-DOM diff feed) implement [`Host`]
//! themselves.

mod element;
mod memory;

pub use element::{Element, ElementRef, Selector, SelectorFn};
pub use memory::MemoryHost;

pub(crate) use element::default_selector;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::defs::Constructor;

/// Observation event delivered by a host.
///
/// Batched observer callbacks are flattened to one event per element.
#[derive(Clone)]
pub enum HostEvent {
    /// A watched element is now within the configured margin.
    Entered {
        /// The element that intersected.
        element: ElementRef,
    },
    /// An element node was added somewhere under the mutation-watched root.
    ChildAdded {
        /// The added element (root of the added subtree).
        element: ElementRef,
    },
}

/// # The host platform contract.
///
/// One object per loader; all methods are synchronous and must not block.
/// Observation callbacks are delivered out-of-band through the channel
/// returned by [`Host::subscribe`].
pub trait Host: Send + Sync + 'static {
    // --- document query facility ---

    /// The document root element.
    fn root(&self) -> ElementRef;

    /// All descendant elements of `root` matching `selector`, in document
    /// order. Excludes `root` itself (use [`Host::matches`] for that).
    fn query_all(&self, root: &ElementRef, selector: &Selector) -> Vec<ElementRef>;

    /// Whether `element` itself matches `selector`.
    fn matches(&self, element: &ElementRef, selector: &Selector) -> bool;

    // --- proximity/intersection observation ---

    /// Sets the proximity margin for subsequent watches.
    ///
    /// Called once at loader construction; the margin is an immutable
    /// construction-time setting, not configurable per definition.
    fn configure_proximity(&self, margin: &str);

    /// Begins watching `element`; no-op if already watched.
    fn observe(&self, element: &ElementRef);

    /// Stops watching `element`; no-op if not watched.
    fn unobserve(&self, element: &ElementRef);

    /// Stops watching every element.
    fn disconnect_proximity(&self);

    // --- subtree mutation observation ---

    /// Watches child-list changes under `root`, subtree-inclusive.
    fn observe_mutations(&self, root: &ElementRef);

    /// Stops mutation watching.
    fn disconnect_mutations(&self);

    // --- implementation registry ---

    /// Looks up an installed implementation; the single source of truth for
    /// "has this name already been finalized".
    fn lookup(&self, name: &str) -> Option<Constructor>;

    /// Installs an implementation under `name`.
    fn install(&self, name: &str, constructor: Constructor);

    // --- observation event delivery ---

    /// Subscribes to this host's observation events.
    ///
    /// Each call creates an independent receiver observing subsequent events.
    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}

/// Shared reference to a host (`Arc<dyn Host>`).
pub type HostRef = Arc<dyn Host>;
