//! # Lifecycle events emitted by the loader.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registry events**: definitions entering the registry, loader run/destroy
//! - **Discovery events**: scan passes, elements placed under watch, entries
//! - **Activation events**: producer invocation started, settled, failed
//!
//! The [`Event`] struct carries metadata such as timestamps, the definition
//! name, the element tag, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use lazy_elements::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ActivationFailed)
//!     .with_name("x-widget")
//!     .with_reason("fetch failed");
//!
//! assert_eq!(ev.kind, EventKind::ActivationFailed);
//! assert_eq!(ev.name.as_deref(), Some("x-widget"));
//! assert_eq!(ev.reason.as_deref(), Some("fetch failed"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of loader lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// A definition was added to (or overwritten in) the registry.
    ///
    /// Sets: `name`.
    Registered,

    /// The loader armed observation and performed its first discovery pass.
    Running,

    /// The loader was destroyed: watchers disarmed, registry cleared.
    Destroyed,

    // === Discovery events ===
    /// A discovery pass found candidate elements for a definition.
    ///
    /// Sets: `name`, `matched` (candidate count).
    DiscoveryPass,

    /// An element was placed under proximity watch.
    ///
    /// Sets: `name`, `tag`.
    Watched,

    /// A watched element came within the margin.
    ///
    /// Sets: `tag`.
    Entered,

    // === Activation events ===
    /// A definition's producer was invoked.
    ///
    /// Sets: `name`.
    ActivationStarted,

    /// Activation settled successfully; the implementation is memoized (and
    /// installed, unless suppressed by the definition's `define` option).
    ///
    /// Sets: `name`.
    Activated,

    /// Activation failed; the definition stays eligible for retry.
    ///
    /// Sets: `name`, `reason`.
    ActivationFailed,
}

/// Loader lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Definition name, if applicable.
    pub name: Option<Arc<str>>,
    /// Element tag, if applicable.
    pub tag: Option<Arc<str>>,
    /// Human-readable failure reason.
    pub reason: Option<Arc<str>>,
    /// Candidate count for a discovery pass.
    pub matched: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            tag: None,
            reason: None,
            matched: None,
        }
    }

    /// Attaches a definition name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches an element tag.
    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Arc<str>>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a discovery candidate count.
    #[inline]
    pub fn with_matched(mut self, n: u32) -> Self {
        self.matched = Some(n);
        self
    }
}
