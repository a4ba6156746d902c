//! # Definitions and their activation state.
//!
//! A [`Definition`] bundles a component name with its producer and resolved
//! activation policy. Definitions can be created with explicit options
//! ([`DefineOptions`]) or inherit the loader-wide defaults from
//! [`Config`](crate::Config) — resolution happens once, at registration time,
//! and the resolved options are immutable for the definition's lifetime.
//!
//! The activation state machine lives here too:
//!
//! ```text
//! Idle ──(first trigger)──► Pending ──(producer ok)──► Ready   (terminal)
//!   ▲                          │
//!   └───────(failure)──────────┘        failures are never cached
//! ```
//!
//! `Pending` holds the broadcast channel concurrent callers converge on; the
//! check-and-set into `Pending` happens synchronously under the registry write
//! lock, which is what makes the producer at-most-once.

use tokio::sync::broadcast;

use crate::core::Config;
use crate::error::LoadError;
use crate::host::SelectorFn;

use super::producer::{Constructor, ProducerRef};

/// Per-definition option overrides.
///
/// Every field is optional; unset fields inherit the loader-wide default at
/// registration time.
///
/// ## Example
/// ```
/// use lazy_elements::DefineOptions;
///
/// // Activate as soon as registered, regardless of tree contents.
/// let opts = DefineOptions::new().with_contextual(false);
/// ```
#[derive(Clone, Default)]
pub struct DefineOptions {
    contextual: Option<bool>,
    defer: Option<bool>,
    define: Option<bool>,
    selector: Option<SelectorFn>,
}

impl DefineOptions {
    /// Creates empty overrides (inherit every default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides `contextual`: whether activation requires a matching element
    /// in the tree.
    ///
    /// With `contextual: false` the definition activates unconditionally and
    /// `defer` never applies (there is no element to watch).
    pub fn with_contextual(mut self, contextual: bool) -> Self {
        self.contextual = Some(contextual);
        self
    }

    /// Overrides `defer`: whether activation waits for a matching element to
    /// come within the proximity margin.
    pub fn with_defer(mut self, defer: bool) -> Self {
        self.defer = Some(defer);
        self
    }

    /// Overrides `define`: whether a successful activation installs the
    /// constructor into the host implementation registry (`false` = cache
    /// only).
    pub fn with_define(mut self, define: bool) -> Self {
        self.define = Some(define);
        self
    }

    /// Overrides the selector builder used to find candidate elements.
    pub fn with_selector(mut self, selector: SelectorFn) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Resolves these overrides against the loader-wide defaults.
    pub(crate) fn resolve(&self, cfg: &Config) -> ResolvedOptions {
        ResolvedOptions {
            contextual: self.contextual.unwrap_or(cfg.contextual),
            defer: self.defer.unwrap_or(cfg.defer),
            define: self.define.unwrap_or(cfg.define),
            selector: self
                .selector
                .clone()
                .unwrap_or_else(|| cfg.selector.clone()),
        }
    }
}

/// Options after resolution; immutable for the definition's lifetime.
#[derive(Clone)]
pub(crate) struct ResolvedOptions {
    pub contextual: bool,
    pub defer: bool,
    pub define: bool,
    pub selector: SelectorFn,
}

/// Outcome every caller of one activation observes.
pub(crate) type Outcome = Result<Constructor, LoadError>;

/// Per-definition activation state.
pub(crate) enum Activation {
    /// Registered; no producer invocation in flight, nothing memoized.
    /// Also the state after a failure (retry allowed).
    Idle,
    /// Producer in flight; concurrent callers subscribe here and converge on
    /// one outcome.
    Pending(broadcast::Sender<Outcome>),
    /// Memoized result; the producer is never invoked again.
    Ready(Constructor),
}

/// One registered component name with its producer, policy, and state.
pub(crate) struct Definition {
    pub producer: ProducerRef,
    pub options: ResolvedOptions,
    pub state: Activation,
    /// Bumped on (re-)registration; a settling activation from a stale
    /// revision must not touch this definition's state.
    pub revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Selector;
    use std::sync::Arc;

    #[test]
    fn test_unset_options_inherit_config_defaults() {
        let cfg = Config::default();
        let resolved = DefineOptions::new().resolve(&cfg);
        assert!(resolved.contextual);
        assert!(resolved.defer);
        assert!(resolved.define);
        assert_eq!(
            (resolved.selector)("x-a"),
            Selector::Undefined("x-a".into())
        );
    }

    #[test]
    fn test_overrides_win_over_defaults() {
        let cfg = Config::default();
        let resolved = DefineOptions::new()
            .with_contextual(false)
            .with_defer(false)
            .with_define(false)
            .with_selector(Arc::new(|name| Selector::Tag(name.to_string())))
            .resolve(&cfg);
        assert!(!resolved.contextual);
        assert!(!resolved.defer);
        assert!(!resolved.define);
        assert_eq!((resolved.selector)("x-a"), Selector::Tag("x-a".into()));
    }
}
