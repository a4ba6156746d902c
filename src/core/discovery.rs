//! # Discovery engine.
//!
//! One pass over a subtree, routing each definition to exactly one of three
//! policies:
//!
//! ```text
//! for definition (registry order):
//!   contextual: false ──────────────► activate now (Eager)
//!   candidates = query(root, selector) [+ root itself when it matches]
//!   candidates empty ───────────────► nothing (future mutation re-discovers)
//!   defer: true  ───────────────────► watch every candidate
//!   defer: false ───────────────────► activate now (Eager), once per definition
//! ```
//!
//! Discovery is idempotent and re-entrant: the activation guards make a second
//! pass over an unchanged tree a no-op, and duplicate watches are deduplicated
//! by the host.

use crate::events::{Event, EventKind};
use crate::host::{Element, ElementRef, SelectorFn};

use super::{Dispatch, Loader};

struct Probe {
    name: String,
    contextual: bool,
    defer: bool,
    selector: SelectorFn,
}

impl Loader {
    /// Runs one discovery pass over the subtree rooted at `root`.
    ///
    /// `only` limits the pass to the named definitions (used by scoped
    /// re-discovery after a late registration); `None` covers the whole
    /// registry in insertion order.
    pub(crate) fn discover(&self, root: &ElementRef, only: Option<&[String]>) {
        // Snapshot under the read lock; the scan itself runs unlocked.
        let probes: Vec<Probe> = {
            let registry = self.read();
            match only {
                None => registry
                    .iter()
                    .map(|(name, def)| Probe {
                        name: name.clone(),
                        contextual: def.options.contextual,
                        defer: def.options.defer,
                        selector: def.options.selector.clone(),
                    })
                    .collect(),
                Some(names) => names
                    .iter()
                    .filter_map(|name| {
                        registry.get(name).map(|def| Probe {
                            name: name.clone(),
                            contextual: def.options.contextual,
                            defer: def.options.defer,
                            selector: def.options.selector.clone(),
                        })
                    })
                    .collect(),
            }
        };

        for probe in probes {
            if !probe.contextual {
                // Unconditional activation; the defer option never applies.
                self.activate_detached(probe.name, Dispatch::Eager);
                continue;
            }

            let selector = (probe.selector)(&probe.name);
            let mut candidates = self.inner.host.query_all(root, &selector);
            if self.inner.host.matches(root, &selector) {
                // Query facilities exclude the search root; it still counts.
                candidates.insert(0, root.clone());
            }
            if candidates.is_empty() {
                continue;
            }

            self.publish(
                Event::new(EventKind::DiscoveryPass)
                    .with_name(probe.name.clone())
                    .with_matched(candidates.len() as u32),
            );

            if probe.defer {
                for element in candidates {
                    self.inner.host.observe(&element);
                    self.publish(
                        Event::new(EventKind::Watched)
                            .with_name(probe.name.clone())
                            .with_tag(element.tag()),
                    );
                }
            } else {
                self.activate_detached(probe.name, Dispatch::Eager);
            }
        }
    }
}
