//! # Loader configuration.
//!
//! Provides [`Config`] — centralized settings for one loader instance.
//!
//! Config is used in two ways:
//! 1. **Loader creation**: `Loader::builder(config, host)`
//! 2. **Definition defaults**: unset [`DefineOptions`](crate::DefineOptions)
//!    fields inherit `contextual`/`defer`/`define`/`selector` from here at
//!    registration time.
//!
//! The value is built once per loader by overlaying caller-supplied fields
//! onto [`Config::default`] (plain struct update syntax); no shared mutable
//! defaults exist across loader instances.

use std::fmt;

use crate::host::{default_selector, Element, ElementRef, SelectorFn};

/// Tags whose inserted subtrees are never rescanned: inert structural
/// containers that cannot hold activatable components. A performance filter,
/// not a security boundary.
const DEFAULT_IGNORE: [&str; 8] = [
    "html", "head", "meta", "link", "style", "script", "noscript", "template",
];

/// Configuration for one loader instance.
///
/// Defines:
/// - **Scope**: the root element discovery and observation operate under
/// - **Definition defaults**: `contextual`, `defer`, `define`, `selector`
/// - **Observation**: mutation watching on/off, proximity margin, ignore list
/// - **Event system**: bus capacity for lifecycle event delivery
///
/// ## Example
/// ```
/// use lazy_elements::Config;
///
/// let cfg = Config {
///     margin: "25%".to_string(),
///     observe: false,
///     ..Config::default()
/// };
/// assert!(cfg.contextual);
/// ```
#[derive(Clone)]
pub struct Config {
    /// Root element for discovery and observation.
    ///
    /// `None` means the host's document root, resolved lazily so a config can
    /// be built before the host exists.
    pub context: Option<ElementRef>,

    /// Run the loader as soon as it is built.
    ///
    /// The declarative [`Catalog`](crate::Catalog) turns this off so every
    /// entry registers before the first discovery pass.
    pub init: bool,

    /// Default `contextual` policy: activation requires at least one matching
    /// element in the tree.
    pub contextual: bool,

    /// Default `defer` policy: gate activation behind visibility.
    ///
    /// Only meaningful for contextual definitions; a non-contextual definition
    /// activates unconditionally before the defer check is reached.
    pub defer: bool,

    /// Arm the tree mutation watcher in `run()`.
    pub observe: bool,

    /// Default `define` policy: install successful results into the host
    /// implementation registry (`false` = memoize only).
    pub define: bool,

    /// Proximity margin handed to the host once at construction.
    ///
    /// Immutable for the loader's lifetime; not configurable per definition.
    pub margin: String,

    /// Default selector builder: tag `name`, not yet installed.
    pub selector: SelectorFn,

    /// Tags whose inserted subtrees are not rescanned on mutation.
    pub ignore: Vec<String>,

    /// Capacity of the lifecycle event bus ring buffer (min 1; clamped).
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Whether `tag` is on the ignore list (case-insensitive).
    pub(crate) fn is_ignored(&self, tag: &str) -> bool {
        self.ignore.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `context = None` (host document root)
    /// - `init = true` (run at build)
    /// - `contextual = true`, `defer = true`, `define = true`
    /// - `observe = true` (mutation watching on)
    /// - `margin = "0%"`
    /// - `selector` = tag not yet installed
    /// - `ignore` = html, head, meta, link, style, script, noscript, template
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            context: None,
            init: true,
            contextual: true,
            defer: true,
            observe: true,
            define: true,
            margin: "0%".to_string(),
            selector: default_selector(),
            ignore: DEFAULT_IGNORE.iter().map(|t| t.to_string()).collect(),
            bus_capacity: 1024,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("context", &self.context.as_ref().map(|c| c.tag()))
            .field("init", &self.init)
            .field("contextual", &self.contextual)
            .field("defer", &self.defer)
            .field("observe", &self.observe)
            .field("define", &self.define)
            .field("margin", &self.margin)
            .field("ignore", &self.ignore)
            .field("bus_capacity", &self.bus_capacity)
            .finish_non_exhaustive()
    }
}
