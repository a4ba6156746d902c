//! # Element handles and matcher expressions.
//!
//! The loader never owns the document tree; it only holds opaque handles to
//! elements inside it. [`Element`] is the handle contract and [`ElementRef`]
//! (`Arc<dyn Element>`) is the shared form passed across the runtime.
//!
//! [`Selector`] is the structured matcher expression a definition uses to find
//! its candidate elements. The default selector for a definition named `n` is
//! `Selector::Undefined(n)` — "elements of tag `n` whose implementation is not
//! installed yet".

use std::sync::Arc;

/// # Handle to one element in the host document tree.
///
/// Hosts only ever hand out handles to *element* nodes; text and comment nodes
/// are not representable through this seam.
pub trait Element: Send + Sync + 'static {
    /// Lowercase tag name of the element (for example `"x-widget"`).
    fn tag(&self) -> &str;

    /// Stable identity within one host.
    ///
    /// Two handles refer to the same element exactly when their ids are equal;
    /// observation facilities use this to deduplicate watches.
    fn node_id(&self) -> u64;
}

/// Shared reference to an element (`Arc<dyn Element>`).
pub type ElementRef = Arc<dyn Element>;

/// Structured matcher expression for finding candidate elements.
///
/// ## Example
/// ```
/// use lazy_elements::Selector;
///
/// // The default definition selector: tag present, implementation not yet installed.
/// let sel = Selector::Undefined("x-widget".into());
/// assert_eq!(sel, Selector::Undefined("x-widget".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Elements of this tag whose name has no entry in the implementation
    /// registry yet.
    Undefined(String),
    /// Elements of this tag, regardless of definition state.
    Tag(String),
    /// A raw expression interpreted by the host (for hosts backed by a real
    /// selector engine). Hosts without one match nothing for `Raw`.
    Raw(String),
}

/// Builds a [`Selector`] from a definition name.
///
/// Stored per definition; resolved against the loader-wide default at
/// registration time.
pub type SelectorFn = Arc<dyn Fn(&str) -> Selector + Send + Sync>;

/// The default selector: tag `name`, not yet installed.
pub(crate) fn default_selector() -> SelectorFn {
    Arc::new(|name| Selector::Undefined(name.to_string()))
}
