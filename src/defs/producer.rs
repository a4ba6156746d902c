//! # Producer abstraction and function-backed producer implementation.
//!
//! This module defines the [`Produce`] trait (async, no arguments) and a
//! convenient function-backed implementation [`ProducerFn`]. The common handle
//! type is [`ProducerRef`], an `Arc<dyn Produce>` suitable for sharing across
//! the runtime.
//!
//! A producer performs the expensive part of registration: fetching or
//! building an implementation constructor. The loader guarantees it is invoked
//! at most once while a result is pending, and never again after success.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProduceError;

/// Opaque implementation constructor handle.
///
/// The loader never inspects it; it only caches it and hands it to the host
/// implementation registry. Embeddings downcast it to their own constructor
/// type.
pub type Constructor = Arc<dyn Any + Send + Sync>;

/// # Asynchronous implementation producer.
///
/// Resolves to `Some(constructor)` on success, `None` for an intentionally
/// empty result (treated as a failure by the loader, never memoized), or a
/// [`ProduceError`].
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use lazy_elements::{Constructor, Produce, ProduceError};
///
/// struct WidgetProducer;
///
/// #[async_trait]
/// impl Produce for WidgetProducer {
///     async fn produce(&self) -> Result<Option<Constructor>, ProduceError> {
///         // fetch/build the implementation...
///         let ctor: Constructor = Arc::new("widget-impl");
///         Ok(Some(ctor))
///     }
/// }
/// ```
#[async_trait]
pub trait Produce: Send + Sync + 'static {
    /// Fetches or builds the implementation constructor.
    async fn produce(&self) -> Result<Option<Constructor>, ProduceError>;
}

/// Shared reference to a producer (`Arc<dyn Produce>`).
pub type ProducerRef = Arc<dyn Produce>;

/// Function-backed producer implementation.
///
/// Wraps a closure that *creates* a new future per invocation; since the
/// loader invokes a producer at most once per settle, the closure form carries
/// no hidden shared state.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use lazy_elements::{Constructor, ProducerFn, ProducerRef, ProduceError};
///
/// let p: ProducerRef = ProducerFn::arc(|| async {
///     let ctor: Constructor = Arc::new(42u32);
///     Ok::<_, ProduceError>(Some(ctor))
/// });
/// ```
pub struct ProducerFn<F> {
    f: F,
}

impl<F> ProducerFn<F> {
    /// Creates a new function-backed producer.
    ///
    /// Prefer [`ProducerFn::arc`] when you immediately need a [`ProducerRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Produce for ProducerFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Constructor>, ProduceError>> + Send + 'static,
{
    async fn produce(&self) -> Result<Option<Constructor>, ProduceError> {
        (self.f)().await
    }
}
