//! Error types used by the loader and by producers.
//!
//! This module defines two error types:
//!
//! - [`LoadError`] — failures surfaced to callers of `load()` and to the
//!   activation path (unknown names, producer failures, empty results).
//! - [`ProduceError`] — the error a producer itself reports while fetching
//!   or building an implementation.
//!
//! [`LoadError`] provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and [`LoadError::is_retryable`] for retry eligibility.
//! It is `Clone`: concurrent callers waiting on one in-flight activation all
//! receive the same outcome.

use thiserror::Error;

/// # Errors surfaced by loading and activation.
///
/// All failures reach the asynchronous caller as a returned error; the loader
/// never propagates them synchronously out of observation callbacks, and a
/// failure in one definition's activation does not disturb the others.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// `load()` was called with a name that was never registered.
    ///
    /// Raised immediately, with no side effects and no tree queries.
    #[error("definition for element \"{name}\" is not registered")]
    UnknownDefinition {
        /// The name that was requested.
        name: String,
    },

    /// The definition's producer failed.
    ///
    /// Nothing is memoized; the definition stays eligible for a retry on the
    /// next trigger (new matching element, new intersection, manual `load`).
    #[error("producer for \"{name}\" failed: {reason}")]
    ProducerFailed {
        /// The definition name.
        name: String,
        /// The producer's failure message.
        reason: String,
    },

    /// The producer resolved, but to nothing.
    ///
    /// Treated as a failure: nothing is installed into the implementation
    /// registry and nothing is memoized.
    #[error("producer for \"{name}\" resolved to an empty implementation")]
    EmptyResult {
        /// The definition name.
        name: String,
    },
}

impl LoadError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lazy_elements::LoadError;
    ///
    /// let err = LoadError::UnknownDefinition { name: "x-widget".into() };
    /// assert_eq!(err.as_label(), "unknown_definition");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::UnknownDefinition { .. } => "unknown_definition",
            LoadError::ProducerFailed { .. } => "producer_failed",
            LoadError::EmptyResult { .. } => "empty_result",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoadError::UnknownDefinition { name } => format!("not registered: {name}"),
            LoadError::ProducerFailed { name, reason } => format!("{name}: {reason}"),
            LoadError::EmptyResult { name } => format!("{name}: empty result"),
        }
    }

    /// Indicates whether a later trigger may retry this activation.
    ///
    /// Failures are never cached, so [`LoadError::ProducerFailed`] and
    /// [`LoadError::EmptyResult`] are retryable; an unknown name is not —
    /// nothing exists to retry until the name is registered.
    ///
    /// # Example
    /// ```
    /// use lazy_elements::LoadError;
    ///
    /// let retryable = LoadError::ProducerFailed { name: "x-a".into(), reason: "boom".into() };
    /// assert!(retryable.is_retryable());
    ///
    /// let unknown = LoadError::UnknownDefinition { name: "x-a".into() };
    /// assert!(!unknown.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoadError::ProducerFailed { .. } | LoadError::EmptyResult { .. }
        )
    }
}

/// # Error reported by a producer.
///
/// Producers know nothing about definition names or loader state; they report
/// a plain reason and the loader wraps it into [`LoadError::ProducerFailed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ProduceError {
    /// Human-readable failure description.
    pub reason: String,
}

impl ProduceError {
    /// Creates a new producer error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<String> for ProduceError {
    fn from(reason: String) -> Self {
        Self { reason }
    }
}

impl From<&str> for ProduceError {
    fn from(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = LoadError::ProducerFailed {
            name: "x-a".into(),
            reason: "net down".into(),
        };
        assert_eq!(err.as_label(), "producer_failed");
        assert_eq!(
            LoadError::EmptyResult { name: "x-a".into() }.as_label(),
            "empty_result"
        );
    }

    #[test]
    fn test_messages_mention_the_name() {
        let err = LoadError::UnknownDefinition {
            name: "x-missing".into(),
        };
        assert!(err.as_message().contains("x-missing"));
        assert!(err.to_string().contains("x-missing"));
    }

    #[test]
    fn test_retry_eligibility() {
        assert!(LoadError::EmptyResult { name: "x".into() }.is_retryable());
        assert!(!LoadError::UnknownDefinition { name: "x".into() }.is_retryable());
    }

    #[test]
    fn test_produce_error_from_str() {
        let err: ProduceError = "fetch failed".into();
        assert_eq!(err.to_string(), "fetch failed");
    }
}
