//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints loader events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and the demo programs.
//!
//! ## Output format
//! ```text
//! [registered] name=x-widget
//! [running]
//! [discovered] name=x-widget matched=2
//! [watched] name=x-widget tag=x-widget
//! [entered] tag=x-widget
//! [activating] name=x-widget
//! [activated] name=x-widget
//! [activation-failed] name=x-widget reason="fetch failed"
//! [destroyed]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
#[derive(Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Registered => {
                println!("[registered] name={:?}", e.name);
            }
            EventKind::Running => {
                println!("[running]");
            }
            EventKind::Destroyed => {
                println!("[destroyed]");
            }
            EventKind::DiscoveryPass => {
                println!("[discovered] name={:?} matched={:?}", e.name, e.matched);
            }
            EventKind::Watched => {
                println!("[watched] name={:?} tag={:?}", e.name, e.tag);
            }
            EventKind::Entered => {
                println!("[entered] tag={:?}", e.tag);
            }
            EventKind::ActivationStarted => {
                println!("[activating] name={:?}", e.name);
            }
            EventKind::Activated => {
                println!("[activated] name={:?}", e.name);
            }
            EventKind::ActivationFailed => {
                println!("[activation-failed] name={:?} reason={:?}", e.name, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
