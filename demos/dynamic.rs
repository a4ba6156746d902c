//! # Demo: dynamic
//!
//! Mutation-driven discovery: definitions registered up front, matching
//! elements inserted only after `run()`. Every insertion under the watched
//! root re-runs discovery scoped to the added subtree; removals do nothing.
//!
//! Demonstrates how to:
//! - Run a loader over a tree with no matches yet.
//! - Insert elements later and watch them activate.
//! - Observe lifecycle events from the raw bus (no subscribers needed).
//!
//! ## Flow
//! ```text
//! Catalog ──► Loader::run()  (nothing to discover yet)
//!     │
//!     ├─► host.insert(root, "x-note") → ChildAdded{note}
//!     │        └─► listener: discover(note) → activate "x-note"
//!     │
//!     └─► host.remove(note)  → (nothing: removals carry no semantics)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example dynamic
//! ```

use std::sync::Arc;
use std::time::Duration;

use lazy_elements::{
    Catalog, Config, Constructor, DefineOptions, EventKind, Host, MemoryHost, ProduceError,
    ProducerFn,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let host = MemoryHost::new();

    // 1. Register before any matching element exists; activate on sight
    //    (defer: false) so insertion alone is enough.
    let loader = Catalog::new()
        .with_options(
            "x-note",
            ProducerFn::arc(|| async {
                println!("[producer] building x-note");
                let ctor: Constructor = Arc::new("note-impl");
                Ok::<_, ProduceError>(Some(ctor))
            }),
            DefineOptions::new().with_defer(false),
        )
        .build(Config::default(), host.clone());

    // 2. Tail the raw event bus.
    let mut events = loader.events();
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            if ev.kind == EventKind::Activated {
                println!("[events] activated: {:?}", ev.name);
            }
        }
    });

    println!("[main] running with an empty tree; nothing to activate yet");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // 3. Insert a matching element after the fact.
    let note = host.insert(&host.root(), "x-note");
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("[main] installed: {}", host.installed("x-note"));

    // 4. Removal is a non-event.
    host.remove(&note);
    tokio::time::sleep(Duration::from_millis(50)).await;

    loader.destroy();
    Ok(())
}
