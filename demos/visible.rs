//! # Demo: visible
//!
//! Visibility-gated activation: a definition with `defer: true` (the default)
//! does not activate until a matching element comes within the proximity
//! margin. A [`LogWriter`] subscriber prints every lifecycle event.
//!
//! Demonstrates how to:
//! - Configure the margin (`"25%"`) at construction.
//! - Watch elements during the initial discovery pass.
//! - Trigger activation by moving an element closer ([`MemoryHost::approach`]).
//!
//! ## Flow
//! ```text
//! Catalog ──► Loader::run()
//!     ├─► discover(): <x-lazy-card> found at distance 80 → watched
//!     │       (outside the 25% margin: no activation yet)
//!     ├─► host.approach(card, 20) → Entered{card}
//!     ├─► listener: unobserve(card), activate "x-lazy-card" (idle dispatch)
//!     └─► producer() → host.install("x-lazy-card", ctor)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example visible --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use lazy_elements::{
    Catalog, Config, Constructor, Host, LogWriter, MemoryHost, ProduceError, ProducerFn,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A host with one card far below the fold (distance 80 of 100).
    let host = MemoryHost::new();
    let card = host.insert_distant(&host.root(), "x-lazy-card", 80);

    // 2. Margin "25%": the card activates once its distance drops to 25.
    let cfg = Config {
        margin: "25%".to_string(),
        ..Config::default()
    };
    let loader = Catalog::new()
        .with(
            "x-lazy-card",
            ProducerFn::arc(|| async {
                println!("[producer] building x-lazy-card");
                let ctor: Constructor = Arc::new("card-impl");
                Ok::<_, ProduceError>(Some(ctor))
            }),
        )
        .with_subscriber(Arc::new(LogWriter))
        .build(cfg, host.clone());

    // 3. Scroll the card closer step by step.
    for distance in [60, 40, 20] {
        println!("[main] scrolling: card at distance {distance}");
        host.approach(&card, distance);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("[main] installed: {}", host.installed("x-lazy-card"));

    loader.destroy();
    Ok(())
}
