//! # Demo: eager
//!
//! Minimal demo of a non-contextual definition: activation happens as soon as
//! the loader runs, with zero matching elements required.
//!
//! Demonstrates how to:
//! - Define a producer with [`ProducerFn`].
//! - Register with `contextual: false` via [`DefineOptions`].
//! - Resolve the implementation with [`Loader::load`].
//!
//! ## Flow
//! ```text
//! Catalog ──► Loader::run()
//!     ├─► discover(): contextual=false → activate (eager dispatch)
//!     ├─► producer() resolves
//!     ├─► host.install("x-greeter", ctor)
//!     └─► load("x-greeter") returns the memoized constructor
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example eager
//! ```

use std::sync::Arc;

use lazy_elements::{
    Catalog, Config, Constructor, DefineOptions, MemoryHost, ProduceError, ProducerFn,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. The reference host; note the document tree stays empty.
    let host = MemoryHost::new();

    // 2. Register a non-contextual definition and run.
    let loader = Catalog::new()
        .with_options(
            "x-greeter",
            ProducerFn::arc(|| async {
                println!("[producer] building x-greeter");
                let ctor: Constructor = Arc::new("greeter-impl");
                Ok::<_, ProduceError>(Some(ctor))
            }),
            DefineOptions::new().with_contextual(false),
        )
        .build(Config::default(), host.clone());

    // 3. Point activation converges on the same (single) producer call.
    let ctor = loader.load("x-greeter").await?;
    println!(
        "[main] resolved: {}",
        ctor.downcast_ref::<&str>().copied().unwrap_or("<opaque>")
    );
    println!("[main] installed in host registry: {}", host.installed("x-greeter"));

    loader.destroy();
    Ok(())
}
