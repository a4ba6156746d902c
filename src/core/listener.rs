//! # Observation listener.
//!
//! One spawned task per loader drains the host's observation events and routes
//! them back into the core:
//!
//! ```text
//! Host ──► broadcast<HostEvent> ──► listener
//!            Entered{el}    ─► unobserve(el) first, then activate el.tag (Idle)
//!            ChildAdded{el} ─► tag ignored? drop : discover(el, all)
//! ```
//!
//! ## Rules
//! - Unwatch happens before activation so a synchronous re-entry into
//!   discovery cannot double-trigger the same element.
//! - An `Entered` tag with no registered definition is ignored.
//! - Removals never arrive here; hosts report added elements only.
//! - The task exits when the loader is destroyed (token) or the host channel
//!   closes. Lagged receivers skip ahead: a lost observation is re-covered by
//!   a later discovery pass.

use tokio::sync::broadcast::error::RecvError;

use crate::events::{Event, EventKind};
use crate::host::{Element, ElementRef, HostEvent};

use super::{Dispatch, Loader};

/// Spawns the listener task. Called once, at loader construction.
pub(crate) fn spawn(loader: Loader) {
    let mut rx = loader.inner.host.subscribe();
    let token = loader.inner.token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(HostEvent::Entered { element }) => on_entered(&loader, &element),
                    Ok(HostEvent::ChildAdded { element }) => on_added(&loader, &element),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(_)) => continue,
                }
            }
        }
    });
}

/// A watched element came within the margin.
fn on_entered(loader: &Loader, element: &ElementRef) {
    loader.inner.host.unobserve(element);
    let tag = element.tag().to_ascii_lowercase();
    if !loader.read().contains_key(&tag) {
        return; // not one of ours
    }
    loader.publish(Event::new(EventKind::Entered).with_tag(tag.clone()));
    loader.activate_detached(tag, Dispatch::Idle);
}

/// An element was inserted somewhere under the watched root.
fn on_added(loader: &Loader, element: &ElementRef) {
    if loader.inner.cfg.is_ignored(element.tag()) {
        return;
    }
    loader.discover(element, None);
}

#[cfg(test)]
mod tests {
    use crate::defs::{Constructor, DefineOptions, ProducerFn, ProducerRef};
    use crate::host::{Host, MemoryHost};
    use crate::{Config, Loader};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn producing(calls: Arc<AtomicU32>) -> ProducerRef {
        ProducerFn::arc(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let ctor: Constructor = Arc::new(());
                Ok(Some(ctor))
            }
        })
    }

    fn quiet_loader_with_margin(host: &Arc<MemoryHost>, margin: &str) -> Loader {
        let cfg = Config {
            init: false,
            margin: margin.to_string(),
            ..Config::default()
        };
        Loader::new(cfg, host.clone())
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        for _ in 0..500 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn test_entering_the_margin_activates_and_unwatches() {
        let host = MemoryHost::new();
        let el = host.insert_distant(&host.root(), "x-a", 80);

        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader_with_margin(&host, "25%");
        loader.register("x-a", producing(calls.clone()), Default::default());
        loader.run();

        wait_for(|| host.watched_count() == 1).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        host.approach(&el, 20);
        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
        assert!(host.installed("x-a"));
        assert_eq!(host.watched_count(), 0);

        // Further movement cannot re-trigger.
        host.approach(&el, 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_element_already_within_margin_activates_at_watch_start() {
        let host = MemoryHost::new();
        host.insert(&host.root(), "x-a"); // distance 0, inside any margin

        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader_with_margin(&host, "0%");
        loader.register("x-a", producing(calls.clone()), Default::default());
        loader.run();

        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
        assert!(host.installed("x-a"));
    }

    #[tokio::test]
    async fn test_insertion_after_run_triggers_discovery() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader_with_margin(&host, "0%");
        loader.register(
            "x-a",
            producing(calls.clone()),
            DefineOptions::new().with_defer(false),
        );
        loader.run();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        host.insert(&host.root(), "x-a");
        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
        assert!(host.installed("x-a"));
    }

    #[tokio::test]
    async fn test_ignored_tags_suppress_subtree_rediscovery() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader_with_margin(&host, "0%");
        loader.register(
            "x-a",
            producing(calls.clone()),
            DefineOptions::new().with_defer(false),
        );
        loader.run();

        // Build a detached <template> subtree holding a matching element,
        // then attach it: the only mutation event carries the ignored tag.
        let tpl = host.create("template");
        host.insert(&tpl, "x-a");
        host.attach(&host.root(), &tpl);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // The same shape under a scanworthy tag is picked up.
        let div = host.create("div");
        host.insert(&div, "x-a");
        host.attach(&host.root(), &div);
        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
    }

    #[tokio::test]
    async fn test_removals_cause_no_action() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader_with_margin(&host, "0%");
        loader.register(
            "x-a",
            producing(calls.clone()),
            DefineOptions::new().with_defer(false),
        );
        loader.run();

        let div = host.insert(&host.root(), "div");
        host.remove(&div);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(loader.is_running());
    }

    #[tokio::test]
    async fn test_entered_for_unknown_tag_is_ignored() {
        let host = MemoryHost::new();
        let el = host.insert(&host.root(), "x-nobody");
        let loader = quiet_loader_with_margin(&host, "0%");
        loader.run();

        // Watch by hand; the synthetic entry hits the listener with a tag the
        // registry has never seen.
        host.observe(&el);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!host.installed("x-nobody"));
    }
}
