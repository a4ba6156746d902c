//! # Loader: registry façade, activation state machine, lifecycle.
//!
//! The [`Loader`] owns the definition registry, the host handle, the lifecycle
//! event bus, and the observation listener. It is the only component with real
//! ordering concerns; everything else feeds it.
//!
//! ## High-level architecture
//! ```text
//! register(name, producer, opts)          run()
//!     │                                     │
//!     ▼                                     ▼
//! registry: IndexMap<name, Definition>   arm mutation watching + full discovery
//!     │
//!     │ discovery / visibility / load()
//!     ▼
//! activate(name):
//!     Ready?    ── return memoized
//!     Pending?  ── subscribe, await the shared outcome
//!     installed externally? ── adopt as Ready
//!     else      ── mark Pending, invoke producer once
//!                    ├─ Ok(Some) → install (unless define:false) → Ready
//!                    ├─ Ok(None) → EmptyResult, back to Idle
//!                    └─ Err      → ProducerFailed, back to Idle (retryable)
//! ```
//!
//! ## Rules
//! - The registry lock is held only across synchronous sections, never across
//!   an await; the `Pending` check-and-set happens inside it, which is what
//!   makes producer invocation at-most-once.
//! - Failures surface to the asynchronous caller and as bus events; they never
//!   escape observation callbacks or disturb other definitions.
//! - `destroy()` is terminal: watchers disarmed, registry cleared, later
//!   `run()`/`register()` calls are no-ops. An in-flight producer that settles
//!   afterwards is ignored (delivered to waiters, memoized and installed
//!   nowhere).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::defs::{Activation, Constructor, DefineOptions, Definition, Outcome, ProducerRef};
use crate::error::LoadError;
use crate::events::{Bus, Event, EventKind};
use crate::host::{ElementRef, HostRef};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::{listener, schedule, Config, Dispatch};

pub(crate) struct Inner {
    pub(crate) cfg: Config,
    pub(crate) host: HostRef,
    pub(crate) registry: RwLock<IndexMap<String, Definition>>,
    pub(crate) running: AtomicBool,
    armed_mutations: AtomicBool,
    revisions: AtomicU64,
    pub(crate) token: CancellationToken,
    pub(crate) bus: Bus,
}

/// Lazy-registration manager for pluggable element implementations.
///
/// Cheap to clone (a handle onto shared state); all methods take `&self`.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use lazy_elements::{Config, Constructor, Loader, MemoryHost, ProduceError, ProducerFn};
///
/// # async fn demo() -> Result<(), lazy_elements::LoadError> {
/// let host = MemoryHost::new();
/// let loader = Loader::new(Config::default(), host);
///
/// loader.register(
///     "x-widget",
///     ProducerFn::arc(|| async {
///         let ctor: Constructor = Arc::new("widget-impl");
///         Ok::<_, ProduceError>(Some(ctor))
///     }),
///     Default::default(),
/// );
///
/// let ctor = loader.load("x-widget").await?;
/// # let _ = ctor;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Loader {
    pub(crate) inner: Arc<Inner>,
}

/// Builder for constructing a [`Loader`].
///
/// Construction spawns the observation listener (and the subscriber forwarder,
/// when subscribers are attached), so it must happen within a tokio runtime.
pub struct LoaderBuilder {
    cfg: Config,
    host: HostRef,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LoaderBuilder {
    /// Attaches lifecycle event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded
    /// queues; see [`SubscriberSet`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the loader and, when `Config::init` is set, runs it.
    pub fn build(self) -> Loader {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let loader = Loader {
            inner: Arc::new(Inner {
                host: self.host,
                registry: RwLock::new(IndexMap::new()),
                running: AtomicBool::new(false),
                armed_mutations: AtomicBool::new(false),
                revisions: AtomicU64::new(0),
                token: CancellationToken::new(),
                bus,
                cfg: self.cfg,
            }),
        };

        // The proximity facility is configured once; the margin is a
        // construction-time setting.
        loader
            .inner
            .host
            .configure_proximity(&loader.inner.cfg.margin);

        if !self.subscribers.is_empty() {
            spawn_forwarder(&loader, SubscriberSet::new(self.subscribers));
        }
        listener::spawn(loader.clone());

        if loader.inner.cfg.init {
            loader.run();
        }
        loader
    }
}

impl Loader {
    /// Starts building a loader over the given host.
    pub fn builder(cfg: Config, host: HostRef) -> LoaderBuilder {
        LoaderBuilder {
            cfg,
            host,
            subscribers: Vec::new(),
        }
    }

    /// Builds a loader with no subscribers; runs it when `Config::init` is
    /// set (the default).
    pub fn new(cfg: Config, host: HostRef) -> Self {
        Self::builder(cfg, host).build()
    }

    /// Registers (or overwrites) a definition.
    ///
    /// The name is normalized to ASCII lowercase — tag matching is
    /// case-insensitive throughout. If the loader is already running, a
    /// discovery pass scoped to this one definition runs against the root.
    /// No-op after `destroy()`.
    pub fn register(&self, name: &str, producer: ProducerRef, options: DefineOptions) {
        if self.inner.token.is_cancelled() {
            return;
        }
        let name = name.to_ascii_lowercase();
        let options = options.resolve(&self.inner.cfg);
        let revision = self.inner.revisions.fetch_add(1, Ordering::Relaxed);
        {
            let mut registry = self.write();
            registry.insert(
                name.clone(),
                Definition {
                    producer,
                    options,
                    state: Activation::Idle,
                    revision,
                },
            );
        }
        self.publish(Event::new(EventKind::Registered).with_name(name.clone()));

        if self.is_running() {
            let context = self.context();
            self.discover(&context, Some(std::slice::from_ref(&name)));
        }
    }

    /// Registers a definition. Equivalent to [`Loader::register`].
    pub fn define(&self, name: &str, producer: ProducerRef, options: DefineOptions) {
        self.register(name, producer, options);
    }

    /// Arms mutation watching (once, when `Config::observe` is set) and
    /// performs a full discovery pass. Safe to call repeatedly; a second call
    /// only re-discovers, which is idempotent. No-op after `destroy()`.
    pub fn run(&self) {
        if self.inner.token.is_cancelled() {
            return;
        }
        let context = self.context();
        if self.inner.cfg.observe
            && self
                .inner
                .armed_mutations
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.inner.host.observe_mutations(&context);
        }
        self.discover(&context, None);
        if !self.inner.running.swap(true, Ordering::AcqRel) {
            self.publish(Event::new(EventKind::Running));
        }
    }

    /// Disarms both watchers, clears the registry, and renders the loader
    /// permanently inert. In-flight producer calls are not cancelled; their
    /// late results are ignored.
    pub fn destroy(&self) {
        self.inner.running.store(false, Ordering::Release);
        self.inner.host.disconnect_mutations();
        self.inner.host.disconnect_proximity();
        self.write().clear();
        self.publish(Event::new(EventKind::Destroyed));
        self.inner.token.cancel();
    }

    /// Whether `run()` has been called (and `destroy()` has not).
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Subscribes to the raw lifecycle event bus.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Resolves the implementation for `name`, activating it if needed.
    ///
    /// Routes through the same memoization/activation path as automatic
    /// discovery, so manual and automatic activation race safely and converge
    /// on one producer invocation.
    pub async fn load(&self, name: &str) -> Result<Constructor, LoadError> {
        self.activate(&name.to_ascii_lowercase()).await
    }

    /// The root element discovery and observation operate under.
    pub(crate) fn context(&self) -> ElementRef {
        self.inner
            .cfg
            .context
            .clone()
            .unwrap_or_else(|| self.inner.host.root())
    }

    pub(crate) fn publish(&self, ev: Event) {
        self.inner.bus.publish(ev);
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, Definition>> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, Definition>> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire-and-forget activation under a dispatch policy; the outcome
    /// surfaces through bus events.
    pub(crate) fn activate_detached(&self, name: String, dispatch: Dispatch) {
        let loader = self.clone();
        schedule::run(dispatch, async move {
            let _ = loader.activate(&name).await;
        });
    }

    /// The guarded activation path. See the module docs for the state walk.
    pub(crate) async fn activate(&self, name: &str) -> Outcome {
        enum Step {
            Done(Outcome),
            Wait(broadcast::Receiver<Outcome>),
            Invoke {
                producer: ProducerRef,
                install: bool,
                revision: u64,
                tx: broadcast::Sender<Outcome>,
            },
        }

        let step = {
            let mut registry = self.write();
            match registry.get_mut(name) {
                None => Step::Done(Err(LoadError::UnknownDefinition {
                    name: name.to_string(),
                })),
                Some(def) => match &def.state {
                    Activation::Ready(ctor) => Step::Done(Ok(ctor.clone())),
                    Activation::Pending(tx) => Step::Wait(tx.subscribe()),
                    Activation::Idle => {
                        if let Some(ctor) = self.inner.host.lookup(name) {
                            // Finalized externally; adopt without invoking.
                            def.state = Activation::Ready(ctor.clone());
                            Step::Done(Ok(ctor))
                        } else {
                            let (tx, _rx) = broadcast::channel(1);
                            def.state = Activation::Pending(tx.clone());
                            Step::Invoke {
                                producer: def.producer.clone(),
                                install: def.options.define,
                                revision: def.revision,
                                tx,
                            }
                        }
                    }
                },
            }
        };

        match step {
            Step::Done(outcome) => outcome,
            Step::Wait(mut rx) => rx.recv().await.unwrap_or_else(|_| {
                Err(LoadError::ProducerFailed {
                    name: name.to_string(),
                    reason: "activation interrupted".to_string(),
                })
            }),
            Step::Invoke {
                producer,
                install,
                revision,
                tx,
            } => {
                self.publish(Event::new(EventKind::ActivationStarted).with_name(name));

                let outcome: Outcome = match producer.produce().await {
                    Ok(Some(ctor)) => Ok(ctor),
                    Ok(None) => Err(LoadError::EmptyResult {
                        name: name.to_string(),
                    }),
                    Err(err) => Err(LoadError::ProducerFailed {
                        name: name.to_string(),
                        reason: err.to_string(),
                    }),
                };

                // Install before memoizing; never install after destroy.
                if let Ok(ctor) = &outcome {
                    if install && !self.inner.token.is_cancelled() {
                        self.inner.host.install(name, ctor.clone());
                    }
                }

                {
                    let mut registry = self.write();
                    if let Some(def) = registry.get_mut(name) {
                        // A re-registration replaced this definition mid-flight;
                        // leave the fresh one untouched.
                        if def.revision == revision {
                            def.state = match &outcome {
                                Ok(ctor) => Activation::Ready(ctor.clone()),
                                Err(_) => Activation::Idle,
                            };
                        }
                    }
                }

                match &outcome {
                    Ok(_) => self.publish(Event::new(EventKind::Activated).with_name(name)),
                    Err(err) => self.publish(
                        Event::new(EventKind::ActivationFailed)
                            .with_name(name)
                            .with_reason(err.as_message()),
                    ),
                }

                let _ = tx.send(outcome.clone());
                outcome
            }
        }
    }
}

/// Forwards bus events to the subscriber set until the loader is destroyed.
fn spawn_forwarder(loader: &Loader, subs: SubscriberSet) {
    let mut rx = loader.inner.bus.subscribe();
    let token = loader.inner.token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::ProducerFn;
    use crate::host::{Host, MemoryHost};
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn producing(calls: Arc<AtomicU32>, value: u32) -> ProducerRef {
        ProducerFn::arc(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let ctor: Constructor = Arc::new(value);
                Ok(Some(ctor))
            }
        })
    }

    fn quiet_loader(host: &Arc<MemoryHost>) -> Loader {
        let cfg = Config {
            init: false,
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
    async fn test_init_runs_the_loader_at_build() {
        let host = MemoryHost::new();
        let loader = Loader::new(Config::default(), host.clone());
        assert!(loader.is_running());
        loader.destroy();
    }

    #[tokio::test]
    async fn test_subscribers_receive_lifecycle_events() {
        use async_trait::async_trait;

        struct Spy(Arc<AtomicU32>);

        #[async_trait]
        impl Subscribe for Spy {
            async fn on_event(&self, event: &Event) {
                if event.kind == EventKind::Activated {
                    self.0.fetch_add(1, Ordering::SeqCst);
                }
            }

            fn name(&self) -> &'static str {
                "spy"
            }
        }

        let host = MemoryHost::new();
        let seen = Arc::new(AtomicU32::new(0));
        let cfg = Config {
            init: false,
            ..Config::default()
        };
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Spy(seen.clone()))];
        let loader = Loader::builder(cfg, host.clone())
            .with_subscribers(subs)
            .build();

        let calls = Arc::new(AtomicU32::new(0));
        loader.register("x-widget", producing(calls.clone(), 1), Default::default());
        loader.load("x-widget").await.expect("activates");

        wait_for(|| seen.load(Ordering::SeqCst) == 1).await;
    }

    #[tokio::test]
    async fn test_load_unknown_name_rejects_immediately() {
        let host = MemoryHost::new();
        let loader = quiet_loader(&host);
        let err = loader.load("x-missing").await.err().expect("rejection");
        assert_eq!(
            err,
            LoadError::UnknownDefinition {
                name: "x-missing".into()
            }
        );
    }

    #[tokio::test]
    async fn test_widget_in_view_at_run_activates_exactly_once() {
        let host = MemoryHost::new();
        host.insert(&host.root(), "x-widget");

        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register("x-widget", producing(calls.clone(), 1), Default::default());
        loader.run();

        wait_for(|| host.installed("x-widget")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Manual load converges on the memoized result, no second invocation.
        let ctor = loader.load("x-widget").await.expect("memoized");
        let installed = host.lookup("x-widget").expect("installed");
        assert!(Arc::ptr_eq(&ctor, &installed));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_contextual_activates_on_empty_tree() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register(
            "x-eager",
            producing(calls.clone(), 2),
            DefineOptions::new().with_contextual(false),
        );
        loader.run();

        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
        assert!(host.installed("x-eager"));
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_producer_invocation() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let gate = Arc::new(Notify::new());

        let producer: ProducerRef = {
            let calls = calls.clone();
            let gate = gate.clone();
            ProducerFn::arc(move || {
                let calls = calls.clone();
                let gate = gate.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    let ctor: Constructor = Arc::new(9u32);
                    Ok(Some(ctor))
                }
            })
        };

        let loader = quiet_loader(&host);
        loader.register("x-widget", producer, Default::default());

        let mut handles = Vec::new();
        for _ in 0..10 {
            let loader = loader.clone();
            handles.push(tokio::spawn(
                async move { loader.load("x-widget").await },
            ));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.expect("join").expect("activation"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for ctor in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], ctor));
        }
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_retry_converges() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));

        let producer: ProducerRef = {
            let calls = calls.clone();
            ProducerFn::arc(move || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err("network down".into())
                    } else {
                        let ctor: Constructor = Arc::new(3u32);
                        Ok(Some(ctor))
                    }
                }
            })
        };

        let loader = quiet_loader(&host);
        loader.register("x-flaky", producer, Default::default());

        let err = loader.load("x-flaky").await.err().expect("first fails");
        assert_eq!(err.as_label(), "producer_failed");
        assert!(!host.installed("x-flaky"));

        let ctor = loader.load("x-flaky").await.expect("retry succeeds");
        assert_eq!(ctor.downcast_ref::<u32>(), Some(&3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(host.installed("x-flaky"));
    }

    #[tokio::test]
    async fn test_empty_result_is_a_failure() {
        let host = MemoryHost::new();
        let loader = quiet_loader(&host);
        loader.register(
            "x-hollow",
            ProducerFn::arc(|| async { Ok::<Option<Constructor>, crate::ProduceError>(None) }),
            Default::default(),
        );
        let err = loader.load("x-hollow").await.err().expect("empty fails");
        assert_eq!(err.as_label(), "empty_result");
        assert!(!host.installed("x-hollow"));
    }

    #[tokio::test]
    async fn test_externally_installed_name_is_adopted_without_invocation() {
        let host = MemoryHost::new();
        let external: Constructor = Arc::new(5u32);
        host.install("x-widget", external.clone());

        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register("x-widget", producing(calls.clone(), 1), Default::default());

        let ctor = loader.load("x-widget").await.expect("adopted");
        assert!(Arc::ptr_eq(&ctor, &external));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_define_false_memoizes_without_installing() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register(
            "x-shadow",
            producing(calls.clone(), 4),
            DefineOptions::new().with_define(false),
        );

        let first = loader.load("x-shadow").await.expect("activates");
        assert!(!host.installed("x-shadow"));
        let second = loader.load("x-shadow").await.expect("memoized");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_while_running_discovers_scoped() {
        let host = MemoryHost::new();
        host.insert(&host.root(), "x-late");

        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.run();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        loader.register(
            "x-late",
            producing(calls.clone(), 6),
            DefineOptions::new().with_defer(false),
        );
        wait_for(|| calls.load(Ordering::SeqCst) == 1).await;
        assert!(host.installed("x-late"));
    }

    #[tokio::test]
    async fn test_names_match_case_insensitively() {
        let host = MemoryHost::new();
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register("X-Widget", producing(calls.clone(), 7), Default::default());
        let ctor = loader.load("x-WIDGET").await.expect("same definition");
        assert_eq!(ctor.downcast_ref::<u32>(), Some(&7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_destroy_is_terminal() {
        let host = MemoryHost::new();
        host.insert(&host.root(), "x-widget");
        let calls = Arc::new(AtomicU32::new(0));
        let loader = quiet_loader(&host);
        loader.register("x-widget", producing(calls.clone(), 8), Default::default());

        loader.destroy();
        assert!(!loader.is_running());
        assert_eq!(host.watched_count(), 0);
        assert_eq!(
            loader.load("x-widget").await.err().map(|e| e.as_label()),
            Some("unknown_definition")
        );

        // Neither run nor register revive a destroyed loader.
        loader.run();
        assert!(!loader.is_running());
        loader.register("x-widget", producing(calls.clone(), 8), Default::default());
        assert!(loader.load("x-widget").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_late_settle_after_destroy_is_ignored() {
        let host = MemoryHost::new();
        let gate = Arc::new(Notify::new());
        let producer: ProducerRef = {
            let gate = gate.clone();
            ProducerFn::arc(move || {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    let ctor: Constructor = Arc::new(11u32);
                    Ok(Some(ctor))
                }
            })
        };

        let loader = quiet_loader(&host);
        loader.register("x-slow", producer, Default::default());

        let pending = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load("x-slow").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        loader.destroy();
        gate.notify_one();

        // The waiter still gets the outcome, but nothing is installed.
        let result = pending.await.expect("join");
        assert!(result.is_ok());
        assert!(!host.installed("x-slow"));
    }
}
