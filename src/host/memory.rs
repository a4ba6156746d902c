//! # In-memory reference host.
//!
//! [`MemoryHost`] is a complete [`Host`] backed by a plain in-memory element
//! tree. It exists for the test suite, the demo programs, and non-browser
//! embeddings that want a working host without a real document engine.
//!
//! ## Visibility model
//! Every element carries a `distance` (percent away from the viewport; `0`
//! means fully in view). The proximity margin `"N%"` widens the viewport by
//! `N`: a watched element is *within the margin* when `distance <= N`.
//! [`MemoryHost::approach`] moves an element and delivers `Entered` when a
//! watched element comes within the margin; `observe` on an element already
//! within the margin delivers the initial synthetic intersection check.
//!
//! ## Rules
//! - Tags are normalized to ASCII lowercase at insertion.
//! - `Raw` selectors match nothing (no selector engine here).
//! - Removals detach a whole subtree and publish no events.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use crate::defs::Constructor;

use super::{Element, ElementRef, Host, HostEvent, Selector};

const EVENT_CAPACITY: usize = 256;

/// Handle to one node of a [`MemoryHost`] tree.
struct MemoryElement {
    id: u64,
    tag: String,
}

impl Element for MemoryElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn node_id(&self) -> u64 {
        self.id
    }
}

struct Node {
    tag: String,
    distance: u32,
    parent: Option<u64>,
    children: Vec<u64>,
}

struct State {
    nodes: HashMap<u64, Node>,
    root: u64,
    next_id: u64,
    margin: u32,
    watched: HashSet<u64>,
    mutation_root: Option<u64>,
    installed: HashMap<String, Constructor>,
}

/// In-memory document tree implementing the full [`Host`] contract.
///
/// ## Example
/// ```
/// use lazy_elements::{Element, Host, MemoryHost, Selector};
///
/// let host = MemoryHost::new();
/// let root = host.root();
/// host.insert(&root, "x-widget");
///
/// let found = host.query_all(&root, &Selector::Tag("x-widget".into()));
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].tag(), "x-widget");
/// ```
pub struct MemoryHost {
    state: Mutex<State>,
    events: broadcast::Sender<HostEvent>,
}

impl MemoryHost {
    /// Creates a host with a single `"html"` root element, fully in view.
    pub fn new() -> Arc<Self> {
        let mut nodes = HashMap::new();
        nodes.insert(
            0,
            Node {
                tag: "html".to_string(),
                distance: 0,
                parent: None,
                children: Vec::new(),
            },
        );
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            state: Mutex::new(State {
                nodes,
                root: 0,
                next_id: 1,
                margin: 0,
                watched: HashSet::new(),
                mutation_root: None,
                installed: HashMap::new(),
            }),
            events,
        })
    }

    /// Inserts a new element under `parent`, fully in view (distance 0).
    ///
    /// Publishes `ChildAdded` when mutation watching covers `parent`.
    pub fn insert(&self, parent: &ElementRef, tag: &str) -> ElementRef {
        self.insert_distant(parent, tag, 0)
    }

    /// Inserts a new element under `parent` at the given viewport distance.
    pub fn insert_distant(&self, parent: &ElementRef, tag: &str, distance: u32) -> ElementRef {
        let element = self.create_distant(tag, distance);
        self.attach(parent, &element);
        element
    }

    /// Creates a detached element, fully in view. Attach it (and anything
    /// inserted under it) with [`MemoryHost::attach`].
    pub fn create(&self, tag: &str) -> ElementRef {
        self.create_distant(tag, 0)
    }

    /// Creates a detached element at the given viewport distance.
    pub fn create_distant(&self, tag: &str, distance: u32) -> ElementRef {
        let tag = tag.to_ascii_lowercase();
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.nodes.insert(
            id,
            Node {
                tag: tag.clone(),
                distance,
                parent: None,
                children: Vec::new(),
            },
        );
        handle(id, tag)
    }

    /// Attaches `element` (with its whole subtree) under `parent`.
    ///
    /// Publishes one `ChildAdded` for the attachment root when mutation
    /// watching covers `parent` — inserts into a detached subtree publish
    /// nothing, matching how batched mutation records surface one record per
    /// attachment.
    pub fn attach(&self, parent: &ElementRef, element: &ElementRef) {
        let covered = {
            let mut state = self.lock();
            if let Some(node) = state.nodes.get_mut(&element.node_id()) {
                node.parent = Some(parent.node_id());
            }
            if let Some(node) = state.nodes.get_mut(&parent.node_id()) {
                node.children.push(element.node_id());
            }
            state
                .mutation_root
                .is_some_and(|watched| state.covers(watched, parent.node_id()))
        };
        if covered {
            let _ = self.events.send(HostEvent::ChildAdded {
                element: element.clone(),
            });
        }
    }

    /// Moves an element to a new viewport distance.
    ///
    /// Delivers `Entered` when the element is watched and the new distance is
    /// within the margin.
    pub fn approach(&self, element: &ElementRef, distance: u32) {
        let entered = {
            let mut state = self.lock();
            let margin = state.margin;
            let watched = state.watched.contains(&element.node_id());
            match state.nodes.get_mut(&element.node_id()) {
                Some(node) => {
                    node.distance = distance;
                    watched && distance <= margin
                }
                None => false,
            }
        };
        if entered {
            let _ = self.events.send(HostEvent::Entered {
                element: element.clone(),
            });
        }
    }

    /// Detaches `element` and its whole subtree. Publishes nothing: removals
    /// carry no semantics for the loader.
    pub fn remove(&self, element: &ElementRef) {
        let mut state = self.lock();
        let id = element.node_id();
        if let Some(parent) = state.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(node) = state.nodes.get_mut(&parent) {
                node.children.retain(|&c| c != id);
            }
        }
        let mut drop_ids = vec![id];
        while let Some(next) = drop_ids.pop() {
            if let Some(node) = state.nodes.remove(&next) {
                drop_ids.extend(node.children);
            }
            state.watched.remove(&next);
        }
    }

    /// Number of elements currently under proximity watch (introspection for
    /// tests and diagnostics).
    pub fn watched_count(&self) -> usize {
        self.lock().watched.len()
    }

    /// Whether an implementation is installed under `name`.
    pub fn installed(&self, name: &str) -> bool {
        self.lock()
            .installed
            .contains_key(&name.to_ascii_lowercase())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    /// Whether `node` lies in the subtree rooted at `root` (inclusive).
    fn covers(&self, root: u64, node: u64) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == root {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn node_matches(&self, id: u64, selector: &Selector) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        match selector {
            Selector::Tag(tag) => node.tag.eq_ignore_ascii_case(tag),
            Selector::Undefined(tag) => {
                node.tag.eq_ignore_ascii_case(tag)
                    && !self.installed.contains_key(&tag.to_ascii_lowercase())
            }
            Selector::Raw(_) => false,
        }
    }
}

impl Host for MemoryHost {
    fn root(&self) -> ElementRef {
        let state = self.lock();
        let root = state.root;
        let tag = state
            .nodes
            .get(&root)
            .map(|n| n.tag.clone())
            .unwrap_or_default();
        handle(root, tag)
    }

    fn query_all(&self, root: &ElementRef, selector: &Selector) -> Vec<ElementRef> {
        let state = self.lock();
        let mut found = Vec::new();
        // Pre-order walk, excluding the search root itself.
        let mut stack: Vec<u64> = state
            .nodes
            .get(&root.node_id())
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(id) = stack.pop() {
            if state.node_matches(id, selector) {
                if let Some(node) = state.nodes.get(&id) {
                    found.push(handle(id, node.tag.clone()));
                }
            }
            if let Some(node) = state.nodes.get(&id) {
                stack.extend(node.children.iter().rev());
            }
        }
        found
    }

    fn matches(&self, element: &ElementRef, selector: &Selector) -> bool {
        self.lock().node_matches(element.node_id(), selector)
    }

    fn configure_proximity(&self, margin: &str) {
        self.lock().margin = parse_margin(margin);
    }

    fn observe(&self, element: &ElementRef) {
        let entered = {
            let mut state = self.lock();
            if !state.watched.insert(element.node_id()) {
                return; // already watched
            }
            let margin = state.margin;
            state
                .nodes
                .get(&element.node_id())
                .is_some_and(|n| n.distance <= margin)
        };
        // Initial synthetic intersection check.
        if entered {
            let _ = self.events.send(HostEvent::Entered {
                element: element.clone(),
            });
        }
    }

    fn unobserve(&self, element: &ElementRef) {
        self.lock().watched.remove(&element.node_id());
    }

    fn disconnect_proximity(&self) {
        self.lock().watched.clear();
    }

    fn observe_mutations(&self, root: &ElementRef) {
        self.lock().mutation_root = Some(root.node_id());
    }

    fn disconnect_mutations(&self) {
        self.lock().mutation_root = None;
    }

    fn lookup(&self, name: &str) -> Option<Constructor> {
        self.lock()
            .installed
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    fn install(&self, name: &str, constructor: Constructor) {
        self.lock()
            .installed
            .insert(name.to_ascii_lowercase(), constructor);
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}

fn handle(id: u64, tag: String) -> ElementRef {
    Arc::new(MemoryElement { id, tag })
}

/// Parses a margin expression: `"25%"` or `"25"` → `25`. Anything else → `0`.
fn parse_margin(margin: &str) -> u32 {
    margin
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .unwrap_or(0)
}
