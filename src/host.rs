//! Typed contract with the host document.
//!
//! Commands flow into the host over a channel; results come back on a single
//! shared event stream, out of band from the call that triggered them. The
//! `HostLink` bridges the two: each bounded-wait call registers a one-shot
//! waiter keyed by a correlation token, and a router task hands incoming
//! events to the single interested waiter. Registering a new waiter drops the
//! previous one, which its owner observes as `Superseded`.

use crate::error::WordMetaError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Where the host should start a text search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SearchStart {
    DocumentStart,
    Cursor,
    At { x: f64, y: f64 },
}

/// Placement of a search match in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Commands the core issues to the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HostCommand {
    ListAnchors {
        prefix: String,
        token: u64,
    },
    CreateAnchor {
        name: String,
    },
    DeleteAnchors {
        prefix: String,
    },
    JumpToAnchor {
        name: String,
    },
    SelectEnclosingWord,
    ClearSelection,
    QuerySelection {
        token: u64,
    },
    Search {
        text: String,
        start: SearchStart,
        token: u64,
    },
    /// Chunked custom-property storage for anchor metadata.
    StoreProperties {
        prefix: String,
        chunks: Vec<(String, String)>,
    },
}

/// Events the host delivers on its shared stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum HostEvent {
    AnchorListing { token: u64, names: Vec<String> },
    SelectionState { token: u64, active: bool },
    SearchCompleted { phrase: String, geometry: MatchGeometry },
}

/// A completed search, echoed phrase plus where it landed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub phrase: String,
    pub geometry: MatchGeometry,
}

struct Waiter<T> {
    token: u64,
    tx: oneshot::Sender<T>,
}

struct SearchWaiter {
    token: u64,
    phrase: String,
    tx: oneshot::Sender<SearchMatch>,
}

/// One slot per round-trip kind. A completed search carries no token on the
/// wire, so its slot also records the phrase it is waiting to see echoed.
#[derive(Default)]
struct Waiters {
    listing: Option<Waiter<Vec<String>>>,
    selection: Option<Waiter<bool>>,
    search: Option<SearchWaiter>,
}

pub struct HostLink {
    commands: mpsc::UnboundedSender<HostCommand>,
    waiters: Arc<Mutex<Waiters>>,
    next_token: AtomicU64,
}

impl HostLink {
    /// Wire the link to the host's command and event channels. Spawns the
    /// router task that drains the event stream for the link's lifetime.
    pub fn new(
        commands: mpsc::UnboundedSender<HostCommand>,
        events: mpsc::UnboundedReceiver<HostEvent>,
    ) -> Self {
        let waiters = Arc::new(Mutex::new(Waiters::default()));
        spawn_event_router(Arc::clone(&waiters), events);
        Self {
            commands,
            waiters,
            next_token: AtomicU64::new(1),
        }
    }

    /// Fire-and-forget command. A closed host channel is logged and absorbed;
    /// any round-trip waiting on a reply will resolve by timeout.
    pub fn send(&self, command: HostCommand) {
        if self.commands.send(command).is_err() {
            warn!("[HostLink] host command channel is closed");
        }
    }

    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::SeqCst)
    }

    /// Ask the host for its anchors under `prefix`, waiting at most `wait`.
    pub async fn list_anchors(
        &self,
        prefix: &str,
        wait: Duration,
    ) -> Result<Vec<String>, WordMetaError> {
        let token = self.next_token();
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().listing = Some(Waiter { token, tx });
        self.send(HostCommand::ListAnchors {
            prefix: prefix.to_string(),
            token,
        });

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(names)) => Ok(names),
            Ok(Err(_)) => Err(WordMetaError::Superseded),
            Err(_) => {
                self.drop_listing_interest(token);
                Err(WordMetaError::timeout("anchor listing", wait))
            }
        }
    }

    /// Ask whether the host currently has an active selection.
    pub async fn query_selection(&self, wait: Duration) -> Result<bool, WordMetaError> {
        let token = self.next_token();
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().selection = Some(Waiter { token, tx });
        self.send(HostCommand::QuerySelection { token });

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(active)) => Ok(active),
            Ok(Err(_)) => Err(WordMetaError::Superseded),
            Err(_) => {
                self.drop_selection_interest(token);
                Err(WordMetaError::timeout("selection query", wait))
            }
        }
    }

    /// Issue a search and wait for the host to echo `text` back as a
    /// completed match. Registering the waiter supersedes any search still
    /// waiting, whoever owned it.
    pub async fn await_search(
        &self,
        text: &str,
        start: SearchStart,
        wait: Duration,
    ) -> Result<SearchMatch, WordMetaError> {
        let token = self.next_token();
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().unwrap().search = Some(SearchWaiter {
            token,
            phrase: text.to_string(),
            tx,
        });
        self.send(HostCommand::Search {
            text: text.to_string(),
            start,
            token,
        });

        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(hit)) => Ok(hit),
            Ok(Err(_)) => Err(WordMetaError::Superseded),
            Err(_) => {
                self.drop_search_interest(token);
                Err(WordMetaError::timeout("document search", wait))
            }
        }
    }

    fn drop_listing_interest(&self, token: u64) {
        let mut waiters = self.waiters.lock().unwrap();
        if waiters.listing.as_ref().map(|w| w.token) == Some(token) {
            waiters.listing = None;
        }
    }

    fn drop_selection_interest(&self, token: u64) {
        let mut waiters = self.waiters.lock().unwrap();
        if waiters.selection.as_ref().map(|w| w.token) == Some(token) {
            waiters.selection = None;
        }
    }

    fn drop_search_interest(&self, token: u64) {
        let mut waiters = self.waiters.lock().unwrap();
        if waiters.search.as_ref().map(|w| w.token) == Some(token) {
            waiters.search = None;
        }
    }
}

fn spawn_event_router(waiters: Arc<Mutex<Waiters>>, mut events: mpsc::UnboundedReceiver<HostEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            route_event(&waiters, event);
        }
        debug!("[HostLink] host event stream closed");
    });
}

/// Hand an event to the waiter it correlates with, or drop it. A token or
/// phrase mismatch means the event belongs to a request nobody is waiting on
/// any more; the registered waiter stays put for its own reply.
fn route_event(waiters: &Mutex<Waiters>, event: HostEvent) {
    let mut waiters = waiters.lock().unwrap();
    match event {
        HostEvent::AnchorListing { token, names } => {
            if waiters.listing.as_ref().map(|w| w.token) == Some(token) {
                if let Some(waiter) = waiters.listing.take() {
                    let _ = waiter.tx.send(names);
                }
            } else {
                debug!("[HostLink] dropping anchor listing for stale token {}", token);
            }
        }
        HostEvent::SelectionState { token, active } => {
            if waiters.selection.as_ref().map(|w| w.token) == Some(token) {
                if let Some(waiter) = waiters.selection.take() {
                    let _ = waiter.tx.send(active);
                }
            } else {
                debug!("[HostLink] dropping selection state for stale token {}", token);
            }
        }
        HostEvent::SearchCompleted { phrase, geometry } => {
            let matches = waiters
                .search
                .as_ref()
                .map(|w| w.phrase == phrase)
                .unwrap_or(false);
            if matches {
                if let Some(waiter) = waiters.search.take() {
                    let _ = waiter.tx.send(SearchMatch { phrase, geometry });
                }
            } else {
                debug!("[HostLink] dropping unmatched search result for \"{}\"", phrase);
            }
        }
    }
}
