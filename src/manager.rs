//! Facade over the word-metadata subsystem.
//!
//! Owns the shared state and the component wiring for one hosted document.
//! Callers (the message-protocol layer) go through here; the host document is
//! reached through the command/event channels handed to `new`.

use crate::config::WordMetaConfig;
use crate::error::WordMetaError;
use crate::events::WordMetaEvent;
use crate::host::{HostCommand, HostEvent, HostLink};
use crate::indexer::{EnginePhase, IndexingEngine};
use crate::metadata::{TimeRange, WordImport, WordRecord};
use crate::navigator::HighlightNavigator;
use crate::search::SearchArbiter;
use crate::state::WordMetaState;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Snapshot of indexing readiness for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub loaded: bool,
    pub word_count: usize,
    pub indexed_count: usize,
    pub phase: EnginePhase,
    pub generation: u64,
}

pub struct WordMetaManager {
    state: Arc<WordMetaState>,
    link: Arc<HostLink>,
    arbiter: Arc<SearchArbiter>,
    engine: Arc<IndexingEngine>,
    navigator: HighlightNavigator,
}

impl WordMetaManager {
    /// Wire up the subsystem for one document. `commands` feeds the host,
    /// `events` is its shared event stream. The returned receiver carries the
    /// outbound notifications (`index-ready`, highlight outcomes).
    pub fn new(
        config: WordMetaConfig,
        commands: mpsc::UnboundedSender<HostCommand>,
        events: mpsc::UnboundedReceiver<HostEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<WordMetaEvent>) {
        let state = Arc::new(WordMetaState::new(config));
        let link = Arc::new(HostLink::new(commands, events));
        let arbiter = Arc::new(SearchArbiter::new(Arc::clone(&link)));
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        let engine = Arc::new(IndexingEngine::new(
            Arc::clone(&state),
            Arc::clone(&link),
            Arc::clone(&arbiter),
            notify_tx.clone(),
        ));
        let navigator = HighlightNavigator::spawn(
            Arc::clone(&state),
            Arc::clone(&link),
            Arc::clone(&arbiter),
            notify_tx,
        );

        (
            Self {
                state,
                link,
                arbiter,
                engine,
                navigator,
            },
            notify_rx,
        )
    }

    /// Replace the metadata with a validated import and start indexing it.
    /// Returns how many words were imported.
    pub fn import(&self, payload: Vec<WordImport>) -> Result<usize, WordMetaError> {
        let records = WordRecord::from_imports(payload)?;
        let count = records.len();

        // Invalidate in-flight work before the new state becomes visible.
        self.state.bump_generation();
        self.state.anchors.lock().unwrap().clear();
        self.state.highlight.lock().unwrap().reset();
        self.state.store.lock().unwrap().replace(records);
        self.arbiter.reset_progress();

        info!("[WordMeta] imported {} words", count);
        if count > 0 {
            self.engine.start();
        }
        Ok(count)
    }

    /// Drop all metadata and derived state. Host anchors are left in place
    /// for a later session to adopt.
    pub fn clear(&self) {
        self.state.bump_generation();
        self.state.store.lock().unwrap().clear();
        self.state.anchors.lock().unwrap().clear();
        self.state.highlight.lock().unwrap().reset();
        self.state.set_engine_phase(EnginePhase::Idle);
        self.arbiter.reset_progress();
        self.link.send(HostCommand::ClearSelection);
        info!("[WordMeta] cleared");
    }

    pub fn is_loaded(&self) -> bool {
        self.state.store.lock().unwrap().is_loaded()
    }

    pub fn word_count(&self) -> usize {
        self.state.store.lock().unwrap().len()
    }

    pub fn word(&self, index: usize) -> Result<WordRecord, WordMetaError> {
        self.state
            .store
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .ok_or_else(|| WordMetaError::not_found(format!("word {}", index)))
    }

    pub fn all_words(&self) -> Vec<WordRecord> {
        self.state.store.lock().unwrap().all().to_vec()
    }

    pub fn export(&self) -> Vec<WordImport> {
        self.state.store.lock().unwrap().export()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.state.store.lock().unwrap().time_range()
    }

    pub fn find_by_time(&self, time: f64) -> Option<usize> {
        self.state.store.lock().unwrap().find_by_time(time)
    }

    pub fn find_by_property(&self, key: &str, value: &Value) -> Vec<usize> {
        self.state.store.lock().unwrap().find_by_property(key, value)
    }

    pub fn anchor(&self, index: usize) -> Option<String> {
        self.state.anchors.lock().unwrap().get(index).map(String::from)
    }

    pub fn has_anchor(&self, index: usize) -> bool {
        self.state.anchors.lock().unwrap().contains(index)
    }

    /// Queue a debounced navigation to `index`. The synchronous return is the
    /// "has bookmark" flag; the eventual outcome arrives as a notification.
    pub fn navigate_to_index(&self, index: usize) -> Result<bool, WordMetaError> {
        if index >= self.word_count() {
            return Err(WordMetaError::not_found(format!("word {}", index)));
        }
        let found = self.has_anchor(index);
        self.navigator.request(index);
        Ok(found)
    }

    /// Resolve `time` to a word via the time lookup, then navigate to it.
    pub fn navigate_to_time(&self, time: f64) -> Result<bool, WordMetaError> {
        let index = self
            .find_by_time(time)
            .ok_or_else(|| WordMetaError::not_found(format!("word at {}s", time)))?;
        self.navigate_to_index(index)
    }

    pub fn status(&self) -> IndexingStatus {
        IndexingStatus {
            loaded: self.is_loaded(),
            word_count: self.word_count(),
            indexed_count: self.state.anchors.lock().unwrap().len(),
            phase: self.state.engine_phase(),
            generation: self.state.generation(),
        }
    }
}
