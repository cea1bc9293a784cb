//! Lazy positional indexing of imported words.
//!
//! The engine discovers or creates an anchor for every word, in small batches
//! with a scheduling delay in between so the host and the interactive UI stay
//! responsive. It first tries to adopt anchors left behind by a previous
//! session; only when the listing yields nothing usable does it wipe the
//! naming-convention namespace and index from scratch. A generation bump is
//! the only way to stop it: every resumption point re-checks the captured
//! generation and bows out silently when stale.

use crate::anchors::{anchor_name, property_chunks, AnchorProperties, ANCHOR_PREFIX};
use crate::error::WordMetaError;
use crate::events::{IndexReadyPayload, WordMetaEvent};
use crate::host::{HostCommand, HostLink};
use crate::indexer::session::{EnginePhase, IndexingSession};
use crate::search::SearchArbiter;
use crate::state::WordMetaState;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct IndexingEngine {
    state: Arc<WordMetaState>,
    link: Arc<HostLink>,
    arbiter: Arc<SearchArbiter>,
    notifications: mpsc::UnboundedSender<WordMetaEvent>,
}

impl IndexingEngine {
    pub fn new(
        state: Arc<WordMetaState>,
        link: Arc<HostLink>,
        arbiter: Arc<SearchArbiter>,
        notifications: mpsc::UnboundedSender<WordMetaEvent>,
    ) -> Self {
        Self {
            state,
            link,
            arbiter,
            notifications,
        }
    }

    /// Start a session for the currently imported words under a fresh
    /// generation, invalidating whatever was still in flight.
    pub fn start(self: &Arc<Self>) {
        let generation = self.state.bump_generation();
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.run(generation).await;
        });
    }

    async fn run(&self, generation: u64) {
        let word_count = self.state.store.lock().unwrap().len();
        if word_count == 0 {
            return;
        }

        self.state.set_engine_phase(EnginePhase::AwaitingExistingAnchors);
        info!(
            "[Indexer] session {} started for {} words",
            generation, word_count
        );

        let listing = self
            .link
            .list_anchors(ANCHOR_PREFIX, self.state.config.listing_timeout())
            .await;
        if !self.state.is_current(generation) {
            return;
        }

        let adopted = match listing {
            Ok(names) => self.state.anchors.lock().unwrap().adopt(&names, word_count),
            Err(e) => {
                debug!("[Indexer] anchor listing unavailable: {}", e);
                0
            }
        };

        if adopted == 0 {
            // Nothing usable survived from a previous session: wipe our
            // namespace on the host and index everything.
            self.state.set_engine_phase(EnginePhase::ResettingAnchors);
            self.link.send(HostCommand::DeleteAnchors {
                prefix: ANCHOR_PREFIX.to_string(),
            });
            self.state.anchors.lock().unwrap().clear();
            self.arbiter.reset_progress();
        } else {
            info!("[Indexer] adopted {} anchors from a previous session", adopted);
        }

        let pending = self
            .state
            .anchors
            .lock()
            .unwrap()
            .missing_indices(word_count);
        let mut session = IndexingSession::new(generation, pending);
        self.state.set_engine_phase(EnginePhase::IndexingBatches);

        loop {
            if !self.state.is_current(generation) {
                return;
            }
            // The pause flag is only observed here, between batches. A paused
            // engine re-arms itself on the batch delay instead of spinning.
            if self.state.is_indexing_paused() {
                tokio::time::sleep(self.state.config.batch_delay()).await;
                continue;
            }

            let batch = session.next_batch(self.state.config.batch_size);
            if batch.is_empty() {
                break;
            }
            for index in batch {
                self.index_word(generation, &mut session, index).await;
                if !self.state.is_current(generation) {
                    return;
                }
            }
            tokio::time::sleep(self.state.config.batch_delay()).await;
        }

        if !self.state.is_current(generation) {
            return;
        }
        self.state.set_engine_phase(EnginePhase::Idle);

        let indexed_count = self.state.anchors.lock().unwrap().len();
        let report = IndexReadyPayload {
            word_count,
            indexed_count,
            missing_count: session.missing(),
        };
        info!(
            "[Indexer] session {} finished: {}/{} indexed, {} missing",
            generation, report.indexed_count, report.word_count, report.missing_count
        );
        let _ = self.notifications.send(WordMetaEvent::IndexReady(report));
    }

    /// Resolve one word to an anchor. Timeout and supersession leave the word
    /// unindexed; a later re-import is the only retry.
    async fn index_word(&self, generation: u64, session: &mut IndexingSession, index: usize) {
        let text = match self.state.store.lock().unwrap().get(index) {
            Some(record) => record.word.clone(),
            None => return,
        };
        if text.trim().is_empty() {
            debug!("[Indexer] word {} has no text, skipping", index);
            return;
        }

        match self
            .arbiter
            .search_forward(&text, self.state.config.search_timeout())
            .await
        {
            Ok(_) => {
                if !self.state.is_current(generation) {
                    return;
                }
                if self.bind_anchor(index).is_some() {
                    session.record_done();
                }
            }
            Err(WordMetaError::Superseded) => {
                debug!("[Indexer] search for word {} was superseded", index);
            }
            Err(e) => {
                debug!("[Indexer] word {} left unindexed: {}", index, e);
            }
        }
    }

    /// Create and register the anchor for `index` at the current match.
    /// Idempotent: an already-bound index returns its existing anchor without
    /// another host command.
    pub fn bind_anchor(&self, index: usize) -> Option<String> {
        let record = {
            let store = self.state.store.lock().unwrap();
            let record = store.get(index)?;
            AnchorProperties {
                index,
                start: record.start,
                end: record.end,
                confidence: record.confidence,
            }
        };

        let name = {
            let mut anchors = self.state.anchors.lock().unwrap();
            if let Some(existing) = anchors.get(index) {
                return Some(existing.to_string());
            }
            let name = anchor_name(index, record.start);
            if !anchors.bind(index, name.clone()) {
                return None;
            }
            name
        };

        self.link.send(HostCommand::CreateAnchor { name: name.clone() });
        if let Ok(json) = serde_json::to_string(&record) {
            self.link.send(HostCommand::StoreProperties {
                prefix: name.clone(),
                chunks: property_chunks(&name, &json),
            });
        }
        Some(name)
    }
}
