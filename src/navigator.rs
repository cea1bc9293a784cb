//! Interactive "go to word" navigation.
//!
//! Requests are debounced: a burst of targets collapses to the newest one,
//! executed after a quiet period so a scrubbing UI cannot starve the indexing
//! engine. Execution runs a short sequential state machine per target --
//! `Jumping -> Selecting -> Verifying -> Confirmed | FallbackSearching` --
//! with the engine paused for the whole of it. The pause guard drops on every
//! exit path, so the engine always resumes within a bounded time of the
//! operation finishing, success or not.

use crate::error::WordMetaError;
use crate::events::{
    HighlightConfirmedPayload, HighlightFailedPayload, HighlightFailureReason, WordMetaEvent,
};
use crate::host::{HostCommand, HostLink};
use crate::search::SearchArbiter;
use crate::state::WordMetaState;
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
enum NavPhase {
    Jumping,
    Selecting,
    Verifying,
    Confirmed,
    FallbackSearching,
}

pub struct HighlightNavigator {
    targets: mpsc::UnboundedSender<usize>,
    state: Arc<WordMetaState>,
}

impl HighlightNavigator {
    pub fn spawn(
        state: Arc<WordMetaState>,
        link: Arc<HostLink>,
        arbiter: Arc<SearchArbiter>,
        notifications: mpsc::UnboundedSender<WordMetaEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = NavigatorTask {
            state: Arc::clone(&state),
            link,
            arbiter,
            notifications,
        };
        tokio::spawn(task.run(rx));
        Self {
            targets: tx,
            state,
        }
    }

    /// Queue a navigation request. Rapid calls collapse to the most recent
    /// target; execution starts after the debounce quiet period.
    pub fn request(&self, index: usize) {
        self.state.highlight.lock().unwrap().pending = Some(index);
        let _ = self.targets.send(index);
    }
}

struct NavigatorTask {
    state: Arc<WordMetaState>,
    link: Arc<HostLink>,
    arbiter: Arc<SearchArbiter>,
    notifications: mpsc::UnboundedSender<WordMetaEvent>,
}

impl NavigatorTask {
    async fn run(self, mut targets: mpsc::UnboundedReceiver<usize>) {
        while let Some(mut target) = targets.recv().await {
            // Quiet period: keep swallowing newer targets until none arrives
            // within the debounce window.
            loop {
                match tokio::time::timeout(self.state.config.debounce(), targets.recv()).await {
                    Ok(Some(newer)) => target = newer,
                    Ok(None) => return,
                    Err(_) => break,
                }
            }
            self.execute(target).await;
        }
    }

    async fn execute(&self, index: usize) {
        let generation = self.state.generation();
        {
            let mut highlight = self.state.highlight.lock().unwrap();
            if highlight.last_highlighted == Some(index) && highlight.has_active_selection {
                highlight.pending = None;
                return;
            }
        }

        let anchor = self
            .state
            .anchors
            .lock()
            .unwrap()
            .get(index)
            .map(String::from);
        let Some(anchor) = anchor else {
            debug!("[Navigator] no bookmark for word {}", index);
            self.fail(index, HighlightFailureReason::NoBookmark);
            return;
        };

        // The engine observes this at its next batch boundary; dropping the
        // guard on any exit path below resumes it.
        let _guard = self.state.pause_indexing();

        let mut phase = NavPhase::Jumping;
        loop {
            if !self.state.is_current(generation) {
                return;
            }
            phase = match phase {
                NavPhase::Jumping => {
                    self.link.send(HostCommand::ClearSelection);
                    self.link.send(HostCommand::JumpToAnchor {
                        name: anchor.clone(),
                    });
                    NavPhase::Selecting
                }
                NavPhase::Selecting => {
                    // Let the host finish the cursor move before selecting.
                    tokio::time::sleep(self.state.config.settle_delay()).await;
                    self.link.send(HostCommand::SelectEnclosingWord);
                    NavPhase::Verifying
                }
                NavPhase::Verifying => {
                    match self
                        .link
                        .query_selection(self.state.config.verify_timeout())
                        .await
                    {
                        Ok(true) => NavPhase::Confirmed,
                        Ok(false) | Err(_) => NavPhase::FallbackSearching,
                    }
                }
                NavPhase::Confirmed => {
                    self.confirm(index);
                    return;
                }
                NavPhase::FallbackSearching => {
                    // The anchor position went stale or ambiguous; relocate
                    // the word by text from where the cursor landed.
                    let text = self
                        .state
                        .store
                        .lock()
                        .unwrap()
                        .get(index)
                        .map(|record| record.word.clone());
                    match text {
                        Some(text) if !text.trim().is_empty() => {
                            match self
                                .arbiter
                                .search_at_cursor(&text, self.state.config.fallback_timeout())
                                .await
                            {
                                // A completed search leaves the match
                                // selected on the host.
                                Ok(_) => NavPhase::Confirmed,
                                Err(WordMetaError::Superseded) => return,
                                Err(_) => {
                                    self.fail(index, HighlightFailureReason::SearchTimeout);
                                    return;
                                }
                            }
                        }
                        _ => {
                            self.fail(index, HighlightFailureReason::SelectionLost);
                            return;
                        }
                    }
                }
            };
        }
    }

    fn confirm(&self, index: usize) {
        {
            let mut highlight = self.state.highlight.lock().unwrap();
            highlight.last_highlighted = Some(index);
            highlight.pending = None;
            highlight.has_active_selection = true;
        }
        debug!("[Navigator] highlight confirmed at word {}", index);
        let _ = self
            .notifications
            .send(WordMetaEvent::HighlightConfirmed(HighlightConfirmedPayload {
                index,
            }));
    }

    fn fail(&self, index: usize, reason: HighlightFailureReason) {
        self.link.send(HostCommand::ClearSelection);
        {
            let mut highlight = self.state.highlight.lock().unwrap();
            highlight.last_highlighted = None;
            highlight.pending = None;
            highlight.has_active_selection = false;
        }
        let _ = self
            .notifications
            .send(WordMetaEvent::HighlightFailed(HighlightFailedPayload {
                index,
                reason,
            }));
    }
}
