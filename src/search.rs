//! Arbitration over the host's single search context.
//!
//! Two consumers share it: the indexing engine walking the document forward,
//! and the navigator's one-off fallback relocation. Both go through here so
//! every search clears the selection first and resolves by the newest-token
//! rule in the `HostLink`. Only the engine's forward walk advances the saved
//! start position; that is what keeps repeated words resolving left-to-right
//! instead of matching the same spot ten times.

use crate::error::WordMetaError;
use crate::host::{HostCommand, HostLink, SearchMatch, SearchStart};
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct SearchArbiter {
    link: Arc<HostLink>,
    next_start: Mutex<SearchStart>,
}

impl SearchArbiter {
    pub fn new(link: Arc<HostLink>) -> Self {
        Self {
            link,
            next_start: Mutex::new(SearchStart::DocumentStart),
        }
    }

    /// Restart forward progress from the top of the document.
    pub fn reset_progress(&self) {
        *self.next_start.lock().unwrap() = SearchStart::DocumentStart;
    }

    /// Search for `text` from wherever the last forward match left off, and
    /// advance the start position past the new match.
    pub async fn search_forward(
        &self,
        text: &str,
        wait: Duration,
    ) -> Result<SearchMatch, WordMetaError> {
        let start = *self.next_start.lock().unwrap();
        self.link.send(HostCommand::ClearSelection);
        let hit = self.link.await_search(text, start, wait).await?;

        let geometry = hit.geometry;
        *self.next_start.lock().unwrap() = SearchStart::At {
            x: geometry.x + geometry.width,
            y: geometry.y,
        };
        debug!(
            "[Search] \"{}\" matched at ({}, {})",
            text, geometry.x, geometry.y
        );
        Ok(hit)
    }

    /// One-off search anchored at the host cursor. Does not move the forward
    /// start position.
    pub async fn search_at_cursor(
        &self,
        text: &str,
        wait: Duration,
    ) -> Result<SearchMatch, WordMetaError> {
        self.link.send(HostCommand::ClearSelection);
        self.link.await_search(text, SearchStart::Cursor, wait).await
    }
}
