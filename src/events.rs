//! Outbound notifications to collaborators.
//!
//! Events flow one direction, core → embedding frame; the frame drives the
//! core through `protocol` intents instead.
use serde::{Deserialize, Serialize};

/// Event names as constants to prevent typos
pub mod event_names {
    /// An indexing session finished, successfully or exhausted
    pub const INDEX_READY: &str = "index-ready";

    /// A navigation request ended with the word highlighted on screen
    pub const HIGHLIGHT_CONFIRMED: &str = "highlight-confirmed";

    /// A navigation request could not produce a highlight
    pub const HIGHLIGHT_FAILED: &str = "highlight-failed";
}

/// Payload for index-ready event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexReadyPayload {
    pub word_count: usize,
    pub indexed_count: usize,
    pub missing_count: usize,
}

/// Payload for highlight-confirmed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfirmedPayload {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightFailureReason {
    /// No anchor is bound for the requested word
    NoBookmark,
    /// The anchor was reached but selecting the word produced nothing
    SelectionLost,
    /// The fallback relocation search timed out
    SearchTimeout,
}

/// Payload for highlight-failed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightFailedPayload {
    pub index: usize,
    pub reason: HighlightFailureReason,
}

/// The notifications the core emits, tagged for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WordMetaEvent {
    IndexReady(IndexReadyPayload),
    HighlightConfirmed(HighlightConfirmedPayload),
    HighlightFailed(HighlightFailedPayload),
}

impl WordMetaEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WordMetaEvent::IndexReady(_) => event_names::INDEX_READY,
            WordMetaEvent::HighlightConfirmed(_) => event_names::HIGHLIGHT_CONFIRMED,
            WordMetaEvent::HighlightFailed(_) => event_names::HIGHLIGHT_FAILED,
        }
    }
}
