//! Intent/reply envelopes by which an outer application frame drives the
//! subsystem. Request/response framing and the transport itself live with the
//! frame; this layer only defines the messages and maps them onto the
//! manager.

use crate::error::WordMetaError;
use crate::manager::{IndexingStatus, WordMetaManager};
use crate::metadata::{TimeRange, WordImport, WordRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ==============================================================================
// 1. Envelopes
// ==============================================================================

/// The causality envelope for intents coming in from the frame.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WordMetaIntentEnvelope {
    pub id: Uuid,
    pub timestamp: u64, // ms since epoch
    pub intent: WordMetaIntent,
}

impl WordMetaIntentEnvelope {
    pub fn new(intent: WordMetaIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().timestamp_millis() as u64,
            intent,
        }
    }
}

/// The envelope for replies going back out.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WordMetaReplyEnvelope {
    pub id: Uuid,
    pub timestamp: u64,
    pub causality_id: Option<String>, // id of the intent this answers
    pub reply: WordMetaReply,
}

// ==============================================================================
// 2. Intents
// ==============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "payload")]
pub enum WordMetaIntent {
    ImportWords { words: Vec<WordImport> },
    ClearWords,
    GetWord { index: usize },
    GetAllWords,
    ExportWords,
    GetTimeRange,
    FindByTime { time: f64 },
    FindByProperty { key: String, value: Value },
    NavigateToWord { index: usize },
    NavigateToTime { time: f64 },
    QueryAnchor { index: usize },
    QueryStatus,
}

// ==============================================================================
// 3. Replies
// ==============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", content = "payload")]
pub enum WordMetaReply {
    Imported { word_count: usize },
    Cleared,
    Word { word: WordRecord },
    AllWords { words: Vec<WordRecord> },
    Exported { words: Vec<WordImport> },
    TimeRange { range: Option<TimeRange> },
    TimeIndex { index: Option<usize> },
    PropertyMatches { indices: Vec<usize> },
    /// Synchronous "has bookmark" answer; the navigation outcome itself
    /// arrives later on the notification stream.
    Navigation { found: bool },
    Anchor { index: usize, name: Option<String> },
    Status(IndexingStatus),
    Failed { error: WordMetaError },
}

// ==============================================================================
// 4. Dispatch
// ==============================================================================

pub fn handle_intent(manager: &WordMetaManager, intent: WordMetaIntent) -> WordMetaReply {
    match intent {
        WordMetaIntent::ImportWords { words } => match manager.import(words) {
            Ok(word_count) => WordMetaReply::Imported { word_count },
            Err(error) => WordMetaReply::Failed { error },
        },
        WordMetaIntent::ClearWords => {
            manager.clear();
            WordMetaReply::Cleared
        }
        WordMetaIntent::GetWord { index } => match manager.word(index) {
            Ok(word) => WordMetaReply::Word { word },
            Err(error) => WordMetaReply::Failed { error },
        },
        WordMetaIntent::GetAllWords => WordMetaReply::AllWords {
            words: manager.all_words(),
        },
        WordMetaIntent::ExportWords => WordMetaReply::Exported {
            words: manager.export(),
        },
        WordMetaIntent::GetTimeRange => WordMetaReply::TimeRange {
            range: manager.time_range(),
        },
        WordMetaIntent::FindByTime { time } => WordMetaReply::TimeIndex {
            index: manager.find_by_time(time),
        },
        WordMetaIntent::FindByProperty { key, value } => WordMetaReply::PropertyMatches {
            indices: manager.find_by_property(&key, &value),
        },
        WordMetaIntent::NavigateToWord { index } => match manager.navigate_to_index(index) {
            Ok(found) => WordMetaReply::Navigation { found },
            Err(WordMetaError::NotFound { .. }) => WordMetaReply::Navigation { found: false },
            Err(error) => WordMetaReply::Failed { error },
        },
        WordMetaIntent::NavigateToTime { time } => match manager.navigate_to_time(time) {
            Ok(found) => WordMetaReply::Navigation { found },
            Err(WordMetaError::NotFound { .. }) => WordMetaReply::Navigation { found: false },
            Err(error) => WordMetaReply::Failed { error },
        },
        WordMetaIntent::QueryAnchor { index } => WordMetaReply::Anchor {
            index,
            name: manager.anchor(index),
        },
        WordMetaIntent::QueryStatus => WordMetaReply::Status(manager.status()),
    }
}

/// Answer an enveloped intent, threading its id through as causality.
pub fn handle_envelope(
    manager: &WordMetaManager,
    envelope: WordMetaIntentEnvelope,
) -> WordMetaReplyEnvelope {
    let reply = handle_intent(manager, envelope.intent);
    WordMetaReplyEnvelope {
        id: Uuid::new_v4(),
        timestamp: Utc::now().timestamp_millis() as u64,
        causality_id: Some(envelope.id.to_string()),
        reply,
    }
}
