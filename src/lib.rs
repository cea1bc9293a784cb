//! Word-level metadata indexing and navigation for live documents.
//!
//! Attaches out-of-band metadata (timing, confidence, speaker tags) to the
//! words of a document hosted by an external editor, builds a positional
//! index from word index to document anchor through the host's asynchronous
//! search protocol, and serves interactive "jump to word/time" requests over
//! the same shared channel.

pub mod anchors;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod indexer;
pub mod manager;
pub mod metadata;
pub mod navigator;
pub mod protocol;
pub mod search;
pub mod state;

#[cfg(test)]
mod testutil;

pub use config::WordMetaConfig;
pub use error::WordMetaError;
pub use events::WordMetaEvent;
pub use manager::{IndexingStatus, WordMetaManager};
pub use metadata::{WordImport, WordRecord};
