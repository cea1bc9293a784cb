use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for indexing and navigation. All waits are bounded; expiry
/// resolves the waiting call like a "not found" response, never a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordMetaConfig {
    /// Words processed per indexing batch before yielding to the host.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between indexing batches, and the re-arm delay while paused.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Bounded wait for a search issued by the indexing engine.
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
    /// Bounded wait for the host's anchor listing on session start.
    #[serde(default = "default_listing_timeout_ms")]
    pub listing_timeout_ms: u64,
    /// Quiet period before a navigation request is executed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Delay between jumping to an anchor and selecting the enclosing word.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Bounded wait for the selection-state query after highlighting.
    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,
    /// Bounded wait for the navigator's one-off fallback search. Independent
    /// of the engine's search timeout.
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,
}

fn default_batch_size() -> usize {
    4
}

fn default_batch_delay_ms() -> u64 {
    50
}

fn default_search_timeout_ms() -> u64 {
    3000
}

fn default_listing_timeout_ms() -> u64 {
    2000
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_settle_delay_ms() -> u64 {
    150
}

fn default_verify_timeout_ms() -> u64 {
    1000
}

fn default_fallback_timeout_ms() -> u64 {
    1500
}

impl Default for WordMetaConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            search_timeout_ms: default_search_timeout_ms(),
            listing_timeout_ms: default_listing_timeout_ms(),
            debounce_ms: default_debounce_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            verify_timeout_ms: default_verify_timeout_ms(),
            fallback_timeout_ms: default_fallback_timeout_ms(),
        }
    }
}

impl WordMetaConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_millis(self.listing_timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg: WordMetaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.search_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn test_overrides_survive_roundtrip() {
        let cfg: WordMetaConfig =
            serde_json::from_str(r#"{"batch_size": 8, "debounce_ms": 75}"#).unwrap();
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.debounce(), Duration::from_millis(75));
        assert_eq!(cfg.settle_delay_ms, 150);
    }
}
