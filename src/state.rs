use crate::anchors::AnchorRegistry;
use crate::config::WordMetaConfig;
use crate::indexer::EnginePhase;
use crate::metadata::MetadataStore;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Most recently confirmed on-screen highlight, plus the target a debounced
/// navigation is still heading for.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HighlightState {
    pub last_highlighted: Option<usize>,
    pub pending: Option<usize>,
    pub has_active_selection: bool,
}

impl HighlightState {
    pub fn reset(&mut self) {
        *self = HighlightState::default();
    }
}

/// Shared state for the word-metadata subsystem. One instance per document,
/// passed explicitly to every component.
///
/// The mutexes guard plain data and are never held across an await point.
/// Cancellation of in-flight async work goes through `generation`: every
/// callback captures the generation it was started under and becomes a no-op
/// once a newer one exists.
pub struct WordMetaState {
    pub config: WordMetaConfig,
    pub store: Mutex<MetadataStore>,
    pub anchors: Mutex<AnchorRegistry>,
    pub highlight: Mutex<HighlightState>,
    pub engine_phase: Mutex<EnginePhase>,
    generation: AtomicU64,
    indexing_paused: AtomicBool,
}

impl WordMetaState {
    pub fn new(config: WordMetaConfig) -> Self {
        Self {
            config,
            store: Mutex::new(MetadataStore::new()),
            anchors: Mutex::new(AnchorRegistry::new()),
            highlight: Mutex::new(HighlightState::default()),
            engine_phase: Mutex::new(EnginePhase::Idle),
            generation: AtomicU64::new(0),
            indexing_paused: AtomicBool::new(false),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate all in-flight work and return the new generation.
    pub fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn is_indexing_paused(&self) -> bool {
        self.indexing_paused.load(Ordering::SeqCst)
    }

    /// Suspend the indexing engine at its next batch boundary. The flag is
    /// cleared when the returned guard drops, whatever path got it there.
    pub fn pause_indexing(self: &Arc<Self>) -> PauseGuard {
        self.indexing_paused.store(true, Ordering::SeqCst);
        PauseGuard {
            state: Arc::clone(self),
        }
    }

    pub fn engine_phase(&self) -> EnginePhase {
        *self.engine_phase.lock().unwrap()
    }

    pub fn set_engine_phase(&self, phase: EnginePhase) {
        *self.engine_phase.lock().unwrap() = phase;
    }
}

/// Clears the indexing pause flag on drop.
pub struct PauseGuard {
    state: Arc<WordMetaState>,
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.state.indexing_paused.store(false, Ordering::SeqCst);
    }
}
