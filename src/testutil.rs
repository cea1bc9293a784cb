//! Scripted stand-in for the host document, shared by the async tests.
//!
//! The mock owns a flat list of document words. Searches scan that list from
//! the requested start coordinate (x doubles as a word position), so forward
//! search progress behaves like a real document with repeated words. Replies
//! can be switched off per round-trip kind to exercise the timeout paths.

use crate::host::{HostCommand, HostEvent, MatchGeometry, SearchStart};
use crate::metadata::{WordImport, WordRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct MockDoc {
    words: Vec<String>,
    existing_anchors: Vec<String>,
    respond_to_listing: bool,
    respond_to_selection: bool,
    searchable: bool,
    select_succeeds: bool,
    selection_active: bool,
    cursor: f64,
    anchor_positions: HashMap<String, f64>,
    last_match: Option<f64>,
    commands: Vec<HostCommand>,
}

impl MockDoc {
    fn apply(&mut self, command: HostCommand) -> Option<HostEvent> {
        self.commands.push(command.clone());
        match command {
            HostCommand::ListAnchors { prefix, token } => {
                if !self.respond_to_listing {
                    return None;
                }
                let names = self
                    .existing_anchors
                    .iter()
                    .filter(|n| n.starts_with(&prefix))
                    .cloned()
                    .collect();
                Some(HostEvent::AnchorListing { token, names })
            }
            HostCommand::CreateAnchor { name } => {
                if let Some(pos) = self.last_match {
                    self.anchor_positions.insert(name, pos);
                }
                None
            }
            HostCommand::DeleteAnchors { prefix } => {
                self.existing_anchors.retain(|n| !n.starts_with(&prefix));
                None
            }
            HostCommand::JumpToAnchor { name } => {
                if let Some(pos) = self.anchor_positions.get(&name) {
                    self.cursor = *pos;
                }
                None
            }
            HostCommand::SelectEnclosingWord => {
                self.selection_active = self.select_succeeds;
                None
            }
            HostCommand::ClearSelection => {
                self.selection_active = false;
                None
            }
            HostCommand::QuerySelection { token } => {
                if !self.respond_to_selection {
                    return None;
                }
                Some(HostEvent::SelectionState {
                    token,
                    active: self.selection_active,
                })
            }
            HostCommand::Search { text, start, .. } => {
                if !self.searchable {
                    return None;
                }
                let begin = match start {
                    SearchStart::DocumentStart => 0.0,
                    SearchStart::Cursor => self.cursor,
                    SearchStart::At { x, .. } => x,
                } as usize;
                let found = (begin..self.words.len()).find(|i| self.words[*i] == text)?;
                self.selection_active = true;
                self.cursor = found as f64;
                self.last_match = Some(found as f64);
                Some(HostEvent::SearchCompleted {
                    phrase: text,
                    geometry: MatchGeometry {
                        x: found as f64,
                        y: 0.0,
                        width: 1.0,
                        height: 1.0,
                    },
                })
            }
            HostCommand::StoreProperties { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct MockHost {
    doc: Arc<Mutex<MockDoc>>,
}

impl MockHost {
    pub fn new(words: Vec<String>) -> Self {
        Self {
            doc: Arc::new(Mutex::new(MockDoc {
                words,
                existing_anchors: Vec::new(),
                respond_to_listing: true,
                respond_to_selection: true,
                searchable: true,
                select_succeeds: true,
                selection_active: false,
                cursor: 0.0,
                anchor_positions: HashMap::new(),
                last_match: None,
                commands: Vec::new(),
            })),
        }
    }

    pub fn set_existing_anchors(&self, names: Vec<String>) {
        self.doc.lock().unwrap().existing_anchors = names;
    }

    pub fn set_respond_to_listing(&self, respond: bool) {
        self.doc.lock().unwrap().respond_to_listing = respond;
    }

    pub fn set_respond_to_selection(&self, respond: bool) {
        self.doc.lock().unwrap().respond_to_selection = respond;
    }

    pub fn set_searchable(&self, searchable: bool) {
        self.doc.lock().unwrap().searchable = searchable;
    }

    pub fn set_select_succeeds(&self, succeeds: bool) {
        self.doc.lock().unwrap().select_succeeds = succeeds;
    }

    /// Everything the core has asked the host to do, in order.
    pub fn commands(&self) -> Vec<HostCommand> {
        self.doc.lock().unwrap().commands.clone()
    }

    pub fn spawn(
        &self,
        mut commands: mpsc::UnboundedReceiver<HostCommand>,
        events: mpsc::UnboundedSender<HostEvent>,
    ) {
        let doc = Arc::clone(&self.doc);
        tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                let reply = doc.lock().unwrap().apply(command);
                if let Some(event) = reply {
                    let _ = events.send(event);
                }
            }
        });
    }
}

/// Build records for `texts` with half-second spans starting at 0.
pub fn words(texts: &[&str]) -> Vec<WordRecord> {
    let imports = texts
        .iter()
        .enumerate()
        .map(|(i, text)| WordImport {
            word: text.to_string(),
            start: i as f64 * 0.5,
            end: Some(i as f64 * 0.5 + 0.5),
            confidence: 1.0,
            extra: serde_json::Map::new(),
        })
        .collect();
    WordRecord::from_imports(imports).unwrap()
}
