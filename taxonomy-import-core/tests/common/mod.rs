//! In-memory stand-in for both CMS APIs, shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taxonomy_import_core::contract::{
    CreatedFolder, Discovery, FolderNode, NewFolder, NodeQuery, Shape, WriteError, Writer,
};
use taxonomy_import_core::path;
use taxonomy_import_core::slug::slug;

#[derive(Default)]
struct State {
    nodes: Vec<(FolderNode, bool)>,
    next_id: usize,
    creates: usize,
    finds: usize,
    publishes: Vec<(String, String)>,
    fail_create_for: Vec<String>,
    indexing: bool,
}

/// Folder tree shared by a Discovery and a Writer view. Clones share state.
#[derive(Clone)]
pub struct FakeStore {
    state: Arc<Mutex<State>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                indexing: true,
                ..State::default()
            })),
        }
    }

    pub fn creates(&self) -> usize {
        self.state.lock().unwrap().creates
    }

    pub fn finds(&self) -> usize {
        self.state.lock().unwrap().finds
    }

    pub fn publishes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().publishes.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .nodes
            .iter()
            .map(|(n, _)| n.path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Creates of a folder with this name fail with a remote error.
    pub fn fail_create_for(&self, name: &str) {
        self.state.lock().unwrap().fail_create_for.push(name.to_string());
    }

    /// While off, new folders are invisible to `find_node` (index lag).
    pub fn set_indexing(&self, on: bool) {
        self.state.lock().unwrap().indexing = on;
    }

    /// Makes every folder visible to `find_node`.
    pub fn reindex(&self) {
        for entry in self.state.lock().unwrap().nodes.iter_mut() {
            entry.1 = true;
        }
    }
}

#[async_trait]
impl Discovery for FakeStore {
    async fn find_node<'a>(&self, query: NodeQuery<'a>) -> Option<FolderNode> {
        let mut state = self.state.lock().unwrap();
        state.finds += 1;
        state
            .nodes
            .iter()
            .filter(|(_, indexed)| *indexed)
            .map(|(n, _)| n)
            .filter(|n| n.name == query.name && &n.shape == query.shape)
            .find(|n| query.parent_path.map_or(true, |p| path::is_within(&n.path, p)))
            .cloned()
    }

    async fn find_by_path(&self, path: &str) -> Option<FolderNode> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .map(|(n, _)| n)
            .find(|n| n.path == path)
            .cloned()
    }

    async fn resolve_path_by_id(&self, id: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .find(|(n, _)| n.id == id)
            .map(|(n, _)| n.path.clone())
    }

    async fn search_by_term(&self, term: &str, shape: Option<Shape>) -> Vec<FolderNode> {
        let term = term.to_lowercase();
        let state = self.state.lock().unwrap();
        state
            .nodes
            .iter()
            .map(|(n, _)| n)
            .filter(|n| n.name.to_lowercase().contains(&term))
            .filter(|n| shape.as_ref().map_or(true, |s| &n.shape == s))
            .cloned()
            .collect()
    }

    fn clear_cache(&self) {}
}

#[async_trait]
impl Writer for FakeStore {
    async fn create_node<'a>(&self, req: NewFolder<'a>) -> Result<CreatedFolder, WriteError> {
        let parent = if req.parent_path == path::ROOT {
            None
        } else {
            match self.find_by_path(req.parent_path).await {
                Some(p) => Some(p.path),
                None => return Err(WriteError::ParentNotFound(req.parent_path.to_string())),
            }
        };

        let id = {
            let mut state = self.state.lock().unwrap();
            if state.fail_create_for.iter().any(|n| n == req.name) {
                return Err(WriteError::Remote {
                    operation: "CreateFolder",
                    message: "boom".to_string(),
                });
            }
            state.next_id += 1;
            state.creates += 1;
            let id = format!("folder-{}", state.next_id);
            let node = FolderNode {
                id: id.clone(),
                name: req.name.to_string(),
                shape: req.shape.clone(),
                path: path::child_path(parent.as_deref(), &slug(req.name)),
                parent_path: parent,
            };
            let indexed = state.indexing;
            state.nodes.push((node, indexed));
            id
        };

        for language in ["nl", "en"] {
            self.publish_node(&id, language).await?;
        }
        Ok(CreatedFolder {
            id,
            name: req.name.to_string(),
        })
    }

    async fn publish_node(&self, id: &str, language: &str) -> Result<(), WriteError> {
        self.state
            .lock()
            .unwrap()
            .publishes
            .push((id.to_string(), language.to_string()));
        Ok(())
    }
}
