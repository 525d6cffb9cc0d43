#![doc = "Discovery API client: read-only folder lookups over the search index."]
//
//! Implements [`Discovery`] for the CMS search endpoint.
//!
//! Every lookup swallows transport and GraphQL failures: they are logged at
//! error level and reported as "not found", so a flaky index degrades into
//! extra create attempts rather than aborted records.
//!
//! `find_node` and `resolve_path_by_id` keep positive answers for the lifetime
//! of the client. Misses are never cached, otherwise the lookup that confirms a
//! freshly created folder would keep seeing the miss from just before.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxonomy_import_core::config::DiscoveryConfig;
use taxonomy_import_core::contract::{clean_id, Discovery, FolderNode, NodeQuery, Shape};
use taxonomy_import_core::path;
use tracing::{debug, error, info};

use crate::graphql::{GraphqlEndpoint, GraphqlError};

pub const AUTH_HEADER: &str = "X-Crystallize-Static-Auth-Token";

const NAME_SEARCH_LIMIT: u32 = 20;
const TERM_SEARCH_LIMIT: u32 = 10;

const PATH_SEARCH_QUERY: &str = r#"
query FindFolderByPath($path: String!) {
    search(path: $path, options: {}, pagination: {limit: 1}) {
        hits { id name shape path }
    }
}"#;

fn name_search_query(language: &str) -> String {
    format!(
        r#"
query DiscoverySearchFolder($name: String!, $shape: String!) {{
    search(
        language: {language}
        term: ""
        pagination: {{limit: {NAME_SEARCH_LIMIT}}}
        filters: {{name: {{equals: $name}}, shape: {{equals: $shape}}}}
    ) {{
        hits {{ id name shape path }}
    }}
}}"#
    )
}

fn term_search_query(language: &str) -> String {
    format!(
        r#"
query SearchFolders($term: String!, $shape: String) {{
    search(
        language: {language}
        term: $term
        pagination: {{limit: {TERM_SEARCH_LIMIT}}}
        filters: {{shape: {{equals: $shape}}}}
    ) {{
        hits {{ id name shape path }}
    }}
}}"#
    )
}

#[derive(Serialize)]
struct NameSearchVars<'a> {
    name: &'a str,
    shape: &'a str,
}

#[derive(Serialize)]
struct PathSearchVars<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct TermSearchVars<'a> {
    term: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: Option<SearchHits>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
struct Hit {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    shape: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

impl SearchData {
    fn into_hits(self) -> Vec<Hit> {
        self.search.unwrap_or_default().hits
    }
}

impl Hit {
    /// `fallback_shape` is used when the index omits the shape field.
    fn into_node(self, fallback_shape: Option<&Shape>) -> FolderNode {
        let shape = match (self.shape.as_deref(), fallback_shape) {
            (Some(id), _) => Shape::from_identifier(id),
            (None, Some(shape)) => shape.clone(),
            (None, None) => Shape::Other(String::new()),
        };
        let path = self.path.unwrap_or_default();
        FolderNode {
            id: clean_id(&self.id),
            name: self.name.unwrap_or_default(),
            shape,
            parent_path: path::parent_of(&path),
            path,
        }
    }
}

/// First hit whose path lies within `parent`. Without a parent the first hit wins.
fn select_hit(hits: Vec<Hit>, parent: Option<&str>) -> Option<Hit> {
    hits.into_iter().find(|hit| match parent {
        None => true,
        Some(parent) => hit
            .path
            .as_deref()
            .is_some_and(|p| path::is_within(p, parent)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FindKey {
    name: String,
    shape: String,
    parent: Option<String>,
}

impl From<&NodeQuery<'_>> for FindKey {
    fn from(q: &NodeQuery<'_>) -> Self {
        Self {
            name: q.name.to_string(),
            shape: q.shape.identifier().to_string(),
            parent: q.parent_path.map(str::to_string),
        }
    }
}

pub struct DiscoveryClient {
    endpoint: GraphqlEndpoint,
    name_query: String,
    term_query: String,
    nodes: Mutex<HashMap<FindKey, FolderNode>>,
    paths: Mutex<HashMap<String, String>>,
}

impl DiscoveryClient {
    pub fn new(
        config: &DiscoveryConfig,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, GraphqlError> {
        let endpoint = GraphqlEndpoint::new(
            "discovery",
            &config.api_url,
            &[(AUTH_HEADER, config.access_token.as_str())],
            timeout,
        )?;
        info!(api_url = %config.api_url, language, "Initialised Discovery client");
        Ok(Self {
            endpoint,
            name_query: name_search_query(language),
            term_query: term_search_query(language),
            nodes: Mutex::new(HashMap::new()),
            paths: Mutex::new(HashMap::new()),
        })
    }

    async fn search_path(&self, path: &str) -> Result<Option<Hit>, GraphqlError> {
        let data: SearchData = self
            .endpoint
            .execute("FindFolderByPath", PATH_SEARCH_QUERY, &PathSearchVars { path })
            .await?;
        Ok(data.into_hits().into_iter().next())
    }

    fn cached_node(&self, key: &FindKey) -> Option<FolderNode> {
        self.nodes.lock().ok()?.get(key).cloned()
    }

    fn cached_path(&self, id: &str) -> Option<String> {
        self.paths.lock().ok()?.get(id).cloned()
    }

    #[cfg(test)]
    fn cached_entries(&self) -> usize {
        self.nodes.lock().map(|n| n.len()).unwrap_or(0) + self.paths.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Discovery for DiscoveryClient {
    async fn find_node<'a>(&self, query: NodeQuery<'a>) -> Option<FolderNode> {
        let key = FindKey::from(&query);
        if let Some(node) = self.cached_node(&key) {
            debug!(name = query.name, shape = %query.shape, "Discovery cache hit");
            return Some(node);
        }

        let vars = NameSearchVars {
            name: query.name,
            shape: query.shape.identifier(),
        };
        let data: SearchData = match self
            .endpoint
            .execute("DiscoverySearchFolder", &self.name_query, &vars)
            .await
        {
            Ok(data) => data,
            Err(e) => {
                error!(name = query.name, shape = %query.shape, error = %e, "Folder lookup via Discovery failed");
                return None;
            }
        };

        let node = select_hit(data.into_hits(), query.parent_path)?.into_node(Some(query.shape));
        info!(name = query.name, shape = %query.shape, path = %node.path, "Found folder via Discovery");
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.insert(key, node.clone());
        }
        Some(node)
    }

    async fn find_by_path(&self, path: &str) -> Option<FolderNode> {
        match self.search_path(path).await {
            Ok(hit) => hit.map(|h| h.into_node(None)),
            Err(e) => {
                error!(path, error = %e, "Path lookup via Discovery failed");
                None
            }
        }
    }

    async fn resolve_path_by_id(&self, id: &str) -> Option<String> {
        if let Some(path) = self.cached_path(id) {
            return Some(path);
        }
        let path = match self.search_path(id).await {
            Ok(hit) => hit.and_then(|h| h.path)?,
            Err(e) => {
                error!(id, error = %e, "Resolving folder id to path failed");
                return None;
            }
        };
        if let Ok(mut paths) = self.paths.lock() {
            paths.insert(id.to_string(), path.clone());
        }
        Some(path)
    }

    async fn search_by_term(&self, term: &str, shape: Option<Shape>) -> Vec<FolderNode> {
        let vars = TermSearchVars {
            term,
            shape: shape.as_ref().map(Shape::identifier),
        };
        match self
            .endpoint
            .execute::<_, SearchData>("SearchFolders", &self.term_query, &vars)
            .await
        {
            Ok(data) => {
                let nodes: Vec<FolderNode> = data
                    .into_hits()
                    .into_iter()
                    .map(|h| h.into_node(shape.as_ref()))
                    .collect();
                info!(term, hits = nodes.len(), "Discovery term search finished");
                nodes
            }
            Err(e) => {
                error!(term, error = %e, "Discovery term search failed");
                Vec::new()
            }
        }
    }

    fn clear_cache(&self) {
        if let Ok(mut nodes) = self.nodes.lock() {
            nodes.clear();
        }
        if let Ok(mut paths) = self.paths.lock() {
            paths.clear();
        }
        info!("Discovery cache cleared");
    }
}
