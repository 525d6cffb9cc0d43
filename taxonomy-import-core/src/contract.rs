#![allow(unused)]

//! # contract: the seams between the resolver and the remote CMS
//!
//! The CMS exposes two GraphQL surfaces that disagree on how folders are
//! addressed:
//!
//! - **Discovery** is a read-only, eventually-consistent search index. It speaks
//!   in hierarchical *paths* and surfaces ids with a publication suffix.
//! - **Write** (PIM) is authoritative. It creates and publishes folders by *id*
//!   and never reports a path.
//!
//! This module defines [`Discovery`] and [`Writer`] plus the plain data that
//! flows across them. Real clients live in the CLI crate; tests use the
//! generated `MockDiscovery` / `MockWriter` or an in-memory fake.
//!
//! ## Failure policy
//! Discovery never returns errors: a transport or protocol failure is logged by
//! the implementor and reported as "not found". Callers must read `None` as
//! "absent, or the search could not tell". Writer operations return a typed
//! [`WriteError`] and leave the skip-or-abort decision to the caller.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema tag of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Brand,
    ModelLine,
    SubModelLine,
    Other(String),
}

impl Shape {
    /// Shape identifier as known to both APIs.
    pub fn identifier(&self) -> &str {
        match self {
            Shape::Brand => "merk",
            Shape::ModelLine => "modellijn",
            Shape::SubModelLine => "sub-modellijn",
            Shape::Other(id) => id,
        }
    }

    pub fn from_identifier(id: &str) -> Self {
        match id {
            "merk" => Shape::Brand,
            "modellijn" => Shape::ModelLine,
            "sub-modellijn" => Shape::SubModelLine,
            other => Shape::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// The three levels of the imported hierarchy, top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Brand,
    ModelLine,
    SubModelLine,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Brand, Level::ModelLine, Level::SubModelLine];

    pub fn shape(self) -> Shape {
        match self {
            Level::Brand => Shape::Brand,
            Level::ModelLine => Shape::ModelLine,
            Level::SubModelLine => Shape::SubModelLine,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Level::Brand => "merk",
            Level::ModelLine => "modellijn",
            Level::SubModelLine => "sub-modellijn",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A folder as observed through Discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Authoritative id, publication suffix already stripped.
    pub id: String,
    pub name: String,
    pub shape: Shape,
    /// Slash-separated address. Expected to start with `/`, but Discovery has
    /// been seen to hand back raw ids here; see [`crate::path::is_well_formed`].
    pub path: String,
    pub parent_path: Option<String>,
}

fn publication_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-[a-z]{2}(?:-[a-z]{2})?-(?:published|draft)$").expect("static regex is valid")
    })
}

/// Strips the `-<locale>-published` marker Discovery appends to ids, so the id
/// can be reused as a parent reference on the Write API.
pub fn clean_id(raw: &str) -> String {
    publication_suffix().replace(raw, "").into_owned()
}

/// Request for [`Discovery::find_node`].
#[derive(Debug, Clone, Copy)]
pub struct NodeQuery<'a> {
    /// Exact display name.
    pub name: &'a str,
    pub shape: &'a Shape,
    /// Restricts hits to paths within this folder.
    pub parent_path: Option<&'a str>,
}

/// Minimal data needed to create a folder.
#[derive(Debug, Clone, Copy)]
pub struct NewFolder<'a> {
    pub name: &'a str,
    pub shape: &'a Shape,
    /// [`crate::path::ROOT`] for top-level folders.
    pub parent_path: &'a str,
}

/// What the Write API reports back after a create. It never includes a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedFolder {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("parent folder not found for path {0}")]
    ParentNotFound(String),
    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned an unexpected response: {message}")]
    MalformedResponse {
        operation: &'static str,
        message: String,
    },
}

/// Read path: search over the eventually-consistent index.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Exact name + shape lookup, optionally scoped under a parent path.
    ///
    /// When the index returns several hits the first one wins. The remote side
    /// defines no ordering, so which duplicate is picked is not stable.
    async fn find_node<'a>(&self, query: NodeQuery<'a>) -> Option<FolderNode>;

    /// Exact path lookup. Used by the Write client to turn a parent path into
    /// a parent id. Not cached.
    async fn find_by_path(&self, path: &str) -> Option<FolderNode>;

    /// Reverse lookup of a raw id to its path.
    async fn resolve_path_by_id(&self, id: &str) -> Option<String>;

    /// Broad, uncached, non-exact search for diagnostics.
    async fn search_by_term(&self, term: &str, shape: Option<Shape>) -> Vec<FolderNode>;

    /// Drops everything cached by `find_node` / `resolve_path_by_id`.
    fn clear_cache(&self);
}

#[async_trait]
impl<T: Discovery + ?Sized> Discovery for Arc<T> {
    async fn find_node<'a>(&self, query: NodeQuery<'a>) -> Option<FolderNode> {
        (**self).find_node(query).await
    }

    async fn find_by_path(&self, path: &str) -> Option<FolderNode> {
        (**self).find_by_path(path).await
    }

    async fn resolve_path_by_id(&self, id: &str) -> Option<String> {
        (**self).resolve_path_by_id(id).await
    }

    async fn search_by_term(&self, term: &str, shape: Option<Shape>) -> Vec<FolderNode> {
        (**self).search_by_term(term, shape).await
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}

/// Write path: authoritative create/publish operations.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Writer: Send + Sync {
    /// Create a folder under `parent_path` and publish it.
    ///
    /// A failed publish is logged by the implementor and does not undo the
    /// create: the folder then exists but is unpublished.
    async fn create_node<'a>(&self, req: NewFolder<'a>) -> Result<CreatedFolder, WriteError>;

    /// Publish a folder in a single locale.
    async fn publish_node(&self, id: &str, language: &str) -> Result<(), WriteError>;
}
