#![doc = "taxonomy-import-core: get-or-create logic for importing a three-level folder taxonomy."]

//! This crate holds the domain logic of the importer: slugging, path
//! handling, the Discovery/Writer contracts, the per-run path cache, the
//! hierarchy resolver and the import driver. It contains no HTTP code; the
//! CLI crate provides the concrete GraphQL clients.
//!
//! # Usage
//! Build a [`resolver::HierarchyResolver`] from any [`contract::Discovery`] and
//! [`contract::Writer`] implementation, read records with
//! [`input::read_records`], then hand both to [`import::run_import`].

pub mod cache;
pub mod config;
pub mod contract;
pub mod import;
pub mod input;
pub mod path;
pub mod resolver;
pub mod slug;
