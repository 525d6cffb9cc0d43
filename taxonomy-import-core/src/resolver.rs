//! Get-or-create resolution of the brand → model-line → sub-model-line tree.
//!
//! Every level runs the same protocol, scoped under the path resolved for the
//! level above it:
//!
//! 1. [`PathCache`] hit → done (`Cached`, with the confidence it was stored with).
//! 2. Discovery finds the folder under the parent → done (`Exists`).
//! 3. Otherwise the Writer creates it. A failed create aborts the record.
//! 4. After a create the path is predicted as `parent/slug(name)`. Discovery is
//!    asked again after the settling delay; its answer replaces the prediction
//!    when it has one.
//!
//! Discovery sometimes returns an id where a path belongs. Such values never
//! leave this module: the predicted path is used instead, a warning is logged
//! and the level is reported with `confirmed == false`.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, PathCache};
use crate::config::Tuning;
use crate::contract::{
    CreatedFolder, Discovery, Level, NewFolder, NodeQuery, Shape, WriteError, Writer,
};
use crate::import::ImportRecord;
use crate::path;
use crate::slug::slug;

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Pause between a create and the confirming Discovery lookup.
    pub settle_delay: Duration,
    /// Skip the confirming lookup entirely when false.
    pub verify_after_create: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

impl From<&Tuning> for ResolverOptions {
    fn from(tuning: &Tuning) -> Self {
        Self {
            settle_delay: tuning.settle_delay(),
            verify_after_create: tuning.verify_after_create,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    Cached,
    Exists,
    Created,
}

/// One resolved level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub level: Level,
    pub path: String,
    pub outcome: LevelOutcome,
    /// False when `path` is the slug prediction rather than a path Discovery
    /// reported.
    pub confirmed: bool,
}

/// All three levels of one record.
#[derive(Debug, Clone)]
pub struct HierarchyResolution {
    pub brand: Resolved,
    pub model_line: Resolved,
    pub sub_model_line: Resolved,
}

impl HierarchyResolution {
    pub fn leaf_path(&self) -> &str {
        &self.sub_model_line.path
    }

    pub fn leaf_created(&self) -> bool {
        self.sub_model_line.outcome == LevelOutcome::Created
    }

    pub fn all_confirmed(&self) -> bool {
        self.brand.confirmed && self.model_line.confirmed && self.sub_model_line.confirmed
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not resolve parent {parent:?} of {level} {name:?} to a path")]
    ParentUnresolved {
        level: Level,
        name: String,
        parent: String,
    },
    #[error("failed to create {level} {name:?} under {parent}: {source}")]
    CreateFailed {
        level: Level,
        name: String,
        parent: String,
        #[source]
        source: WriteError,
    },
}

/// Discovery-then-Write orchestration. Both clients are injected.
pub struct HierarchyResolver<D, W> {
    discovery: D,
    writer: W,
    options: ResolverOptions,
}

impl<D, W> HierarchyResolver<D, W>
where
    D: Discovery,
    W: Writer,
{
    pub fn new(discovery: D, writer: W, options: ResolverOptions) -> Self {
        Self {
            discovery,
            writer,
            options,
        }
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Resolves brand, model line and sub-model line of `record` in order.
    /// The first failing level aborts the rest.
    pub async fn ensure_hierarchy(
        &self,
        record: &ImportRecord,
        cache: &mut PathCache,
    ) -> Result<HierarchyResolution, ResolveError> {
        let brand = self
            .ensure_level(Level::Brand, &record.brand_name, None, cache)
            .await?;
        let model_line = self
            .ensure_level(
                Level::ModelLine,
                &record.model_line_name,
                Some(&brand.path),
                cache,
            )
            .await?;
        let sub_model_line = self
            .ensure_level(
                Level::SubModelLine,
                &record.sub_model_line_name,
                Some(&model_line.path),
                cache,
            )
            .await?;

        Ok(HierarchyResolution {
            brand,
            model_line,
            sub_model_line,
        })
    }

    /// Get-or-create a single folder. `parent` is `None` for the top level.
    pub async fn ensure_level(
        &self,
        level: Level,
        name: &str,
        parent: Option<&str>,
        cache: &mut PathCache,
    ) -> Result<Resolved, ResolveError> {
        let parent = match parent {
            Some(p) => Some(self.parent_as_path(level, name, p).await?),
            None => None,
        };
        let parent = parent.as_deref();

        let key = CacheKey::new(level, name, parent);
        if let Some(cached) = cache.get(&key) {
            debug!(%level, name, path = %cached.path, confirmed = cached.confirmed, "Path cache hit");
            return Ok(Resolved {
                level,
                path: cached.path.clone(),
                outcome: LevelOutcome::Cached,
                confirmed: cached.confirmed,
            });
        }

        let shape = level.shape();
        let expected = path::child_path(parent, &slug(name));
        let query = NodeQuery {
            name,
            shape: &shape,
            parent_path: parent,
        };

        if let Some(found) = self.discovery.find_node(query).await {
            if !path::is_well_formed(&found.path) {
                warn!(
                    %level,
                    name,
                    returned = %found.path,
                    expected = %expected,
                    "Discovery returned an id instead of a path for an existing folder; using expected slug path"
                );
                cache.insert(key, expected.clone(), false);
                return Ok(Resolved {
                    level,
                    path: expected,
                    outcome: LevelOutcome::Exists,
                    confirmed: false,
                });
            }
            if accepts(parent, &found.path) {
                info!(%level, name, path = %found.path, "Found existing folder");
                cache.insert(key, found.path.clone(), true);
                return Ok(Resolved {
                    level,
                    path: found.path,
                    outcome: LevelOutcome::Exists,
                    confirmed: true,
                });
            }
            warn!(
                %level,
                name,
                found = %found.path,
                parent = parent.unwrap_or(path::ROOT),
                "Discovery hit lies outside the parent folder; ignoring it"
            );
        }

        let parent_for_write = parent.unwrap_or(path::ROOT);
        info!(%level, name, parent = parent_for_write, "Creating folder");
        let created = self
            .writer
            .create_node(NewFolder {
                name,
                shape: &shape,
                parent_path: parent_for_write,
            })
            .await
            .map_err(|source| {
                error!(%level, name, parent = parent_for_write, error = %source, "Folder creation failed");
                ResolveError::CreateFailed {
                    level,
                    name: name.to_string(),
                    parent: parent_for_write.to_string(),
                    source,
                }
            })?;

        let (path, confirmed) = self
            .confirm_created_path(query, &shape, &created, expected)
            .await;
        info!(%level, name, id = %created.id, path = %path, confirmed, "Created folder");
        cache.insert(key, path.clone(), confirmed);

        Ok(Resolved {
            level,
            path,
            outcome: LevelOutcome::Created,
            confirmed,
        })
    }

    /// Asks Discovery for the authoritative path of a folder we just created,
    /// falling back to the slug prediction.
    async fn confirm_created_path(
        &self,
        query: NodeQuery<'_>,
        shape: &Shape,
        created: &CreatedFolder,
        expected: String,
    ) -> (String, bool) {
        if !self.options.verify_after_create {
            return (expected, false);
        }
        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        let Some(found) = self.discovery.find_node(query).await else {
            warn!(
                name = query.name,
                %shape,
                expected = %expected,
                "Discovery has not indexed the new folder yet; using expected slug path"
            );
            return (expected, false);
        };

        if !path::is_well_formed(&found.path) {
            warn!(
                name = query.name,
                %shape,
                returned = %found.path,
                expected = %expected,
                "Discovery returned an id instead of a path for a new folder; using expected slug path"
            );
            return (expected, false);
        }
        if !accepts(query.parent_path, &found.path) {
            warn!(
                name = query.name,
                found = %found.path,
                expected = %expected,
                "Discovery hit for new folder lies outside its parent; using expected slug path"
            );
            return (expected, false);
        }
        if found.id != created.id {
            warn!(
                name = query.name,
                created_id = %created.id,
                discovered_id = %found.id,
                path = %found.path,
                "Discovery reports a different folder than the one just created; a duplicate may exist"
            );
        }
        (found.path, true)
    }

    /// Parents normally arrive as paths. A raw id is turned back into a path
    /// through Discovery before it is used for scoping.
    async fn parent_as_path(
        &self,
        level: Level,
        name: &str,
        parent: &str,
    ) -> Result<String, ResolveError> {
        if path::is_well_formed(parent) {
            return Ok(parent.to_string());
        }
        warn!(%level, name, given = parent, "Parent given as id instead of path; resolving");
        match self.discovery.resolve_path_by_id(parent).await {
            Some(resolved) if path::is_well_formed(&resolved) => {
                info!(id = parent, path = %resolved, "Resolved parent id to path");
                Ok(resolved)
            }
            _ => {
                error!(%level, name, parent, "Failed to resolve parent id to a path");
                Err(ResolveError::ParentUnresolved {
                    level,
                    name: name.to_string(),
                    parent: parent.to_string(),
                })
            }
        }
    }
}

/// Top-level folders accept any discovered path; the rest must sit below
/// their parent.
fn accepts(parent: Option<&str>, found: &str) -> bool {
    match parent {
        None => true,
        Some(p) => path::is_child_of(found, p),
    }
}
