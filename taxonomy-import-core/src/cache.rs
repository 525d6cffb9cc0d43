//! Per-run memo of resolved folder paths.
//!
//! Once a `(level, name, parent)` key has a path, the resolver makes no further
//! remote calls for it during the run. This only saves requests: another
//! process may still create a duplicate in the meantime. Nothing is persisted.
//!
//! Each entry remembers whether its path was confirmed by Discovery or only
//! predicted from the slug, so later hits report the same confidence.

use std::collections::HashMap;

use crate::contract::Level;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub level: Level,
    pub name: String,
    /// `None` for top-level folders.
    pub parent: Option<String>,
}

impl CacheKey {
    pub fn new(level: Level, name: &str, parent: Option<&str>) -> Self {
        Self {
            level,
            name: name.to_string(),
            parent: parent.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPath {
    pub path: String,
    /// `false` when the path is a slug prediction.
    pub confirmed: bool,
}

#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<CacheKey, CachedPath>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CachedPath> {
        self.entries.get(key)
    }

    /// Later inserts for the same key overwrite; the resolver never does that.
    pub fn insert(&mut self, key: CacheKey, path: String, confirmed: bool) {
        self.entries.insert(key, CachedPath { path, confirmed });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_by_parent() {
        let mut cache = PathCache::new();
        cache.insert(
            CacheKey::new(Level::ModelLine, "Pro", Some("/acme")),
            "/acme/pro".into(),
            true,
        );

        assert_eq!(
            cache
                .get(&CacheKey::new(Level::ModelLine, "Pro", Some("/acme")))
                .map(|c| c.path.as_str()),
            Some("/acme/pro")
        );
        assert_eq!(
            cache.get(&CacheKey::new(Level::ModelLine, "Pro", Some("/globex"))),
            None
        );
    }

    #[test]
    fn keys_differ_by_level() {
        let mut cache = PathCache::new();
        cache.insert(CacheKey::new(Level::Brand, "Pro", None), "/pro".into(), true);
        assert!(cache
            .get(&CacheKey::new(Level::ModelLine, "Pro", None))
            .is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn predicted_paths_stay_unconfirmed() {
        let mut cache = PathCache::new();
        let key = CacheKey::new(Level::Brand, "Acme", None);
        cache.insert(key.clone(), "/acme".into(), false);
        assert_eq!(
            cache.get(&key),
            Some(&CachedPath {
                path: "/acme".into(),
                confirmed: false
            })
        );
    }

    #[test]
    fn clear_empties() {
        let mut cache = PathCache::new();
        cache.insert(CacheKey::new(Level::Brand, "Acme", None), "/acme".into(), true);
        cache.clear();
        assert!(cache.is_empty());
    }
}
