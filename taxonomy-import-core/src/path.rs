//! Helpers for the slash-separated paths both remote APIs agree on.

/// The tree root. Folders at the top level have no parent linkage.
pub const ROOT: &str = "/";

/// True when `path` looks like a path rather than a raw identifier.
pub fn is_well_formed(path: &str) -> bool {
    path.starts_with('/')
}

/// Joins a parent path and a slug segment. `None` (or `"/"`) means the root.
pub fn child_path(parent: Option<&str>, segment: &str) -> String {
    match parent.map(|p| p.trim_end_matches('/')) {
        None | Some("") => format!("/{segment}"),
        Some(p) => format!("{p}/{segment}"),
    }
}

/// `path` equals `parent` or sits somewhere below it.
///
/// Matching respects segment boundaries: `/acme-b/pro` is not within `/acme`.
pub fn is_within(path: &str, parent: &str) -> bool {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        return is_well_formed(path);
    }
    path == parent || is_child_of(path, parent)
}

/// `path` is a strict descendant of `parent`.
pub fn is_child_of(path: &str, parent: &str) -> bool {
    let parent = parent.trim_end_matches('/');
    path.len() > parent.len() + 1
        && path.starts_with(parent)
        && path.as_bytes()[parent.len()] == b'/'
}

/// Parent of a path; top-level folders (and the root) have none.
pub fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some(("", _)) | None => None,
        Some((parent, _)) => Some(parent.to_string()),
    }
}
