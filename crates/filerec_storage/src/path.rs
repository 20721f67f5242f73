//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Collapses `.` and `..` segments without consulting the filesystem.
///
/// Document paths are built from a configured base directory plus a
/// per-entity file name; normalizing them up front avoids surprising
/// relative-path escapes when the configuration contains `..`
/// segments. Unlike `std::fs::canonicalize` this never fails and does
/// not require the path to exist.
///
/// A `..` at the start of a relative path (nothing left to pop) is
/// dropped rather than kept.
#[must_use]
pub fn absolute_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}
