//! Lexical path canonicalization
//!
//! Search roots and discovered files are compared by a canonical key rather
//! than by the text the caller typed. Canonical form is absolute, free of `.`
//! and `..` components, has no trailing separator, and is case-folded on
//! platforms whose default file system is case-insensitive. Nothing here
//! touches the disk; symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Whether two paths differing only in letter case name the same file
pub const CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

/// Removes `.` and `..` components and any trailing separator.
///
/// `..` above the root is dropped, matching how the OS resolves `/..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Resolves `path` against `base` when it is relative, then normalizes it
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Renders a path with forward slashes regardless of the host convention
pub fn to_slash(path: &Path) -> String {
    let text = path.to_string_lossy();
    if cfg!(windows) {
        text.replace('\\', "/")
    } else {
        text.into_owned()
    }
}

/// Key used for set membership of canonical paths
pub fn comparison_key(path: &Path) -> String {
    let mut key = to_slash(&normalize(path));
    while key.len() > 1 && key.ends_with('/') {
        key.pop();
    }
    if CASE_INSENSITIVE {
        key.to_lowercase()
    } else {
        key
    }
}

/// Expresses `path` relative to `base`, or `None` when it lies outside it.
///
/// Both inputs are expected to be absolute and normalized.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let mut path_parts = path.components();
    for base_part in base.components() {
        let part = path_parts.next()?;
        if !component_eq(part, base_part) {
            return None;
        }
    }
    let rest: PathBuf = path_parts.collect();
    Some(rest)
}

fn component_eq(a: Component<'_>, b: Component<'_>) -> bool {
    if CASE_INSENSITIVE {
        a.as_os_str().to_string_lossy().to_lowercase()
            == b.as_os_str().to_string_lossy().to_lowercase()
    } else {
        a == b
    }
}
