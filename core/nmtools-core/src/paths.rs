//! Lexical path helpers

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Join `rel` onto `base` and collapse `.`/`..` without touching the filesystem.
///
/// An absolute `rel` replaces `base`, matching `Path::join`.
pub fn resolve_normalized(base: &Path, rel: &Path) -> PathBuf {
    normalize(&base.join(rel))
}

/// Normalized absolute form of `path`, resolving relative paths against the
/// current directory.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(resolve_normalized(&env::current_dir()?, path))
}

/// Collapse `.` and `..` components lexically.
///
/// `..` at the root stays at the root; leading `..` on a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.into_iter().collect()
}
