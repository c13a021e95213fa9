//! Font and input plugin discovery for settings checks

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::settings::MapnikSettings;

/// What a settings directory is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Fonts,
    InputPlugins,
}

impl DirKind {
    fn for_key(key: &str) -> Self {
        match key {
            "fonts" => Self::Fonts,
            _ => Self::InputPlugins,
        }
    }

    /// Whether `path` is a file Mapnik would register from this directory.
    pub fn accepts(self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return false,
        };

        match self {
            Self::Fonts => matches!(
                ext.as_str(),
                "ttf" | "otf" | "ttc" | "otc" | "pfa" | "pfb" | "dfont" | "woff"
            ),
            Self::InputPlugins => ext == "input",
        }
    }
}

/// Files under `root` that `kind` accepts. Fonts are searched recursively,
/// plugins only at the top level. Only a missing `root` is an error;
/// unreadable entries and symlink loops below it are logged and skipped.
pub fn discover(root: &Path, kind: DirKind) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("directory does not exist: {}", root.display()));
    }

    let max_depth = match kind {
        DirKind::Fonts => usize::MAX,
        DirKind::InputPlugins => 1,
    };

    let mut found = Vec::new();
    for entry in WalkDir::new(root).max_depth(max_depth).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && kind.accepts(entry.path()) {
            found.push(entry.path().to_path_buf());
        }
    }

    Ok(found)
}

/// Outcome of checking one settings entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Expression values are only meaningful at load time.
    Skipped,
    Missing,
    Empty,
    Found(usize),
}

/// Inspect each literal directory in `settings`, logging a warning for each
/// missing or empty one. Never fails.
pub fn check_settings(settings: &MapnikSettings) -> Vec<(&'static str, CheckOutcome)> {
    settings
        .entries()
        .into_iter()
        .map(|(key, value)| {
            let outcome = match value.as_literal() {
                None => CheckOutcome::Skipped,
                Some(dir) => check_dir(key, Path::new(dir)),
            };
            (key, outcome)
        })
        .collect()
}

fn check_dir(key: &str, dir: &Path) -> CheckOutcome {
    match discover(dir, DirKind::for_key(key)) {
        Err(err) => {
            warn!(key, error = %format!("{err:#}"), "settings directory unavailable");
            CheckOutcome::Missing
        }
        Ok(files) if files.is_empty() => {
            warn!(key, dir = %dir.display(), "settings directory holds nothing to register");
            CheckOutcome::Empty
        }
        Ok(files) => {
            debug!(key, dir = %dir.display(), count = files.len(), "settings directory checked");
            CheckOutcome::Found(files.len())
        }
    }
}
