//! Compile database extraction from verbose node-gyp build logs
//!
//! `make V=1` prints every compiler invocation. Lines carrying the
//! `NODE_GYP_MODULE_NAME` define are compiles of addon sources; the source
//! file is the last space-separated argument. Records follow the Clang JSON
//! Compilation Database schema.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::paths::{absolutize, resolve_normalized};

/// Marker present on every addon compile line emitted by node-gyp.
pub const DEFAULT_MARKER: &str = "NODE_GYP_MODULE_NAME";
/// Build subdirectory node-gyp runs `make` from.
pub const BUILD_SUBDIR: &str = "build";

const COMPILE_LINE_PATTERN: &str = r"^(.*) (.+\.cpp)$";

/// One entry of `compile_commands.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub command: String,
    pub file: PathBuf,
}

/// Filters and parses build log lines into [`CompileCommand`]s.
#[derive(Debug, Clone)]
pub struct Extractor {
    build_dir: PathBuf,
    marker: String,
    matcher: Regex,
}

impl Extractor {
    /// A relative `build_dir` is anchored at the current directory so that
    /// records always carry absolute paths.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        let build_dir = build_dir.into();
        let build_dir = match absolutize(&build_dir) {
            Ok(abs) => abs,
            Err(err) => {
                warn!(build_dir = %build_dir.display(), error = %err, "cannot absolutize build directory");
                build_dir
            }
        };
        Self {
            build_dir,
            marker: DEFAULT_MARKER.to_string(),
            matcher: Regex::new(COMPILE_LINE_PATTERN).expect("static compile line pattern"),
        }
    }

    /// Extractor rooted at `<cwd>/build`.
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        Ok(Self::new(cwd.join(BUILD_SUBDIR)))
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parse one log line. `None` for lines without the marker and for
    /// marker lines that do not end in a `.cpp` argument.
    pub fn extract_line(&self, line: &str) -> Option<CompileCommand> {
        if !line.contains(self.marker.as_str()) {
            return None;
        }

        let unterminated = line.trim_end_matches(['\n', '\r']);
        let Some(caps) = self.matcher.captures(unterminated) else {
            warn!(line = unterminated, "marker line has no .cpp source; skipped");
            return None;
        };

        let source = Path::new(&caps[2]);
        Some(CompileCommand {
            directory: self.build_dir.clone(),
            command: line.trim().to_string(),
            file: resolve_normalized(&self.build_dir, source),
        })
    }

    fn has_marker(&self, raw: &[u8]) -> bool {
        let marker = self.marker.as_bytes();
        marker.is_empty() || raw.windows(marker.len()).any(|w| w == marker)
    }

    /// Read `reader` to the end and collect records in input order.
    ///
    /// Lines are filtered on raw bytes; only marker lines are decoded, lossily,
    /// so log noise in other encodings is ignored.
    pub fn extract(&self, reader: impl BufRead) -> Result<Vec<CompileCommand>> {
        let mut commands = Vec::new();
        for (idx, raw) in reader.split(b'\n').enumerate() {
            let raw = raw.with_context(|| format!("failed to read build log line {}", idx + 1))?;
            if !self.has_marker(&raw) {
                continue;
            }
            if let Some(command) = self.extract_line(&String::from_utf8_lossy(&raw)) {
                commands.push(command);
            }
        }
        debug!(count = commands.len(), build_dir = %self.build_dir.display(), "extracted compile commands");
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const COMPILE: &str = "  g++ '-DNODE_GYP_MODULE_NAME=mapnik' -I../src -c -o Release/obj.target/mapnik/src/mapnik_map.o ../src/mapnik_map.cpp";

    #[test]
    fn extracts_marker_line() {
        let extractor = Extractor::new("/work/node-mapnik/build");
        let cmd = extractor.extract_line(COMPILE).expect("record");

        assert_eq!(cmd.directory, PathBuf::from("/work/node-mapnik/build"));
        assert_eq!(cmd.command, COMPILE.trim());
        assert_eq!(cmd.file, PathBuf::from("/work/node-mapnik/src/mapnik_map.cpp"));
    }

    #[test]
    fn ignores_lines_without_marker() {
        let extractor = Extractor::new("/b");
        assert!(extractor.extract_line("  g++ -c ../src/a.cpp").is_none());
        assert!(extractor.extract_line("make: Entering directory '/b'").is_none());
    }

    #[test]
    fn skips_marker_lines_without_source() {
        let extractor = Extractor::new("/b");
        assert!(extractor
            .extract_line("  g++ -DNODE_GYP_MODULE_NAME=mapnik -o mapnik.node obj/a.o")
            .is_none());
        assert!(extractor.extract_line("NODE_GYP_MODULE_NAME foo/bar.cpp trailing").is_none());
    }

    #[test]
    fn tolerates_crlf_terminators() {
        let extractor = Extractor::new("/b");
        let cmd = extractor
            .extract_line("cc NODE_GYP_MODULE_NAME foo/bar.cpp\r\n")
            .expect("record");
        assert_eq!(cmd.file, PathBuf::from("/b/foo/bar.cpp"));
        assert_eq!(cmd.command, "cc NODE_GYP_MODULE_NAME foo/bar.cpp");
    }

    #[test]
    fn custom_marker() {
        let extractor = Extractor::new("/b").with_marker("MY_ADDON");
        assert!(extractor.extract_line("cc -DMY_ADDON x.cpp").is_some());
        assert!(extractor.extract_line("cc -DNODE_GYP_MODULE_NAME x.cpp").is_none());
    }

    #[test]
    fn relative_build_dir_is_anchored_at_cwd() {
        let cwd = std::env::current_dir().expect("cwd");
        let cmd = Extractor::new("build")
            .extract_line("cc NODE_GYP_MODULE_NAME ../src/a.cpp")
            .expect("record");

        assert!(cmd.directory.is_absolute());
        assert!(cmd.file.is_absolute());
        assert_eq!(cmd.directory, crate::paths::normalize(&cwd.join("build")));
        assert_eq!(cmd.file, crate::paths::normalize(&cwd.join("src/a.cpp")));
    }

    #[test]
    fn non_utf8_noise_between_marker_lines_is_ignored() {
        let mut log = b"cc NODE_GYP_MODULE_NAME ../src/a.cpp\n".to_vec();
        log.extend_from_slice(b"caf\xe9 noise\n");
        log.extend_from_slice(b"cc NODE_GYP_MODULE_NAME ../src/b.cpp\n");

        let commands = Extractor::new("/w/build")
            .extract(Cursor::new(log))
            .expect("extract");

        let files: Vec<_> = commands.iter().map(|c| c.file.clone()).collect();
        assert_eq!(
            files,
            vec![PathBuf::from("/w/src/a.cpp"), PathBuf::from("/w/src/b.cpp")]
        );
    }

    #[test]
    fn extract_preserves_order() {
        let log = "cc NODE_GYP_MODULE_NAME ../src/b.cpp\nnoise\ncc NODE_GYP_MODULE_NAME ../src/a.cpp\n";
        let commands = Extractor::new("/w/build")
            .extract(Cursor::new(log))
            .expect("extract");

        let files: Vec<_> = commands.iter().map(|c| c.file.clone()).collect();
        assert_eq!(
            files,
            vec![PathBuf::from("/w/src/b.cpp"), PathBuf::from("/w/src/a.cpp")]
        );
    }
}
