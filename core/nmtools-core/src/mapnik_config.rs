//! `mapnik-config` queries

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Flag asking `mapnik-config` for the fonts directory.
pub const FONTS_FLAG: &str = "--fonts";
/// Flag asking `mapnik-config` for the input plugins directory.
pub const INPUT_PLUGINS_FLAG: &str = "--input-plugins";

/// Something that answers configuration queries with a single line of text.
pub trait ConfigQuery {
    /// Return the first line printed for `flag`, trimmed of surrounding whitespace.
    fn query(&self, flag: &str) -> Result<String>;
}

/// Runs the `mapnik-config` executable (or a stand-in) once per query.
#[derive(Debug, Clone)]
pub struct MapnikConfig {
    program: PathBuf,
}

impl MapnikConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for MapnikConfig {
    fn default() -> Self {
        Self::new("mapnik-config")
    }
}

impl ConfigQuery for MapnikConfig {
    fn query(&self, flag: &str) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(flag)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("failed to run {} {flag}", self.program.display()))?;

        // stdout is used even when the exit status is non-zero
        if !output.status.success() {
            warn!(
                program = %self.program.display(),
                flag,
                status = %output.status,
                "configuration query exited unsuccessfully"
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = first_line(&stdout);
        debug!(program = %self.program.display(), flag, value = line, "configuration query");
        Ok(line.to_string())
    }
}

/// First line of `text` with surrounding whitespace removed; empty when `text` is empty.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}
