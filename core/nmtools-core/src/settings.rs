//! `mapnik_settings.js` generation
//!
//! The binding reads `module.exports.paths.fonts` and
//! `module.exports.paths.input_plugins` at require time to register fonts and
//! datasource plugins. Values are JS source text: either a quoted path or an
//! expression built on `__dirname`, which needs `path` in scope.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::mapnik_config::{ConfigQuery, FONTS_FLAG, INPUT_PLUGINS_FLAG};

/// Default destination, relative to the package root.
pub const DEFAULT_SETTINGS_PATH: &str = "lib/mapnik_settings.js";
/// Environment override for the fonts directory.
pub const FONTS_ENV: &str = "MAPNIK_FONTS";
/// Environment override for the input plugins directory.
pub const INPUT_PLUGINS_ENV: &str = "MAPNIK_INPUT_PLUGINS";
/// Token that marks a value as relative to the settings file at load time.
pub const PLACEHOLDER: &str = "__dirname";
/// Prepended when any value uses [`PLACEHOLDER`].
pub const PATH_IMPORT: &str = "var path = require('path');\n";

/// One settings value as it will appear in the generated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// A filesystem path, rendered as a single-quoted JS string.
    Literal(String),
    /// JS source emitted verbatim, e.g. `path.join(__dirname, 'fonts')`.
    Expression(String),
}

impl SettingValue {
    /// Classify a raw environment override.
    ///
    /// A value using `__dirname` as an identifier is an expression; a path that
    /// merely has a `__dirname` segment is still a literal. A value that is
    /// already a plain quoted string literal is unwrapped so it renders back
    /// unchanged; a quoted literal with escapes is kept verbatim.
    pub fn from_override(raw: &str) -> Self {
        if uses_placeholder(raw) {
            return Self::Expression(raw.to_string());
        }

        match unquote_plain(raw) {
            Some(inner) => Self::Literal(inner.to_string()),
            None if is_quoted(raw) => Self::Expression(raw.to_string()),
            None => Self::Literal(raw.to_string()),
        }
    }

    /// JS source text for this value.
    pub fn render(&self) -> String {
        match self {
            Self::Literal(path) => quote_js(path),
            Self::Expression(expr) => expr.clone(),
        }
    }

    /// The filesystem path, when the value is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(path) => Some(path),
            Self::Expression(_) => None,
        }
    }
}

/// Whether `raw` references `__dirname` as a JS identifier rather than as part
/// of a path segment or a longer name.
fn uses_placeholder(raw: &str) -> bool {
    let joins_path_or_name =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | '\\' | '.' | '-');
    raw.match_indices(PLACEHOLDER).any(|(at, _)| {
        let before = raw[..at].chars().next_back();
        let after = raw[at + PLACEHOLDER.len()..].chars().next();
        !before.is_some_and(joins_path_or_name) && !after.is_some_and(joins_path_or_name)
    })
}

fn is_quoted(raw: &str) -> bool {
    raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')))
}

fn unquote_plain(raw: &str) -> Option<&str> {
    if !is_quoted(raw) {
        return None;
    }
    let inner = &raw[1..raw.len() - 1];
    if inner.contains(['\\', '\'', '"']) {
        None
    } else {
        Some(inner)
    }
}

/// Render `text` as a single-quoted JS string literal.
pub fn quote_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Environment-provided overrides. A variable set to the empty string still counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub fonts: Option<String>,
    pub input_plugins: Option<String>,
}

impl SettingsOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key).map(|v| v.to_string_lossy().into_owned()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            fonts: lookup(FONTS_ENV),
            input_plugins: lookup(INPUT_PLUGINS_ENV),
        }
    }
}

/// Resolved contents of `mapnik_settings.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapnikSettings {
    pub fonts: SettingValue,
    pub input_plugins: SettingValue,
}

impl MapnikSettings {
    /// `(key, value)` pairs in template order.
    pub fn entries(&self) -> [(&'static str, &SettingValue); 2] {
        [("fonts", &self.fonts), ("input_plugins", &self.input_plugins)]
    }

    /// Whether the rendered module must import `path` for `__dirname` expressions.
    pub fn needs_path_import(&self) -> bool {
        self.entries().iter().any(|(_, value)| match value {
            SettingValue::Expression(expr) => uses_placeholder(expr),
            SettingValue::Literal(_) => false,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.needs_path_import() {
            out.push_str(PATH_IMPORT);
        }
        out.push_str(&format!(
            "\nmodule.exports.paths = {{\n    'fonts': {},\n    'input_plugins': {}\n}};\n",
            self.fonts.render(),
            self.input_plugins.render()
        ));
        out
    }

    /// Write the module to `path`, replacing any existing file.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render())
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        debug!(path = %path.display(), "wrote settings");
        Ok(())
    }
}

/// Resolve both values, querying `config` for whichever override is missing.
///
/// Query failures and empty answers degrade to `''` with a warning.
pub fn resolve(overrides: SettingsOverrides, config: &impl ConfigQuery) -> MapnikSettings {
    MapnikSettings {
        fonts: resolve_value(overrides.fonts, config, FONTS_FLAG, FONTS_ENV),
        input_plugins: resolve_value(
            overrides.input_plugins,
            config,
            INPUT_PLUGINS_FLAG,
            INPUT_PLUGINS_ENV,
        ),
    }
}

fn resolve_value(
    raw: Option<String>,
    config: &impl ConfigQuery,
    flag: &str,
    env_key: &str,
) -> SettingValue {
    if let Some(raw) = raw {
        debug!(env = env_key, value = %raw, "using environment override");
        return SettingValue::from_override(&raw);
    }

    match config.query(flag) {
        Ok(line) => {
            if line.is_empty() {
                warn!(flag, "configuration query printed nothing; set {env_key} to override");
            }
            SettingValue::Literal(line)
        }
        Err(err) => {
            warn!(flag, error = %format!("{err:#}"), "configuration query failed; set {env_key} to override");
            SettingValue::Literal(String::new())
        }
    }
}
