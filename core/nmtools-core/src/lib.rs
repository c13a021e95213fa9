//! nmtools-core: build-time helpers for the Mapnik Node binding.
//!
//! Two independent transformations live here:
//!
//! **Settings**: resolve the fonts and input-plugins directories (from
//! `MAPNIK_FONTS` / `MAPNIK_INPUT_PLUGINS`, falling back to `mapnik-config`)
//! and render them into the `mapnik_settings.js` module the binding loads.
//!
//! **Compile database**: turn verbose node-gyp `make` output into a
//! `compile_commands.json` that clangd, clang-tidy and friends understand.
//!
//! ```rust,no_run
//! use std::io;
//! use nmtools_core::compile_db::Extractor;
//! use nmtools_core::output::write_json_pretty;
//!
//! let extractor = Extractor::new(std::env::current_dir()?.join("build"));
//! let commands = extractor.extract(io::stdin().lock())?;
//! write_json_pretty(&commands, io::stdout().lock())?;
//! #
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ```rust,no_run
//! use nmtools_core::mapnik_config::MapnikConfig;
//! use nmtools_core::settings::{resolve, SettingsOverrides};
//!
//! let settings = resolve(SettingsOverrides::from_env(), &MapnikConfig::default());
//! settings.write_to("lib/mapnik_settings.js")?;
//! #
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compile_db;
pub mod discovery;
pub mod mapnik_config;
pub mod output;
pub mod paths;
pub mod settings;
