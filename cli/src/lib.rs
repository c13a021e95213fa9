//! nmtools CLI: `mapnik_settings.js` and `compile_commands.json` generators

use std::fs::File;
use std::io::{self, BufRead, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

use nmtools_core::compile_db::{CompileCommand, Extractor, DEFAULT_MARKER};
use nmtools_core::discovery::check_settings;
use nmtools_core::mapnik_config::MapnikConfig;
use nmtools_core::output::write_json_pretty;
use nmtools_core::settings::{resolve, MapnikSettings, SettingsOverrides, DEFAULT_SETTINGS_PATH};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "NMTOOLS_LOG";

/// CLI entrypoint for nmtools.
#[derive(Debug, Parser)]
#[command(
    name = "nmtools",
    about = "Build-time helpers for the Mapnik Node binding"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate mapnik_settings.js with font and input plugin paths
    Settings(SettingsArgs),
    /// Build compile_commands.json from verbose `make` output on STDIN
    CompileCommands(CompileCommandsArgs),
}

#[derive(Debug, Args)]
struct SettingsArgs {
    /// Destination file, replaced if it exists
    #[arg(value_hint = ValueHint::FilePath, default_value = DEFAULT_SETTINGS_PATH)]
    output: PathBuf,

    /// Program queried when MAPNIK_FONTS / MAPNIK_INPUT_PLUGINS are unset
    #[arg(
        long = "mapnik-config",
        env = "MAPNIK_CONFIG",
        default_value = "mapnik-config",
        value_hint = ValueHint::CommandName
    )]
    mapnik_config: PathBuf,

    /// Warn when a resolved directory is missing or holds nothing to register
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool,
}

#[derive(Debug, Args)]
struct CompileCommandsArgs {
    /// Directory compiles run from [default: <cwd>/build]
    #[arg(long = "build-dir", value_hint = ValueHint::DirPath)]
    build_dir: Option<PathBuf>,

    /// Substring identifying addon compile lines
    #[arg(long = "marker", default_value = DEFAULT_MARKER)]
    marker: String,

    /// Write the database here instead of STDOUT
    #[arg(short = 'o', long = "output", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Settings(args) => run_settings(args),
        Command::CompileCommands(args) => {
            let stdin = io::stdin();
            run_compile_commands(args, stdin.lock())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn run_settings(args: SettingsArgs) -> Result<()> {
    let settings = build_settings(&args, SettingsOverrides::from_env());

    if args.check {
        check_settings(&settings);
    }

    settings.write_to(&args.output)?;
    tracing::info!(path = %args.output.display(), "settings written");
    Ok(())
}

fn build_settings(args: &SettingsArgs, overrides: SettingsOverrides) -> MapnikSettings {
    let config = MapnikConfig::new(&args.mapnik_config);
    resolve(overrides, &config)
}

fn run_compile_commands(args: CompileCommandsArgs, stdin: impl BufRead) -> Result<()> {
    let extractor = build_extractor(&args)?;
    let commands = extractor.extract(stdin)?;

    match &args.output {
        Some(path) => write_database(&commands, path),
        None => {
            let stdout = io::stdout();
            write_json_pretty(&commands, stdout.lock())
        }
    }
}

fn build_extractor(args: &CompileCommandsArgs) -> Result<Extractor> {
    let extractor = match &args.build_dir {
        Some(dir) => Extractor::new(dir.clone()),
        None => Extractor::from_current_dir()?,
    };
    Ok(extractor.with_marker(args.marker.clone()))
}

fn write_database(commands: &[CompileCommand], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_json_pretty(commands, &mut writer)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    tracing::info!(path = %path.display(), count = commands.len(), "compile database written");
    Ok(())
}
