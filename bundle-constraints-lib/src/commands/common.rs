//! Options and helpers shared by every command.

use super::config::Config;
use crate::Result;
use crate::constraints::{Constraint, ConstraintParser};
use crate::properties::{PropertiesFile, Property};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, ValueEnum};
use ohno::IntoAppError;
use std::fs;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Options accepted by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (default is `constraints.toml`)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

impl CommonArgs {
    /// Initialize the logger and load the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded
    pub fn setup(&self) -> Result<Config> {
        init_logging(self.log_level);
        Config::load(Utf8Path::new("."), self.config.as_ref())
    }
}

/// Initialize the logger based on log level, honoring `RUST_LOG` as an override
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // a logger may already be installed when commands run more than once in a process
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Read and parse a constraint document
///
/// # Errors
///
/// Returns an error if the file cannot be read or the document is rejected by the parser
pub fn read_constraint(path: &Utf8Path, parser: &ConstraintParser<'_>) -> Result<Constraint> {
    let bytes = fs::read(path).into_app_err_with(|| format!("reading constraint file '{path}'"))?;
    parser.parse(&bytes).into_app_err_with(|| format!("parsing constraint file '{path}'"))
}

/// Read the properties declared in a JSON or YAML document
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn read_properties(path: &Utf8Path) -> Result<Vec<Property>> {
    Ok(PropertiesFile::load(path)?.properties)
}
