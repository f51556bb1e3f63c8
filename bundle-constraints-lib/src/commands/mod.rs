//! Command-line interface and orchestration for bundle-constraints
//!
//! This module implements the CLI commands on top of the library's parser, evaluator, and
//! expression environment. It handles argument parsing, configuration, and logging setup.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **check**: Parse a constraint document, evaluate it against a properties document, and print
//!   `satisfied` or the failure trace. Exits with code 1 when the constraint is not satisfied.
//! - **validate**: Parse a constraint document, or validate every entry of a dependencies
//!   document, without evaluating anything
//! - **eval**: Compile a free-form expression and print its result for a properties document
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the appropriate
//! command handler. Each handler initializes logging, loads the configuration, does its work,
//! and writes results through the [`Host`] so tests can capture them.
//!
//! Configuration is managed through a TOML file (`constraints.toml`) whose only setting today is
//! the maximum constraint document size.

mod check;
mod common;
mod config;
mod eval;
mod host;
mod init;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use check::{CheckArgs, check_constraint};
pub use common::{CommonArgs, LogLevel};
pub use eval::{EvalArgs, eval_expression};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_document};
