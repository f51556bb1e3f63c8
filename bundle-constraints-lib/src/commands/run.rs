//! Command dispatch logic for bundle-constraints

use super::{CheckArgs, CommonArgs, EvalArgs, InitArgs, ValidateArgs, check_constraint, eval_expression, init_config, validate_document};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "bundle-constraints", author, version, long_about = None)]
#[command(about = "Check operator bundle constraints against declared properties")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a constraint document against a set of properties
    Check(CheckArgs),
    /// Validate a constraint or dependencies document
    Validate(ValidateArgs),
    /// Evaluate a free-form expression against a set of properties
    Eval(EvalArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    match &cli.command {
        Command::Check(check_args) => check_constraint(host, &cli.common, check_args),
        Command::Validate(validate_args) => validate_document(host, &cli.common, validate_args),
        Command::Eval(eval_args) => eval_expression(host, &cli.common, eval_args),
        Command::Init(init_args) => init_config(host, init_args),
    }
}
