use super::Host;
use super::common::{CommonArgs, read_constraint, read_properties};
use crate::Result;
use crate::constraints::{ConstraintParser, Evaluation, evaluate};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the constraint document (JSON)
    #[arg(long, value_name = "PATH")]
    pub constraint: Utf8PathBuf,

    /// Path to the properties document (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub properties: Utf8PathBuf,
}

fn check_inner(common: &CommonArgs, args: &CheckArgs) -> Result<Evaluation> {
    let config = common.setup()?;
    let parser = ConstraintParser::new(config.parser_config());

    let constraint = read_constraint(&args.constraint, &parser)?;
    let properties = read_properties(&args.properties)?;

    Ok(evaluate(&constraint, &properties))
}

/// Evaluates a constraint against a property set and reports the outcome
///
/// Exits with code 1 when the constraint is not satisfied.
///
/// # Errors
///
/// Returns an error if either input cannot be loaded
pub fn check_constraint<H: Host>(host: &mut H, common: &CommonArgs, args: &CheckArgs) -> Result<()> {
    let evaluation = match check_inner(common, args) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Check failed: {e}");
            host.exit(1);
            return Err(e);
        }
    };

    write_evaluation(host, &evaluation);

    if !evaluation.satisfied {
        host.exit(1);
    }

    Ok(())
}

fn write_evaluation<H: Host>(host: &mut H, evaluation: &Evaluation) {
    if evaluation.satisfied {
        let _ = writeln!(host.output(), "satisfied");
    } else {
        let _ = writeln!(host.output(), "unsatisfied");
        for failure in &evaluation.failures {
            let _ = writeln!(host.output(), "  {failure}");
        }
    }

    if !evaluation.errors.is_empty() {
        let _ = writeln!(host.error(), "{} leaf evaluation error(s):", evaluation.errors.len());
        for error in &evaluation.errors {
            let _ = writeln!(host.error(), "  {error}");
        }
    }
}
