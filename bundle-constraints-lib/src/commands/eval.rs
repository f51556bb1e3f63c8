use super::Host;
use super::common::{CommonArgs, read_properties};
use crate::Result;
use crate::expr::Environment;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// The expression to evaluate, e.g. `properties.exists(p, p.type == 'olm.gvk')`
    #[arg(long, value_name = "EXPR")]
    pub rule: String,

    /// Path to the properties document (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub properties: Utf8PathBuf,
}

fn eval_inner(common: &CommonArgs, args: &EvalArgs) -> Result<bool> {
    let _ = common.setup()?;

    let program = Environment::shared().compile(&args.rule).into_app_err("compiling expression")?;
    let properties = read_properties(&args.properties)?;

    program.evaluate(&properties).into_app_err("evaluating expression")
}

/// Compiles a free-form expression and prints its result for a property set
///
/// # Errors
///
/// Returns an error if the expression does not compile, the properties cannot be loaded, or
/// evaluation fails
pub fn eval_expression<H: Host>(host: &mut H, common: &CommonArgs, args: &EvalArgs) -> Result<()> {
    match eval_inner(common, args) {
        Ok(result) => {
            let _ = writeln!(host.output(), "{result}");
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Evaluation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
