use super::Host;
use super::common::{CommonArgs, read_constraint};
use crate::Result;
use crate::constraints::ConstraintParser;
use crate::dependencies::DependenciesFile;
use camino::Utf8PathBuf;
use clap::{ArgGroup, Parser};
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["constraint", "dependencies"])))]
pub struct ValidateArgs {
    /// Path to a constraint document (JSON)
    #[arg(long, value_name = "PATH")]
    pub constraint: Option<Utf8PathBuf>,

    /// Path to a dependencies document (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub dependencies: Option<Utf8PathBuf>,
}

/// Validates a constraint or dependencies document without evaluating it
///
/// # Errors
///
/// Returns an error if the document cannot be loaded or is invalid
fn validate_inner<H: Host>(host: &mut H, common: &CommonArgs, args: &ValidateArgs) -> Result<()> {
    let config = common.setup()?;
    let parser = ConstraintParser::new(config.parser_config());

    if let Some(path) = &args.constraint {
        let _ = read_constraint(path, &parser)?;
        let _ = writeln!(host.output(), "Constraint document is valid");
    }

    if let Some(path) = &args.dependencies {
        let file = DependenciesFile::load(path)?;
        let problems = file.validate(&parser);
        if !problems.is_empty() {
            for problem in &problems {
                let _ = writeln!(host.error(), "  {problem}");
            }
            return Err(app_err!("found {} problem(s) in dependencies file '{path}'", problems.len()));
        }

        let _ = writeln!(host.output(), "Dependencies document is valid ({} dependencies)", file.dependencies.len());
    }

    Ok(())
}

pub fn validate_document<H: Host>(host: &mut H, common: &CommonArgs, args: &ValidateArgs) -> Result<()> {
    match validate_inner(host, common, args) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}
