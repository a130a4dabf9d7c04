use anyhow::Result;
use std::path::{Path, PathBuf};

use super::Context;
use crate::compile::compile_file;
use crate::config::write_pretty_json;
use crate::error::CliError;
use crate::report;

/// Compile `file` and write the schema to `output`, returning the written path
///
/// `tsconfig` only matters for real TypeScript compilation; declarations are read
/// from `file` alone, so it is logged and otherwise left alone.
pub fn run(
    ctx: &mut Context<'_>,
    file: &Path,
    output: &Path,
    type_name: &str,
    tsconfig: &Path,
) -> Result<PathBuf> {
    let source = ctx.resolve(file);
    if !source.exists() {
        return Err(CliError::user(format!("could not find '{}'", source.display())).into());
    }
    let tsconfig = ctx.resolve(tsconfig);
    if tsconfig.exists() {
        tracing::debug!("not consulting {}", tsconfig.display());
    }

    let schema = compile_file(&source, type_name).map_err(CliError::from)?;

    let out = ctx.resolve(output);
    if out.exists() {
        report::warn(format!("schema file '{}' already exists", out.display()));
        ctx.confirm_or_abort("Do you want to overwrite the existing schema file?")?;
    }
    write_pretty_json(&out, &schema).map_err(CliError::from)?;
    report::success(format!("Wrote {}", out.display()));
    Ok(out)
}
