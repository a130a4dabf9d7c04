use anyhow::Result;
use semver::Version;
use std::path::{Path, PathBuf};

use super::Context;
use crate::config;
use crate::constants::PROJECT_CONFIG;
use crate::error::CliError;
use crate::report;
use crate::version::{bump_version, parse_version, BumpKind};

/// Bump the version in `openschema.json` and write it back
///
/// Every other key of the document is preserved.
pub fn run(ctx: &mut Context<'_>, kind: BumpKind, dir: Option<PathBuf>) -> Result<Version> {
    let dir = ctx.resolve(dir.as_deref().unwrap_or(Path::new(".")));
    let mut cfg = config::load(&dir).ok_or_else(|| {
        CliError::user(format!(
            "The directory {} does not contain a valid '{PROJECT_CONFIG}' config file.",
            dir.display()
        ))
    })?;

    if cfg.version.trim().is_empty() {
        return Err(CliError::user_with_hint(
            "The config file does not contain a version field.",
            "add one manually, e.g. \"version\": \"0.0.1\"",
        )
        .into());
    }
    let current = parse_version(&cfg.version).map_err(CliError::from)?;
    let next = bump_version(&current, kind).map_err(CliError::from)?;

    cfg.version = next.to_string();
    config::save(&dir, &cfg).map_err(CliError::from)?;
    report::success(format!(
        "Successfully bumped the version number of your schema ({current} -> {next})."
    ));
    Ok(next)
}
