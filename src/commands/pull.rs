use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::Context;
use crate::archive::{self, UnpackSummary};
use crate::error::CliError;
use crate::identifier::SchemaRef;
use crate::registry::RegistryError;

#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub target: PathBuf,
    pub version: String,
    pub summary: UnpackSummary,
}

pub async fn run(
    ctx: &mut Context<'_>,
    schema: SchemaRef,
    location: Option<PathBuf>,
) -> Result<PullOutcome> {
    let target = match &location {
        Some(l) => ctx.resolve(l),
        None => ctx.cwd.clone(),
    };

    let client = ctx.client()?;
    let record = client
        .fetch_by_name(&schema.name, schema.version.as_deref())
        .await
        .map_err(CliError::from)?;

    if !is_empty_location(&target) {
        ctx.confirm_or_abort(&format!(
            "The desired location at '{}' is not empty, do you want to save anyways?",
            target.display()
        ))?;
    }

    let encoded = record.tarball_base64.as_deref().ok_or_else(|| {
        CliError::from(RegistryError::Decode {
            url: client.base_url.clone(),
            reason: format!("the record for {schema} carries no tarball"),
        })
    })?;
    let bytes = base64::decode(encoded.trim()).map_err(|e| {
        CliError::from(RegistryError::Decode {
            url: client.base_url.clone(),
            reason: format!("the tarball of {schema} is not valid base64: {e}"),
        })
    })?;

    let summary = archive::unpack(&bytes, &target).map_err(|e| {
        CliError::filesystem(format!("could not extract {schema} into {}", target.display()), e)
    })?;
    tracing::debug!("extracted {} files ({} bytes)", summary.files, summary.bytes);

    println!("Schema '{}' saved to '{}'", schema.name, target.display());
    Ok(PullOutcome {
        target,
        version: record.version,
        summary,
    })
}

/// A location that does not exist yet, or an empty directory
fn is_empty_location(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => !path.exists(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_empty_location() {
        let dir = TempDir::new().unwrap();
        assert!(is_empty_location(dir.path()));
        assert!(is_empty_location(&dir.path().join("missing")));

        fs::write(dir.path().join("file.txt"), "x").unwrap();
        assert!(!is_empty_location(dir.path()));
        assert!(!is_empty_location(&dir.path().join("file.txt")));
    }
}
