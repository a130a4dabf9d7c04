use anyhow::Result;
use semver::Version;
use std::path::{Path, PathBuf};

use super::Context;
use crate::archive;
use crate::config::{self, ProjectConfig};
use crate::constants::{PROJECT_CONFIG, SCHEMA_FILE};
use crate::error::CliError;
use crate::integrity::{self, Digest};
use crate::prompt::Prompter;
use crate::registry::{PublishRequest, RegistryClient};
use crate::report::{self, format_byte_size, terminal_width, truncate_middle};
use crate::validator;
use crate::version::{bump_version, latest_published, BumpKind};

const ID_PROMPT: &str = "Your schema contains an $id field. This will be automatically set by OpenSchema \
after the schema was pushed. Do you want to continue? This will remove the $id field and replace it after we're done.";

/// What a successful push sent to the registry
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub name: String,
    pub version: Version,
    pub digest: Digest,
    pub file_count: usize,
    pub unpacked_size: u64,
    pub package_size: u64,
    /// Response body of the registry
    pub message: String,
}

/// Validate, package and publish the project in `dir`
///
/// Stages run strictly in order: config checks, `$id` confirmation, schema
/// validation, version inference, packing, hashing, upload. Nothing reaches the
/// network before the `$id` confirmation has been answered.
pub async fn run(ctx: &mut Context<'_>, dir: Option<PathBuf>) -> Result<PushOutcome> {
    let dir = ctx.resolve(dir.as_deref().unwrap_or(Path::new(".")));

    let cfg = config::load(&dir).ok_or_else(|| {
        CliError::user_with_hint(
            format!("Could not find a valid {PROJECT_CONFIG} file in {}", dir.display()),
            "run `openschema init` to create a schema project",
        )
    })?;
    let local_version = cfg.check_publishable().map_err(CliError::from)?;

    let schema = config::load_schema(&dir).ok_or_else(|| {
        CliError::user(format!("Could not find a valid {SCHEMA_FILE} file in {}", dir.display()))
    })?;

    if schema.get("$id").is_some() {
        ctx.confirm_or_abort(ID_PROMPT)?;
    }

    let client = ctx.client()?;
    let result = validator::validate_document(&schema, &client)
        .await
        .map_err(CliError::from)?;
    if !result.ok {
        return Err(CliError::Validation {
            message: "Your schema could not be validated!".into(),
            errors: result.errors,
            source: None,
        }
        .into());
    }

    let version = resolve_version(&mut *ctx.prompter, &client, &cfg.name, local_version).await?;
    publish(ctx, &client, &dir, &cfg, version).await
}

/// Decide which version to publish
///
/// The local version is used unless the registry already has the same or a newer
/// one, in which case the user may take the next patch after the published version.
async fn resolve_version(
    prompter: &mut dyn Prompter,
    client: &RegistryClient,
    name: &str,
    local: Version,
) -> Result<Version> {
    let Some(published) = latest_published(client, name).await else {
        tracing::debug!("no published version of {} found, using {}", name, local);
        return Ok(local);
    };
    if published < local {
        return Ok(local);
    }

    let suggested = bump_version(&published, BumpKind::Patch).map_err(CliError::from)?;
    report::warn(format!(
        "{name}@{local} cannot be published, the registry already has version {published}"
    ));
    if prompter.confirm(&format!("Do you want to publish version {suggested} instead?"), false)? {
        Ok(suggested)
    } else {
        Err(CliError::user_with_hint(
            format!("version {local} is not newer than the published version {published}"),
            "openschema version patch",
        )
        .into())
    }
}

async fn publish(
    ctx: &Context<'_>,
    client: &RegistryClient,
    dir: &Path,
    cfg: &ProjectConfig,
    version: Version,
) -> Result<PushOutcome> {
    let entries = archive::list_entries(dir)
        .map_err(|e| CliError::filesystem(format!("could not list {}", dir.display()), e))?;

    report::notice(format!("📦 {}@{}", cfg.name, version));
    report::notice("Tarball Contents");
    let packed = archive::pack(dir, &entries, |entry| {
        report::notice(format!("{} {}", format_byte_size(entry.size), entry.path.display()))
    })
    .map_err(|e| CliError::filesystem("could not package the schema project", e))?;

    let digest = integrity::digest(&packed.bytes);
    let width = terminal_width();
    let package_size = packed.bytes.len() as u64;
    report::notice(format!("unpacked size: {}", format_byte_size(packed.unpacked_size)));
    report::notice(format!("package size: {}", format_byte_size(package_size)));
    report::notice(format!("{}: {}", digest.algorithm, truncate_middle(&digest.encoded, width)));
    report::notice(format!("integrity: {}", truncate_middle(&digest.integrity(), width)));
    report::notice(format!("total files: {}", packed.file_count));
    report::notice("");
    report::notice(format!(
        "Publishing to {} with tag latest and default access",
        ctx.settings.website_url
    ));

    let request = PublishRequest {
        name: cfg.name.clone(),
        description: cfg.description.clone(),
        category: cfg.category.clone(),
        tags: cfg.tags.clone(),
        version: version.to_string(),
        archive: packed.bytes,
    };
    let result = client.publish(request).await.map_err(CliError::from)?;
    report::success("Your schema was successfully submitted for review.");

    Ok(PushOutcome {
        name: cfg.name.clone(),
        version,
        digest,
        file_count: packed.file_count,
        unpacked_size: packed.unpacked_size,
        package_size,
        message: result.message,
    })
}
