//! Semantic version arithmetic: explicit bumps and next-version inference from the registry.

use clap::ValueEnum;
use semver::{Prerelease, Version};
use std::fmt;
use thiserror::Error;

use crate::registry::{RegistryClient, SearchQuery};

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("'{version}' is not a valid semantic version: {source}")]
    Unparsable {
        version: String,
        source: semver::Error,
    },

    #[error("cannot build pre-release '{0}'")]
    Prerelease(String),

    #[error("cannot bump {version}: the {part} component is already at its maximum")]
    Overflow { version: Version, part: &'static str },
}

/// Which part of a version to increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
    Premajor,
    Preminor,
    Prepatch,
    Prerelease,
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BumpKind::Major => "major",
            BumpKind::Minor => "minor",
            BumpKind::Patch => "patch",
            BumpKind::Premajor => "premajor",
            BumpKind::Preminor => "preminor",
            BumpKind::Prepatch => "prepatch",
            BumpKind::Prerelease => "prerelease",
        };
        f.write_str(s)
    }
}

pub fn parse_version(version: &str) -> Result<Version, VersionError> {
    Version::parse(version.trim()).map_err(|source| VersionError::Unparsable {
        version: version.to_string(),
        source,
    })
}

fn pre(text: &str) -> Result<Prerelease, VersionError> {
    Prerelease::new(text).map_err(|_| VersionError::Prerelease(text.to_string()))
}

/// Apply a bump following npm semver's increment rules
///
/// - `major`, `minor`, `patch` on a pre-release of exactly that release only drop the
///   pre-release (`1.0.0-rc.1` → `1.0.0` for `major`)
/// - `premajor`, `preminor`, `prepatch` bump the component and start pre-release `0`
/// - `prerelease` increments the last numeric pre-release identifier, appends `.0`
///   when there is none, and on a release bumps patch first
///
/// Build metadata is always dropped.
pub fn bump_version(current: &Version, kind: BumpKind) -> Result<Version, VersionError> {
    let mut v = Version::new(current.major, current.minor, current.patch);
    let was_pre = !current.pre.is_empty();
    let inc = |n: u64, part: &'static str| {
        n.checked_add(1).ok_or_else(|| VersionError::Overflow {
            version: current.clone(),
            part,
        })
    };

    match kind {
        BumpKind::Major => {
            if !(was_pre && current.minor == 0 && current.patch == 0) {
                v = Version::new(inc(current.major, "major")?, 0, 0);
            }
        }
        BumpKind::Minor => {
            if !(was_pre && current.patch == 0) {
                v = Version::new(current.major, inc(current.minor, "minor")?, 0);
            }
        }
        BumpKind::Patch => {
            if !was_pre {
                v.patch = inc(v.patch, "patch")?;
            }
        }
        BumpKind::Premajor => {
            v = Version::new(inc(current.major, "major")?, 0, 0);
            v.pre = pre("0")?;
        }
        BumpKind::Preminor => {
            v = Version::new(current.major, inc(current.minor, "minor")?, 0);
            v.pre = pre("0")?;
        }
        BumpKind::Prepatch => {
            v.patch = inc(v.patch, "patch")?;
            v.pre = pre("0")?;
        }
        BumpKind::Prerelease => {
            if was_pre {
                v.pre = pre(&next_prerelease(current.pre.as_str())?)?;
            } else {
                v.patch = inc(v.patch, "patch")?;
                v.pre = pre("0")?;
            }
        }
    }
    Ok(v)
}

fn next_prerelease(current: &str) -> Result<String, VersionError> {
    let mut parts: Vec<String> = current.split('.').map(str::to_string).collect();
    match parts
        .iter()
        .rposition(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
    {
        Some(idx) => {
            let next = parts[idx]
                .parse::<u64>()
                .ok()
                .and_then(|n| n.checked_add(1))
                .ok_or_else(|| VersionError::Prerelease(current.to_string()))?;
            parts[idx] = next.to_string();
        }
        None => parts.push("0".to_string()),
    }
    Ok(parts.join("."))
}

/// Currently published version of `name`, if the registry knows it
///
/// Only exact name matches count and the highest parsable version wins; every
/// failure (network, empty result, bad versions) collapses into `None`.
pub async fn latest_published(client: &RegistryClient, name: &str) -> Option<Version> {
    let records = match client.search(&SearchQuery::by_name(name)).await {
        Ok(records) => records,
        Err(e) => {
            tracing::debug!("version lookup for {} failed: {}", name, e);
            return None;
        }
    };
    records
        .into_iter()
        .filter(|r| r.name == name)
        .filter_map(|r| Version::parse(&r.version).ok())
        .max()
}

/// Next patch version after the currently published one
pub async fn suggest_next_version(client: &RegistryClient, name: &str) -> Option<Version> {
    let published = latest_published(client, name).await?;
    bump_version(&published, BumpKind::Patch).ok()
}
