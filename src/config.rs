//! Configuration management for the OpenSchema CLI
//!
//! This module handles two kinds of documents:
//! - The per-project documents (`openschema.json` and `schema.json`) living in the
//!   root of a schema project
//! - The global tool settings, which say where the registry lives and how to talk to it
//!
//! ## Project documents
//!
//! Loading follows parse-or-nothing semantics: a missing or malformed document yields
//! `None` and it is up to the caller to turn that into a user-facing message. No field
//! semantics are checked while loading; [`ProjectConfig::check_publishable`] does that
//! for the commands that need it.
//!
//! ## Global settings
//!
//! Settings are layered, later wins:
//! 1. Built-in defaults
//! 2. `~/.config/openschema/config.yaml` (or the file named by `OPENSCHEMA_CONFIG_PATH`)
//! 3. `OPENSCHEMA_REGISTRY_URL` / `OPENSCHEMA_TIMEOUT`
//! 4. The `--registry` command-line flag
//!
//! The settings file supports environment variable expansion:
//! - `${VAR}` - Simple substitution
//! - `${VAR:-default}` - Use default if VAR is unset or empty
//! - `${VAR-default}` - Use default if VAR is unset
//! - `${VAR:+alt}` - Use alt if VAR is set and non-empty
//! - `${VAR+alt}` - Use alt if VAR is set

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnNull};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};
use thiserror::Error;

use crate::constants::{
    DEFAULT_REGISTRY_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEBSITE_URL, ENV_CONFIG_PATH,
    ENV_REGISTRY_URL, ENV_TIMEOUT, PROJECT_CONFIG, SCHEMA_FILE,
};

/// A JSON Schema document as authored by the user
pub type SchemaDocument = Value;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("your openschema.json file is missing a {0} field")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid name, only alphanumeric characters, hyphen and underscore are allowed")]
    InvalidName(String),

    #[error("'{version}' is not a valid semantic version: {source}")]
    InvalidVersion {
        version: String,
        source: semver::Error,
    },

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// Project metadata loaded from `openschema.json`
///
/// # Example
///
/// ```json
/// {
///   "name": "person",
///   "version": "1.0.0",
///   "description": "A human being",
///   "category": "people",
///   "tags": ["contact", "identity"]
/// }
/// ```
///
/// Keys the CLI does not know about are kept in `extra` and written back untouched.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    /// Kept as text so that an unparsable version can be reported instead of rejected on load
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub version: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub description: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub category: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Parsed form of `version`
    pub fn semver(&self) -> Result<semver::Version, ConfigError> {
        semver::Version::parse(self.version.trim()).map_err(|source| ConfigError::InvalidVersion {
            version: self.version.clone(),
            source,
        })
    }

    /// Check that every field a push needs is present and well-formed
    ///
    /// Reports the first problem found, in the order name, version, description, category.
    pub fn check_publishable(&self) -> Result<semver::Version, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::MissingField("name"));
        }
        if !is_valid_name(&self.name) {
            return Err(ConfigError::InvalidName(self.name.clone()));
        }
        if self.version.is_empty() {
            return Err(ConfigError::MissingField("version"));
        }
        let version = self.semver()?;
        if self.description.trim().is_empty() {
            return Err(ConfigError::MissingField("description"));
        }
        if self.category.is_empty() {
            return Err(ConfigError::MissingField("category"));
        }
        Ok(version)
    }
}

/// Schema names may only contain alphanumeric characters, hyphen and underscore
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Load `openschema.json` from `directory`, or `None` when missing or malformed
pub fn load(directory: &Path) -> Option<ProjectConfig> {
    let path = directory.join(PROJECT_CONFIG);
    let data = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            tracing::debug!("ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// Load `schema.json` from `directory`, or `None` when missing or malformed
pub fn load_schema(directory: &Path) -> Option<SchemaDocument> {
    let path = directory.join(SCHEMA_FILE);
    let data = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::debug!("ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// Write `openschema.json` into `directory`, replacing any existing file
pub fn save(directory: &Path, cfg: &ProjectConfig) -> Result<(), ConfigError> {
    write_pretty_json(&directory.join(PROJECT_CONFIG), cfg)
}

/// Serialize with two-space indentation and a trailing newline
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let mut data = serde_json::to_string_pretty(value)?;
    data.push('\n');
    fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Global settings controlling how the CLI reaches the registry
///
/// # Example
///
/// ```yaml
/// registryUrl: ${OPENSCHEMA_URL:-https://openschema.wiki/api}
/// timeoutSecs: 10
/// tokenEnv: OPENSCHEMA_TOKEN
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Base URL of the registry API
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    /// Public website, used when printing links to published schemas
    #[serde(default = "default_website_url")]
    pub website_url: String,
    /// Timeout applied to every registry request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding a bearer token for the registry
    #[serde(default)]
    pub token_env: Option<String>,
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_website_url() -> String {
    DEFAULT_WEBSITE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            website_url: default_website_url(),
            timeout_secs: default_timeout_secs(),
            token_env: None,
        }
    }
}

impl Settings {
    /// Apply `OPENSCHEMA_REGISTRY_URL` and `OPENSCHEMA_TIMEOUT` through `lookup`
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(ENV_REGISTRY_URL).filter(|v| !v.is_empty()) {
            self.registry_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT).filter(|v| !v.is_empty()) {
            self.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidSetting {
                key: ENV_TIMEOUT,
                reason: format!("'{raw}' is not a number of seconds"),
            })?;
        }
        Ok(())
    }
}

/// Location of the global settings file
pub fn settings_path() -> PathBuf {
    env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("openschema/config.yaml");
            p
        })
}

/// Read settings from a YAML file; a missing file yields the defaults
pub fn load_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let expanded = expand_env_placeholders(&raw);
    if expanded.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Resolve the effective settings: file, then environment, then the command-line override
pub fn load_settings(registry_override: Option<&str>) -> Result<Settings, ConfigError> {
    let path = settings_path();
    let mut settings = load_settings_file(&path)?;
    settings.apply_env_overrides(|key| env::var(key).ok())?;
    if let Some(url) = registry_override {
        settings.registry_url = url.to_string();
    }
    tracing::debug!(
        "using registry {} (settings file {})",
        settings.registry_url,
        path.display()
    );
    Ok(settings)
}

pub fn expand_env_placeholders(input: &str) -> String {
    static PLACEHOLDER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    let re = match PLACEHOLDER
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?:(:?[-+])([^}]*))?\}"))
    {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("placeholder expansion disabled: {}", e);
            return input.to_string();
        }
    };
    re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let op = caps.get(2).map_or("", |m| m.as_str());
        let val = caps.get(3).map_or("", |m| m.as_str());
        let var = env::var(var_name).ok();

        match (var.as_deref(), op) {
            (Some(v), "") => v.to_string(),                       // ${VAR}
            (Some(v), ":-") if !v.is_empty() => v.to_string(), // ${VAR:-default}
            (_, ":-") => val.to_string(),
            (Some(v), "-") => v.to_string(), // ${VAR-default}
            (None, "-") => val.to_string(),
            (Some(v), ":+") if !v.is_empty() => val.to_string(), // ${VAR:+alt}
            (Some(_), "+") => val.to_string(),                   // ${VAR+alt}
            _ => String::new(),
        }
    })
    .to_string()
}
