//! File names, defaults and environment variables shared across commands.

/// Per-project metadata document
pub const PROJECT_CONFIG: &str = "openschema.json";
/// Per-project schema document
pub const SCHEMA_FILE: &str = "schema.json";

pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_WEBSITE_URL: &str = "https://openschema.wiki";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Overrides the location of the global settings file
pub const ENV_CONFIG_PATH: &str = "OPENSCHEMA_CONFIG_PATH";
pub const ENV_REGISTRY_URL: &str = "OPENSCHEMA_REGISTRY_URL";
pub const ENV_TIMEOUT: &str = "OPENSCHEMA_TIMEOUT";

/// Prefix printed in front of every status line
pub const BRAND: &str = "openschema";
