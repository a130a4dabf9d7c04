//! User-facing failure classes and how `main` reports them

use std::error::Error as StdError;
use thiserror::Error;

use crate::compile::CompileError;
use crate::config::ConfigError;
use crate::report;
use crate::validator::ValidationError;
use crate::version::VersionError;

type BoxError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Something the user can fix in their input or project files
    #[error("{message}")]
    UserInput {
        message: String,
        hint: Option<String>,
    },

    /// The schema failed its structural check, or its meta-schema could not be used
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
        #[source]
        source: Option<ValidationError>,
    },

    #[error(transparent)]
    Network(#[from] crate::registry::RegistryError),

    #[error("{message}")]
    Filesystem {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The user declined a confirmation
    #[error("Aborted")]
    Aborted,
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        CliError::UserInput {
            message: message.into(),
            hint: None,
        }
    }

    pub fn user_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::UserInput {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn filesystem(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CliError::Filesystem {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            CliError::UserInput { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { .. } | ConfigError::Write { .. } => {
                CliError::filesystem("could not access a configuration file", err)
            }
            ConfigError::MissingField(field) => CliError::user_with_hint(
                err.to_string(),
                format!("add a \"{field}\" entry to openschema.json"),
            ),
            ConfigError::InvalidVersion { .. } => {
                CliError::user_with_hint(err.to_string(), "use a version such as 1.0.0")
            }
            other => CliError::user(other.to_string()),
        }
    }
}

impl From<VersionError> for CliError {
    fn from(err: VersionError) -> Self {
        CliError::user_with_hint(
            err.to_string(),
            "make sure the version field of openschema.json is a valid semantic version",
        )
    }
}

impl From<CompileError> for CliError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Read { .. } => CliError::filesystem("could not read the source file", err),
            other => CliError::user(other.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        let message = match &err {
            ValidationError::MetaSchemaUnavailable { uri, .. } => {
                format!("Attempting to use {uri} as validation schema resulted in an error.")
            }
            _ => "Your schema could not be validated!".to_string(),
        };
        CliError::Validation {
            message,
            errors: Vec::new(),
            source: Some(err),
        }
    }
}

/// Print a failed command's error and return the process exit code
pub fn report_failure(err: &anyhow::Error) -> i32 {
    let cli_err = err.downcast_ref::<CliError>();
    if let Some(CliError::Aborted) = cli_err {
        println!("Aborted");
        return 0;
    }

    report::error(err.to_string());
    if let Some(CliError::Validation { errors, .. }) = cli_err {
        for line in errors {
            report::error(format!("  {line}"));
        }
    }
    for cause in err.chain().skip(1) {
        report::error(format!("  caused by: {cause}"));
    }
    if let Some(hint) = cli_err.and_then(CliError::hint) {
        report::notice(format!("hint: {hint}"));
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_exits_cleanly() {
        assert_eq!(report_failure(&CliError::Aborted.into()), 0);
    }

    #[test]
    fn test_failures_exit_with_one() {
        let err = CliError::user_with_hint("missing version", "openschema version patch");
        assert_eq!(err.hint(), Some("openschema version patch"));
        assert_eq!(report_failure(&err.into()), 1);
        assert_eq!(report_failure(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_config_errors_map_to_user_input() {
        let err: CliError = ConfigError::MissingField("category").into();
        assert!(matches!(err, CliError::UserInput { .. }));
        assert_eq!(err.to_string(), "your openschema.json file is missing a category field");
        assert_eq!(err.hint(), Some("add a \"category\" entry to openschema.json"));
    }
}
