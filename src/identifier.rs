use std::fmt;
use std::str::FromStr;

use crate::config::is_valid_name;

/// Reference to a published schema, `name` or `name:version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRef {
    pub name: String,
    pub version: Option<String>,
}

impl SchemaRef {
    /// Parse `name[:version]`
    ///
    /// The split happens at the first colon; an empty version (`name:`) counts as no
    /// version. The name must follow the same character rules as `init`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        let (name, version) = match input.split_once(':') {
            Some((name, version)) => (name, Some(version.trim())),
            None => (input, None),
        };
        if !is_valid_name(name) {
            return Err(format!(
                "'{name}' is not a valid schema name, only alphanumeric characters, hyphen and underscore are allowed"
            ));
        }
        Ok(SchemaRef {
            name: name.to_string(),
            version: version.filter(|v| !v.is_empty()).map(str::to_string),
        })
    }
}

impl FromStr for SchemaRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaRef::parse(s)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}
