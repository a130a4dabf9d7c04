use anyhow::Result;
use chrono::DateTime;

use super::Context;
use crate::error::CliError;
use crate::registry::{RegistryError, RemoteSchemaRecord, SearchQuery};

pub async fn run(
    ctx: &mut Context<'_>,
    name: Option<String>,
    version: Option<String>,
    category: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<Vec<RemoteSchemaRecord>> {
    let query = SearchQuery::from_options(name, version, category, tags);
    let client = ctx.client()?;

    let records = match client.search(&query).await {
        Ok(records) => records,
        Err(err) => {
            println!("Something went wrong!");
            if let RegistryError::Status { body, .. } = &err {
                println!("{body}");
            }
            return Err(CliError::from(err).into());
        }
    };

    if records.is_empty() {
        println!("No schemas found 👀");
    }
    for record in &records {
        println!("{}", format_record(record, &ctx.settings.website_url));
    }
    Ok(records)
}

/// Multi-line listing of a search hit, followed by a blank line
pub fn format_record(record: &RemoteSchemaRecord, website_url: &str) -> String {
    let mut lines = vec![record.name.clone()];
    if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    lines.push(format!(
        "Version {} published {}",
        record.version,
        published_date(&record.created)
    ));
    if !record.tags.is_empty() {
        lines.push(format!("Tags: {}", record.tags.join(", ")));
    }
    lines.push(format!("Category: {}", record.category));
    lines.push(format!(
        "Status: {} and {} downloads",
        record.status, record.downloads
    ));
    lines.push(format!(
        "{}/schemas/{}/{}",
        website_url.trim_end_matches('/'),
        record.name,
        record.version
    ));
    lines.push(String::new());
    lines.join("\n")
}

/// `YYYY-MM-DD` for RFC 3339 timestamps, anything else verbatim
fn published_date(created: &str) -> String {
    DateTime::parse_from_rfc3339(created)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| created.to_string())
}
