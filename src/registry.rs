use crate::config::Settings;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::{env, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("schema '{name}' was not found: {body}")]
    NotFound { name: String, body: String },

    #[error("the registry rejected the upload ({status}): {body}")]
    PublishRejected { status: StatusCode, body: String },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("invalid client configuration: {0}")]
    Setup(String),
}

/// Search filter; the registry honors only one per query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Version constraint, e.g. `>1.0.0`
    Version(String),
    Category(String),
    Tags(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub filter: Option<SearchFilter>,
}

impl SearchQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            filter: None,
        }
    }

    /// Build a query from loose command-line options: version wins over category,
    /// category over tags
    pub fn from_options(
        name: Option<String>,
        version: Option<String>,
        category: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Self {
        let filter = version
            .map(SearchFilter::Version)
            .or_else(|| category.map(SearchFilter::Category))
            .or_else(|| tags.filter(|t| !t.is_empty()).map(SearchFilter::Tags));
        Self { name, filter }
    }
}

/// Wire body of `POST /search`
#[skip_serializing_none]
#[derive(Serialize, Debug, PartialEq)]
pub struct SearchRequest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<&SearchQuery> for SearchRequest {
    fn from(q: &SearchQuery) -> Self {
        let mut req = SearchRequest {
            name: q.name.clone(),
            version: None,
            category: None,
            tags: None,
        };
        match &q.filter {
            Some(SearchFilter::Version(v)) => req.version = Some(v.clone()),
            Some(SearchFilter::Category(c)) => req.category = Some(c.clone()),
            Some(SearchFilter::Tags(t)) => req.tags = Some(t.clone()),
            None => {}
        }
        req
    }
}

/// A published schema as returned by the registry
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSchemaRecord {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: String,
    pub downloads: u64,
    pub created: String,
    pub tarball_base64: Option<String>,
}

/// Fields of the multipart upload behind `PUT /schema.json`
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub name: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub version: String,
    pub archive: Vec<u8>,
}

impl PublishRequest {
    fn into_form(self) -> Form {
        Form::new()
            .part(
                "tarball",
                Part::bytes(self.archive).file_name("package.tgz"),
            )
            .text("name", self.name)
            .text("description", self.description)
            .text("category", self.category)
            .text("tags", self.tags.join(","))
            .text("version", self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub ok: bool,
    pub message: String,
}

pub struct RegistryClient {
    pub base_url: String,
    client: Client,
}

impl RegistryClient {
    pub fn new(settings: &Settings) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        if let Some(token_env) = &settings.token_env {
            let tok = env::var(token_env).map_err(|_| {
                RegistryError::Setup(format!("environment variable {token_env} is not set"))
            })?;
            let hv = HeaderValue::from_str(&format!("Bearer {tok}"))
                .map_err(|e| RegistryError::Setup(e.to_string()))?;
            headers.insert(AUTHORIZATION, hv);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RegistryError::Setup(e.to_string()))?;
        Ok(RegistryClient {
            base_url: settings.registry_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(
        &self,
        url: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<Response, RegistryError> {
        req.send().await.map_err(|source| RegistryError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn body_text(url: &str, resp: Response) -> Result<String, RegistryError> {
        resp.text().await.map_err(|source| RegistryError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn json<T: serde::de::DeserializeOwned>(url: &str, resp: Response) -> Result<T, RegistryError> {
        let text = Self::body_text(url, resp).await?;
        serde_json::from_str(&text).map_err(|e| RegistryError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Search published schemas
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<RemoteSchemaRecord>, RegistryError> {
        let url = self.url("search");
        let body = SearchRequest::from(query);
        tracing::debug!("POST {} {:?}", url, body);
        let resp = self.send(&url, self.client.post(&url).json(&body)).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = Self::body_text(&url, resp).await?;
            return Err(RegistryError::Status { url, status, body });
        }
        Self::json(&url, resp).await
    }

    /// Fetch a schema record, including its tarball, by name and optional exact version
    pub async fn fetch_by_name(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<RemoteSchemaRecord, RegistryError> {
        let url = self.url("schema.json");
        let mut query = vec![("name", name)];
        if let Some(v) = version {
            query.push(("version", v));
        }
        tracing::debug!("GET {} {:?}", url, query);
        let resp = self.send(&url, self.client.get(&url).query(&query)).await?;
        if !resp.status().is_success() {
            let body = Self::body_text(&url, resp).await?;
            return Err(RegistryError::NotFound {
                name: name.to_string(),
                body,
            });
        }
        Self::json(&url, resp).await
    }

    /// Upload a packaged schema for review
    ///
    /// A non-success status is returned as [`RegistryError::PublishRejected`] carrying
    /// the response body.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishResult, RegistryError> {
        let url = self.url("schema.json");
        tracing::debug!(
            "PUT {} name={} version={} ({} bytes)",
            url,
            request.name,
            request.version,
            request.archive.len()
        );
        let resp = self
            .send(&url, self.client.put(&url).multipart(request.into_form()))
            .await?;
        let status = resp.status();
        let message = Self::body_text(&url, resp).await?;
        if !status.is_success() {
            return Err(RegistryError::PublishRejected {
                status,
                body: message,
            });
        }
        Ok(PublishResult { ok: true, message })
    }

    /// Download a meta-schema referenced by a document's `$schema`
    pub async fn fetch_meta_schema(&self, uri: &str) -> Result<Value, RegistryError> {
        tracing::debug!("GET {}", uri);
        let resp = self.send(uri, self.client.get(uri)).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = Self::body_text(uri, resp).await?;
            return Err(RegistryError::Status {
                url: uri.to_string(),
                status,
                body,
            });
        }
        Self::json(uri, resp).await
    }
}
