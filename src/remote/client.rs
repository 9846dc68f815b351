/// Hosted notes table client.
///
/// This module provides `RemoteClient` for making synchronous HTTP requests to a
/// PostgREST-style table endpoint, along with error types and the builder used to
/// configure it.
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;

use crate::{ListQuery, NoteId, RawNote};

/// Default table holding note rows.
pub const DEFAULT_TABLE: &str = "notes";

/// Errors that can occur when talking to the hosted notes table.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code and response body
    #[error("HTTP error: status {status}: {message}")]
    Http { status: u16, message: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Responses that decode but do not have the expected shape
    #[error("Remote API error: {message}")]
    Api { message: String },

    /// No row matched the targeted id
    #[error("No remote row with id {0}")]
    NotFound(NoteId),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A required setting was not provided
    #[error("Missing remote setting: {0}")]
    MissingSetting(&'static str),
}

impl RemoteError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Row-level operations on the hosted notes table.
///
/// This trait is the seam between the notes facade and the network; tests
/// substitute scripted implementations.
pub trait RemoteSource: Send + Sync {
    /// Rows matching at least the search term, ordered by `updated_at` descending.
    ///
    /// Implementations may ignore the tag filter; callers filter again.
    fn query(&self, query: &ListQuery) -> Result<Vec<RawNote>, RemoteError>;

    /// Inserts one row and returns it as stored.
    fn insert(&self, row: &Value) -> Result<RawNote, RemoteError>;

    /// Applies `changes` to the row with `id` and returns it.
    ///
    /// Returns `RemoteError::NotFound` when no row matched.
    fn update(&self, id: &NoteId, changes: &Value) -> Result<RawNote, RemoteError>;

    /// Deletes the row with `id`, returning it, or `None` if nothing matched.
    fn delete(&self, id: &NoteId) -> Result<Option<RawNote>, RemoteError>;
}

/// Builder for constructing `RemoteClient` instances.
///
/// # Examples
///
/// ```
/// use notekeeper::remote::RemoteClientBuilder;
///
/// let client = RemoteClientBuilder::new()
///     .base_url("https://example.supabase.co")
///     .api_key("public-anon-key")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.table(), "notes");
/// ```
#[derive(Debug, Default)]
pub struct RemoteClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    timeout: Option<Duration>,
}

impl RemoteClientBuilder {
    /// Creates a new `RemoteClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service base URL (e.g., "https://project.supabase.co").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the access credential sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the table name (defaults to `notes`).
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Overrides the request timeout (defaults to 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the `RemoteClient` with the configured settings.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::MissingSetting` when the base URL or key is absent
    /// or blank, and `RemoteError::InvalidUrl` when the base URL does not parse.
    pub fn build(self) -> Result<RemoteClient, RemoteError> {
        let base_url = self
            .base_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(RemoteError::MissingSetting("base URL"))?;
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(RemoteError::MissingSetting("API key"))?;
        let table = self.table.unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let base = base_url.trim().trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/rest/v1/{table}"))
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidUrl(format!(
                "{}: unsupported scheme",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(RemoteError::Network)?;

        Ok(RemoteClient {
            client,
            endpoint,
            api_key,
            table,
        })
    }
}

/// Synchronous client for the hosted notes table.
///
/// It should be constructed using `RemoteClientBuilder`.
pub struct RemoteClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    table: String,
}

impl RemoteClient {
    /// Returns the table endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Builds the listing URL for a query.
    ///
    /// Only the search term is pushed down. Array containment in PostgREST is
    /// case-sensitive, so the tag filter is applied by the caller.
    pub fn query_url(&self, query: &ListQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", "*");
            pairs.append_pair("order", "updated_at.desc");
            let term = query.search_term();
            if !term.is_empty() {
                let pattern = quote_value(&format!("*{term}*"));
                pairs.append_pair(
                    "or",
                    &format!("(title.ilike.{pattern},content.ilike.{pattern})"),
                );
            }
        }
        url
    }

    fn row_url(&self, id: &NoteId) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id.as_str()));
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    /// Sends a request and decodes the JSON array PostgREST answers with.
    fn send(&self, request: RequestBuilder) -> Result<Vec<Value>, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .map_err(RemoteError::from_transport)?;

        let status = response.status();
        let body = response.text().map_err(RemoteError::from_transport)?;
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&body).map_err(RemoteError::Serialization)? {
            Value::Array(rows) => Ok(rows),
            other => Err(RemoteError::Api {
                message: format!("expected a JSON array, got {}", json_kind(&other)),
            }),
        }
    }
}

impl RemoteSource for RemoteClient {
    fn query(&self, query: &ListQuery) -> Result<Vec<RawNote>, RemoteError> {
        let rows = self.send(self.client.get(self.query_url(query)))?;
        rows.into_iter().map(into_raw).collect()
    }

    fn insert(&self, row: &Value) -> Result<RawNote, RemoteError> {
        let request = self
            .client
            .post(self.endpoint.clone())
            .header("Prefer", "return=representation")
            .json(row);
        let rows = self.send(request)?;
        let first = rows.into_iter().next().ok_or_else(|| RemoteError::Api {
            message: "insert returned no row".to_string(),
        })?;
        into_raw(first)
    }

    fn update(&self, id: &NoteId, changes: &Value) -> Result<RawNote, RemoteError> {
        let request = self
            .client
            .patch(self.row_url(id))
            .header("Prefer", "return=representation")
            .json(changes);
        let rows = self.send(request)?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::NotFound(id.clone()))?;
        into_raw(first)
    }

    fn delete(&self, id: &NoteId) -> Result<Option<RawNote>, RemoteError> {
        let request = self
            .client
            .delete(self.row_url(id))
            .header("Prefer", "return=representation");
        let rows = self.send(request)?;
        rows.into_iter().next().map(into_raw).transpose()
    }
}

fn into_raw(row: Value) -> Result<RawNote, RemoteError> {
    if !row.is_object() {
        return Err(RemoteError::Api {
            message: format!("expected a row object, got {}", json_kind(&row)),
        });
    }
    serde_json::from_value(row).map_err(RemoteError::Serialization)
}

/// Double-quotes a filter value so commas and parentheses survive PostgREST parsing.
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Pulls the `message` field out of a PostgREST error body, if present.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn client() -> RemoteClient {
        RemoteClientBuilder::new()
            .base_url("https://project.example.co/")
            .api_key("anon")
            .build()
            .unwrap()
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn network_error_variant_creation_and_display() {
        let reqwest_error = Client::new().get("not-a-valid-url").build().unwrap_err();
        let error = RemoteError::Network(reqwest_error);

        assert!(error.to_string().contains("Network error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn http_error_variant_includes_status_and_message() {
        let error = RemoteError::Http {
            status: 401,
            message: "Invalid API key".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid API key"));
    }

    #[test]
    fn not_found_names_the_id() {
        let error = RemoteError::NotFound(NoteId::new("n-9"));
        assert_eq!(error.to_string(), "No remote row with id n-9");
    }

    #[test]
    fn build_requires_url_and_key() {
        let missing_url = RemoteClientBuilder::new().api_key("k").build();
        assert!(matches!(
            missing_url,
            Err(RemoteError::MissingSetting("base URL"))
        ));

        let blank_key = RemoteClientBuilder::new()
            .base_url("https://x.example.co")
            .api_key("   ")
            .build();
        assert!(matches!(blank_key, Err(RemoteError::MissingSetting("API key"))));
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = RemoteClientBuilder::new()
            .base_url("not-a-valid-url")
            .api_key("k")
            .build();
        assert!(matches!(result, Err(RemoteError::InvalidUrl(_))));

        let result = RemoteClientBuilder::new()
            .base_url("ftp://files.example.co")
            .api_key("k")
            .build();
        assert!(matches!(result, Err(RemoteError::InvalidUrl(_))));
    }

    #[test]
    fn endpoint_strips_trailing_slash_and_targets_table() {
        let client = client();
        assert_eq!(
            client.endpoint().as_str(),
            "https://project.example.co/rest/v1/notes"
        );

        let custom = RemoteClientBuilder::new()
            .base_url("https://project.example.co")
            .api_key("anon")
            .table("journal")
            .build()
            .unwrap();
        assert_eq!(custom.table(), "journal");
        assert!(custom.endpoint().path().ends_with("/journal"));
    }

    #[test]
    fn unfiltered_query_orders_by_update_time() {
        let url = client().query_url(&ListQuery::all());
        assert_eq!(
            query_pairs(&url),
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "updated_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn search_becomes_postgrest_filter_and_tag_is_not_sent() {
        let url = client().query_url(&ListQuery::all().search(" milk ").tag("Home"));
        let pairs = query_pairs(&url);

        assert!(pairs.contains(&(
            "or".to_string(),
            r#"(title.ilike."*milk*",content.ilike."*milk*")"#.to_string()
        )));
        assert!(pairs.iter().all(|(key, _)| key != "tags"));
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_value(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_value("a,b"), r#""a,b""#);
    }

    #[test]
    fn error_message_prefers_postgrest_message_field() {
        assert_eq!(
            error_message(r#"{"code":"42P01","message":"relation does not exist"}"#),
            "relation does not exist"
        );
        assert_eq!(error_message("  gateway down "), "gateway down");
    }

    #[test]
    fn rows_must_be_objects() {
        assert!(matches!(
            into_raw(serde_json::json!([1])),
            Err(RemoteError::Api { .. })
        ));
        let raw = into_raw(serde_json::json!({"id": 3, "title": "t"})).unwrap();
        assert_eq!(raw.id, serde_json::json!(3));
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct EmptyRemote;

        impl RemoteSource for EmptyRemote {
            fn query(&self, _query: &ListQuery) -> Result<Vec<RawNote>, RemoteError> {
                Ok(Vec::new())
            }
            fn insert(&self, _row: &Value) -> Result<RawNote, RemoteError> {
                Err(RemoteError::Api {
                    message: "read-only".to_string(),
                })
            }
            fn update(&self, id: &NoteId, _changes: &Value) -> Result<RawNote, RemoteError> {
                Err(RemoteError::NotFound(id.clone()))
            }
            fn delete(&self, _id: &NoteId) -> Result<Option<RawNote>, RemoteError> {
                Ok(None)
            }
        }

        let remote: &dyn RemoteSource = &EmptyRemote;
        assert!(remote.query(&ListQuery::all()).unwrap().is_empty());
        assert!(remote.delete(&NoteId::new("x")).unwrap().is_none());
    }
}
