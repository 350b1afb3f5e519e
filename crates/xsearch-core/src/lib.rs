use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod validate;

pub use validate::{validate, validate_date, ValidationError, ValidationErrors};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidParams(ValidationErrors),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("upstream request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("upstream response was not valid JSON: {0}")]
    Decode(String),
    #[error("failed to encode result: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Caller arguments for `x_search` before validation.
///
/// Every field is kept as an untyped JSON value so that a wrongly-typed field is reported
/// as a field-scoped validation error instead of failing the whole decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct RawSearchArgs {
    /// What to search for on X (1-2000 characters).
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub query: Option<serde_json::Value>,
    /// Only consider posts from these handles (max 10). Cannot be combined with excluded_x_handles.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<Vec<String>>"))]
    pub allowed_x_handles: Option<serde_json::Value>,
    /// Ignore posts from these handles (max 10). Cannot be combined with allowed_x_handles.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<Vec<String>>"))]
    pub excluded_x_handles: Option<serde_json::Value>,
    /// Earliest post date, YYYY-MM-DD.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub from_date: Option<serde_json::Value>,
    /// Latest post date, YYYY-MM-DD.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<String>"))]
    pub to_date: Option<serde_json::Value>,
    /// Let the provider look at images attached to posts.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<bool>"))]
    pub enable_image_understanding: Option<serde_json::Value>,
    /// Let the provider look at videos attached to posts.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<bool>"))]
    pub enable_video_understanding: Option<serde_json::Value>,
    /// Attach the provider's raw response to the result. Default: false.
    #[serde(default)]
    #[cfg_attr(feature = "schemars", schemars(with = "Option<bool>"))]
    pub include_raw_response: Option<serde_json::Value>,
}

/// Validated `x_search` arguments. Optional filters are either present or absent, never null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub allowed_x_handles: Option<Vec<String>>,
    pub excluded_x_handles: Option<Vec<String>>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub enable_image_understanding: Option<bool>,
    pub enable_video_understanding: Option<bool>,
    pub include_raw_response: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            allowed_x_handles: None,
            excluded_x_handles: None,
            from_date: None,
            to_date: None,
            enable_image_understanding: None,
            enable_video_understanding: None,
            include_raw_response: false,
        }
    }
}

/// A source URL anchored (optionally) to a character range of the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub answer: String,
    pub citations: Vec<String>,
    pub inline_citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<serde_json::Value>,
}

#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, req: &SearchRequest) -> Result<SearchResult>;
}
