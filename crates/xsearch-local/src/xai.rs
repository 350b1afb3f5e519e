use crate::normalize::normalize;
use crate::request::build_request;
use std::time::{Duration, Instant};
use xsearch_core::{Error, Result, SearchBackend, SearchRequest, SearchResult};

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-4-fast";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_either(primary: &str, fallback: &str) -> Option<String> {
    env(primary).or_else(|| env(fallback))
}

pub fn xai_api_key_from_env() -> Option<String> {
    env_either("XSEARCH_XAI_API_KEY", "XAI_API_KEY")
}

/// Process-wide provider settings. Loaded once at startup and never mutated.
#[derive(Clone)]
pub struct XaiConfig {
    api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for XaiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XaiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl XaiConfig {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::NotConfigured("xAI API key is empty".to_string()));
        }
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url)
            .map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{base_url}: scheme must be http or https"
            )));
        }
        if timeout_ms == 0 {
            return Err(Error::NotConfigured(
                "timeout must be a positive number of milliseconds".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            base_url,
            model: model.into(),
            timeout_ms,
        })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = xai_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing XSEARCH_XAI_API_KEY (or XAI_API_KEY)".to_string())
        })?;
        let base_url = env_either("XSEARCH_XAI_BASE_URL", "XAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = env_either("XSEARCH_XAI_MODEL", "XAI_MODEL")
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_ms = match env_either("XSEARCH_XAI_TIMEOUT_MS", "XAI_TIMEOUT_MS") {
            Some(s) => s.parse::<u64>().map_err(|_| {
                Error::NotConfigured(format!(
                    "XAI_TIMEOUT_MS must be a positive integer (got {s:?})"
                ))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };
        Self::new(api_key, base_url, model, timeout_ms)
    }

    pub fn endpoint_responses(&self) -> String {
        format!("{}/responses", self.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct XaiClient {
    client: reqwest::Client,
    cfg: XaiConfig,
}

impl XaiClient {
    pub fn new(client: reqwest::Client, cfg: XaiConfig) -> Self {
        Self { client, cfg }
    }

    /// Build the outbound request without sending it.
    pub fn prepare(&self, req: &SearchRequest) -> Result<reqwest::Request> {
        let body = build_request(req, &self.cfg.model);
        self.client
            .post(self.cfg.endpoint_responses())
            .timeout(self.cfg.timeout())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.cfg.timeout_ms,
            }
        } else {
            Error::Transport(e.to_string())
        }
    }

    /// One attempt, no retries. The reqwest timeout spans connect through body read; when it
    /// fires the in-flight future is dropped along with its connection.
    pub async fn send(&self, req: &SearchRequest) -> Result<serde_json::Value> {
        let t0 = Instant::now();
        let http_req = self.prepare(req)?;
        let resp = self
            .client
            .execute(http_req)
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "xai responses call finished"
        );
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SearchBackend for XaiClient {
    fn name(&self) -> &'static str {
        "xai"
    }

    async fn search(&self, req: &SearchRequest) -> Result<SearchResult> {
        let raw = self.send(req).await?;
        let out = normalize(&raw, req.include_raw_response);
        tracing::debug!(
            citations = out.citations.len(),
            inline_citations = out.inline_citations.len(),
            "normalized xai response"
        );
        Ok(out)
    }
}
