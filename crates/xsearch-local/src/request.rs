use serde::Serialize;
use xsearch_core::SearchRequest;

pub const SYSTEM_PROMPT: &str = "You are a research assistant with access to live X (Twitter) search. \
Use the x_search tool to answer the user's question from recent posts. \
Reply only with JSON that matches the provided schema: put your answer in `answer` and, when possible, \
the URLs of the posts you relied on in `citations`.";

const RESPONSE_FORMAT_NAME: &str = "x_search_answer";

/// Body of `POST {base_url}/responses`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub tools: Vec<XSearchToolConfig>,
    pub text: TextConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: &'static str,
    pub content: String,
}

/// The `x_search` tool entry. Unset filters are omitted from the JSON entirely: the
/// provider treats "missing" differently from an explicit empty list or `false`.
#[derive(Debug, Clone, Serialize)]
pub struct XSearchToolConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_x_handles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_x_handles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_image_understanding: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_video_understanding: Option<bool>,
}

impl XSearchToolConfig {
    pub fn from_request(req: &SearchRequest) -> Self {
        Self {
            kind: "x_search",
            allowed_x_handles: req.allowed_x_handles.clone(),
            excluded_x_handles: req.excluded_x_handles.clone(),
            from_date: req.from_date.map(|d| d.format("%Y-%m-%d").to_string()),
            to_date: req.to_date.map(|d| d.format("%Y-%m-%d").to_string()),
            enable_image_understanding: req.enable_image_understanding,
            enable_video_understanding: req.enable_video_understanding,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextConfig {
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub schema: serde_json::Value,
    pub strict: bool,
}

/// Schema the provider is asked to follow inside its answer text.
pub fn answer_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "answer": { "type": "string" },
            "citations": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["answer", "citations"],
        "additionalProperties": false
    })
}

pub fn build_request(req: &SearchRequest, model: &str) -> ResponsesRequest {
    ResponsesRequest {
        model: model.to_string(),
        input: vec![
            InputMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            InputMessage {
                role: "user",
                content: req.query.clone(),
            },
        ],
        tools: vec![XSearchToolConfig::from_request(req)],
        text: TextConfig {
            format: ResponseFormat {
                kind: "json_schema",
                name: RESPONSE_FORMAT_NAME,
                schema: answer_schema(),
                strict: true,
            },
        },
    }
}
