use rmcp::model::{CallToolResult, Content};

fn pretty(payload: &serde_json::Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

pub(crate) fn tool_result(payload: serde_json::Value) -> CallToolResult {
    // Structured content for machine consumers, pretty text for display-only clients.
    let text = pretty(&payload);
    let mut r = CallToolResult::structured(payload);
    r.content = vec![Content::text(text)];
    r
}

/// Domain failures are ordinary tool results with `is_error` set; the protocol call
/// itself still succeeds.
pub(crate) fn tool_failure(payload: serde_json::Value) -> CallToolResult {
    let text = pretty(&payload);
    let mut r = CallToolResult::structured_error(payload);
    r.content = vec![Content::text(text)];
    r
}

#[cfg(test)]
pub(crate) fn payload_from_result(r: &CallToolResult) -> serde_json::Value {
    if let Some(v) = r.structured_content.clone() {
        return v;
    }
    let s = r
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default();
    serde_json::from_str(&s).unwrap_or_else(|_| serde_json::json!({}))
}
