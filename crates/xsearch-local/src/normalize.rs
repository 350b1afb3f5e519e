//! Turn a loosely-structured Responses payload into a stable `SearchResult`.
//!
//! Nothing in here fails: a missing or oddly-shaped field degrades to empty text or an
//! empty citation list.

use serde_json::Value;
use std::collections::HashSet;
use xsearch_core::{Citation, SearchResult};

/// The `output_text` entry of the first `message` output, if any.
fn output_text_entry(resp: &Value) -> Option<&Value> {
    resp.get("output")?
        .as_array()?
        .iter()
        .find(|o| o.get("type").and_then(Value::as_str) == Some("message"))?
        .get("content")?
        .as_array()?
        .iter()
        .find(|c| c.get("type").and_then(Value::as_str) == Some("output_text"))
}

/// Any JSON number counts as an offset; floats are truncated toward zero.
fn offset(v: Option<&Value>) -> Option<i64> {
    let n = v?.as_number()?;
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f.trunc() as i64)
    })
}

fn url_citations(entry: Option<&Value>) -> Vec<Citation> {
    let Some(anns) = entry
        .and_then(|e| e.get("annotations"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    anns.iter()
        .filter(|a| a.get("type").and_then(Value::as_str) == Some("url_citation"))
        .filter_map(|a| {
            let url = a.get("url").and_then(Value::as_str)?;
            if url.is_empty() {
                return None;
            }
            Some(Citation {
                url: url.to_string(),
                start_index: offset(a.get("start_index")),
                end_index: offset(a.get("end_index")),
                title: a.get("title").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}

fn dedupe_by_url(cs: Vec<Citation>) -> Vec<Citation> {
    let mut seen = HashSet::new();
    cs.into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}

pub fn normalize(resp: &Value, include_raw_response: bool) -> SearchResult {
    let entry = output_text_entry(resp);
    let text = entry
        .and_then(|e| e.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    let payload = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(m)) => Some(m),
        _ => {
            tracing::debug!("output_text is not a JSON object; using raw text as answer");
            None
        }
    };

    let inline_citations = dedupe_by_url(url_citations(entry));
    let citations: Vec<String> = if !inline_citations.is_empty() {
        inline_citations.iter().map(|c| c.url.clone()).collect()
    } else {
        // Secondary source: kept in the order given, duplicates included.
        payload
            .as_ref()
            .and_then(|m| m.get("citations"))
            .and_then(Value::as_array)
            .map(|xs| {
                xs.iter()
                    .filter_map(Value::as_str)
                    .filter(|s| s.starts_with("http"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let answer = payload
        .as_ref()
        .and_then(|m| m.get("answer"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(text)
        .to_string();

    SearchResult {
        answer,
        citations,
        inline_citations,
        raw_response: include_raw_response.then(|| resp.clone()),
    }
}
