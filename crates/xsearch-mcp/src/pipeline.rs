use std::time::Instant;
use xsearch_core::{validate, Error, RawSearchArgs, SearchBackend, SearchResult};

/// validate -> build/send/normalize. Validation failures never reach the backend.
pub(crate) async fn run_x_search(
    backend: &dyn SearchBackend,
    raw: &RawSearchArgs,
) -> xsearch_core::Result<SearchResult> {
    let t0 = Instant::now();
    let req = validate(raw).map_err(|errs| {
        tracing::info!(%errs, "x_search rejected invalid arguments");
        Error::InvalidParams(errs)
    })?;
    tracing::info!(
        backend = backend.name(),
        query_chars = req.query.chars().count(),
        allowed_x_handles = req.allowed_x_handles.as_ref().map_or(0, Vec::len),
        excluded_x_handles = req.excluded_x_handles.as_ref().map_or(0, Vec::len),
        "x_search started"
    );
    match backend.search(&req).await {
        Ok(out) => {
            tracing::info!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                citations = out.citations.len(),
                "x_search finished"
            );
            Ok(out)
        }
        Err(e) => {
            tracing::warn!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                error = %e,
                "x_search failed"
            );
            Err(e)
        }
    }
}

/// Uniform failure shape returned to callers for every error kind.
pub(crate) fn failure_payload(err: &Error) -> serde_json::Value {
    serde_json::json!({
        "error": err.to_string(),
        "status": "failed"
    })
}

pub(crate) fn success_payload(out: &SearchResult) -> Result<serde_json::Value, Error> {
    serde_json::to_value(out).map_err(|e| Error::Encode(e.to_string()))
}
