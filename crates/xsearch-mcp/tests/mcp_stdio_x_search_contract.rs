use axum::{extract::State, routing::post, Json, Router};
use rmcp::{
    model::{CallToolRequestParam, CallToolResult},
    service::{RoleClient, RunningService, ServiceExt},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

type Bodies = Arc<Mutex<Vec<serde_json::Value>>>;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Fake `/v1/responses`: records every body; queries containing SLOW never answer in time.
async fn fake_responses(
    State(bodies): State<Bodies>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let query = body["input"][1]["content"].as_str().unwrap_or("").to_string();
    bodies.lock().unwrap().push(body);
    if query.contains("SLOW") {
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
    }
    Json(serde_json::json!({
        "id": "resp_1",
        "output": [{
            "type": "message",
            "content": [{
                "type": "output_text",
                "text": "{\"answer\":\"xAI posted an update.\",\"citations\":[]}",
                "annotations": [
                    { "type": "url_citation", "url": "https://x.com/xai/status/9", "start_index": 0, "end_index": 3 },
                    { "type": "url_citation", "url": "https://x.com/xai/status/9" }
                ]
            }]
        }]
    }))
}

fn payload(r: &CallToolResult) -> serde_json::Value {
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

async fn call(
    service: &RunningService<RoleClient, ()>,
    args: serde_json::Value,
) -> CallToolResult {
    service
        .call_tool(CallToolRequestParam {
            name: "x_search".into(),
            arguments: Some(args.as_object().cloned().unwrap()),
        })
        .await
        .expect("call_tool must succeed at the protocol level")
}

#[tokio::test]
async fn x_search_end_to_end_over_stdio() {
    let bodies: Bodies = Arc::default();
    let app = Router::new()
        .route("/v1/responses", post(fake_responses))
        .with_state(bodies.clone());
    let addr = serve(app).await;

    let bin = assert_cmd::cargo::cargo_bin!("xsearch");
    let service = ()
        .serve(
            TokioChildProcess::new(tokio::process::Command::new(bin).configure(|cmd| {
                cmd.args(["mcp-stdio"]);
                cmd.env_remove("XSEARCH_ENV_FILE");
                cmd.env_remove("XSEARCH_XAI_API_KEY");
                cmd.env_remove("XSEARCH_XAI_BASE_URL");
                cmd.env_remove("XSEARCH_XAI_MODEL");
                cmd.env_remove("XSEARCH_XAI_TIMEOUT_MS");
                cmd.env("XAI_API_KEY", "test-key");
                cmd.env("XAI_BASE_URL", format!("http://{addr}/v1"));
                cmd.env("XAI_MODEL", "grok-test");
                cmd.env("XAI_TIMEOUT_MS", "1000");
            }))
            .expect("spawn mcp child"),
        )
        .await
        .expect("serve mcp child");

    let tools = service.list_tools(Default::default()).await.unwrap();
    let names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, vec!["x_search".to_string()]);

    // Success: only supplied filters reach the provider.
    let r = call(
        &service,
        serde_json::json!({
            "query": "Summarize the latest post from @xai",
            "allowed_x_handles": ["xai"],
            "from_date": "2025-12-01"
        }),
    )
    .await;
    assert_ne!(r.is_error, Some(true));
    let v = payload(&r);
    assert_eq!(v["answer"], "xAI posted an update.");
    assert_eq!(v["citations"], serde_json::json!(["https://x.com/xai/status/9"]));
    assert_eq!(v["inline_citations"].as_array().map(Vec::len), Some(1));
    assert!(v.get("raw_response").is_none(), "payload={v}");
    {
        let seen = bodies.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["model"], "grok-test");
        assert_eq!(
            seen[0]["tools"],
            serde_json::json!([{ "type": "x_search", "allowed_x_handles": ["xai"], "from_date": "2025-12-01" }])
        );
    }

    // Validation failure: flagged, uniform shape, no upstream call.
    let r = call(
        &service,
        serde_json::json!({
            "query": "q",
            "allowed_x_handles": ["a"],
            "excluded_x_handles": ["b"],
            "from_date": "2025-02-30"
        }),
    )
    .await;
    assert_eq!(r.is_error, Some(true));
    let v = payload(&r);
    assert_eq!(v["status"], "failed");
    let msg = v["error"].as_str().unwrap_or("");
    assert!(msg.contains("allowed_x_handles") && msg.contains("from_date"), "{msg}");
    assert_eq!(bodies.lock().unwrap().len(), 1);

    // Raw response on request.
    let r = call(
        &service,
        serde_json::json!({ "query": "anything", "include_raw_response": true }),
    )
    .await;
    assert_eq!(payload(&r)["raw_response"]["id"], "resp_1");

    // Timeout: failure result, server keeps running.
    let r = call(&service, serde_json::json!({ "query": "SLOW please" })).await;
    assert_eq!(r.is_error, Some(true));
    let v = payload(&r);
    assert_eq!(v["status"], "failed");
    assert!(v["error"].as_str().unwrap_or("").contains("timed out"), "payload={v}");

    let r = call(&service, serde_json::json!({ "query": "still alive?" })).await;
    assert_ne!(r.is_error, Some(true));

    service.cancel().await.expect("cancel");
}
