use std::process::{Command, Stdio};

fn xsearch() -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("xsearch");
    let mut cmd = Command::new(bin);
    cmd.stdin(Stdio::null());
    for k in [
        "XSEARCH_ENV_FILE",
        "XSEARCH_XAI_API_KEY",
        "XAI_API_KEY",
        "XSEARCH_XAI_BASE_URL",
        "XAI_BASE_URL",
        "XSEARCH_XAI_MODEL",
        "XAI_MODEL",
        "XSEARCH_XAI_TIMEOUT_MS",
        "XAI_TIMEOUT_MS",
    ] {
        cmd.env_remove(k);
    }
    cmd
}

#[test]
fn version_contract() {
    let out = xsearch().args(["version"]).output().expect("run version");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("version json");
    assert_eq!(v["name"].as_str(), Some("xsearch"));
    assert!(!v["version"].as_str().unwrap_or("").is_empty());
}

#[test]
fn mcp_stdio_without_api_key_fails_at_startup() {
    let out = xsearch().args(["mcp-stdio"]).output().expect("run mcp-stdio");
    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("XAI_API_KEY"), "stderr={err}");
}

#[test]
fn doctor_reports_presence_never_secrets() {
    let out = xsearch()
        .args(["doctor"])
        .env("XAI_API_KEY", "very-secret-value")
        .output()
        .expect("run doctor");
    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(!s.contains("very-secret-value"));
    let v: serde_json::Value = serde_json::from_str(&s).expect("doctor json");
    assert_eq!(v["api_key_configured"].as_bool(), Some(true));
    assert_eq!(v["base_url"].as_str(), Some("https://api.x.ai/v1"));
    assert_eq!(v["timeout_ms"].as_u64(), Some(30_000));

    let out = xsearch().args(["doctor"]).output().expect("run doctor");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("doctor json");
    assert_eq!(v["ok"].as_bool(), Some(false));
    assert_eq!(v["api_key_configured"].as_bool(), Some(false));
    assert!(v["config_error"].as_str().is_some());
}

#[test]
fn search_validation_failure_prints_failure_payload() {
    let out = xsearch()
        .args([
            "search",
            "--query",
            "hello",
            "--from-date",
            "2025-03-10",
            "--to-date",
            "2025-03-01",
        ])
        .env("XAI_API_KEY", "k")
        // Unroutable: validation must fail before any request is made.
        .env("XAI_BASE_URL", "http://127.0.0.1:1/v1")
        .output()
        .expect("run search");
    assert!(!out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("failure json");
    assert_eq!(v["status"].as_str(), Some("failed"));
    assert!(v["error"].as_str().unwrap_or("").contains("from_date"));
}

#[test]
fn env_file_fills_missing_config() {
    let dir = std::env::temp_dir().join(format!("xsearch-env-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("xsearch.env");
    std::fs::write(
        &path,
        "# comment\n\nXAI_API_KEY=from-file\nXAI_MODEL = grok-from-file\n",
    )
    .unwrap();

    let out = xsearch()
        .args(["doctor"])
        .env("XSEARCH_ENV_FILE", &path)
        .env("XAI_MODEL", "grok-from-env")
        .output()
        .expect("run doctor");
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("doctor json");
    assert_eq!(v["api_key_configured"].as_bool(), Some(true));
    // Process env wins over the file.
    assert_eq!(v["model"].as_str(), Some("grok-from-env"));
    let _ = std::fs::remove_dir_all(&dir);
}
