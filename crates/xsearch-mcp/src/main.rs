use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use xsearch_core::{RawSearchArgs, SearchBackend};
use xsearch_local::xai::xai_api_key_from_env;
use xsearch_local::{XaiClient, XaiConfig};

mod pipeline;

#[derive(Parser, Debug)]
#[command(name = "xsearch")]
#[command(about = "Search X through the xAI Responses API (MCP stdio server)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as an MCP stdio server exposing the `x_search` tool.
    #[cfg(feature = "stdio")]
    McpStdio,
    /// Run one x_search from the command line and print the result (json).
    Search(SearchCmd),
    /// Diagnose configuration issues (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    /// Query text (1-2000 characters).
    #[arg(long)]
    query: String,
    /// Only consider posts from this handle (repeatable, max 10).
    #[arg(long = "allowed-x-handle")]
    allowed_x_handles: Vec<String>,
    /// Ignore posts from this handle (repeatable, max 10).
    #[arg(long = "excluded-x-handle")]
    excluded_x_handles: Vec<String>,
    /// Earliest post date (YYYY-MM-DD).
    #[arg(long)]
    from_date: Option<String>,
    /// Latest post date (YYYY-MM-DD).
    #[arg(long)]
    to_date: Option<String>,
    #[arg(long, action = clap::ArgAction::Set)]
    enable_image_understanding: Option<bool>,
    #[arg(long, action = clap::ArgAction::Set)]
    enable_video_understanding: Option<bool>,
    /// Include the provider's raw response in the output.
    #[arg(long, default_value_t = false)]
    include_raw_response: bool,
}

impl SearchCmd {
    fn into_raw(self) -> RawSearchArgs {
        use serde_json::Value;
        let list = |v: Vec<String>| (!v.is_empty()).then(|| serde_json::json!(v));
        RawSearchArgs {
            query: Some(Value::String(self.query)),
            allowed_x_handles: list(self.allowed_x_handles),
            excluded_x_handles: list(self.excluded_x_handles),
            from_date: self.from_date.map(Value::String),
            to_date: self.to_date.map(Value::String),
            enable_image_understanding: self.enable_image_understanding.map(Value::Bool),
            enable_video_understanding: self.enable_video_understanding.map(Value::Bool),
            include_raw_response: self.include_raw_response.then_some(Value::Bool(true)),
        }
    }
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[cfg(feature = "stdio")]
mod mcp {
    use crate::pipeline::{failure_payload, run_x_search, success_payload};
    use rmcp::{
        handler::server::router::tool::ToolRouter as RmcpToolRouter,
        handler::server::wrapper::Parameters,
        model::{CallToolResult, ServerCapabilities, ServerInfo},
        tool, tool_handler, tool_router,
        transport::stdio,
        ErrorData as McpError, ServiceExt,
    };
    use std::sync::Arc;
    use xsearch_core::{RawSearchArgs, SearchBackend};

    #[path = "envelope.rs"]
    mod envelope;
    use envelope::*;

    #[derive(Clone)]
    pub(crate) struct XSearchMcp {
        tool_router: RmcpToolRouter<Self>,
        backend: Arc<dyn SearchBackend>,
    }

    #[tool_router]
    impl XSearchMcp {
        pub(crate) fn new(backend: Arc<dyn SearchBackend>) -> Self {
            Self {
                tool_router: Self::tool_router(),
                backend,
            }
        }

        #[tool(
            description = "Search posts on X and get a cited answer. Filters: allowed_x_handles or excluded_x_handles (max 10, not both), from_date/to_date (YYYY-MM-DD), image/video understanding."
        )]
        async fn x_search(
            &self,
            params: Parameters<Option<RawSearchArgs>>,
        ) -> Result<CallToolResult, McpError> {
            let args = params.0.unwrap_or_default();
            let out = run_x_search(self.backend.as_ref(), &args)
                .await
                .and_then(|r| success_payload(&r));
            Ok(match out {
                Ok(payload) => tool_result(payload),
                Err(e) => tool_failure(failure_payload(&e)),
            })
        }
    }

    #[tool_handler]
    impl rmcp::ServerHandler for XSearchMcp {
        fn get_info(&self) -> ServerInfo {
            ServerInfo {
                instructions: Some(
                    "x_search answers questions from live X posts via the xAI Responses API. Outputs are JSON with an answer and de-duplicated citations."
                        .to_string(),
                ),
                capabilities: ServerCapabilities::builder().enable_tools().build(),
                ..Default::default()
            }
        }
    }

    pub(crate) async fn serve_stdio(backend: Arc<dyn SearchBackend>) -> Result<(), McpError> {
        let svc = XSearchMcp::new(backend);
        let running = svc
            .serve(stdio())
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        // Keep the stdio server alive until the client closes.
        running
            .waiting()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(())
    }

}

fn init_tracing() {
    // stdout carries the MCP transport, so logs go to stderr.
    let filter = tracing_subscriber::EnvFilter::try_from_env("XSEARCH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Apply `KEY=VALUE` lines from `XSEARCH_ENV_FILE` without overriding the process env.
fn load_env_file() {
    let Ok(p) = std::env::var("XSEARCH_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn backend_from_env() -> Result<Arc<dyn SearchBackend>> {
    let cfg = XaiConfig::from_env()?;
    tracing::info!(
        base_url = %cfg.base_url,
        model = %cfg.model,
        timeout_ms = cfg.timeout_ms,
        "xai backend configured"
    );
    let http = reqwest::Client::builder()
        .user_agent(concat!("xsearch/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(Arc::new(XaiClient::new(http, cfg)))
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "stdio")]
        Commands::McpStdio => {
            let backend = backend_from_env()?;
            mcp::serve_stdio(backend)
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        }
        Commands::Search(args) => {
            let backend = backend_from_env()?;
            let raw = args.into_raw();
            let out = pipeline::run_x_search(backend.as_ref(), &raw)
                .await
                .and_then(|r| pipeline::success_payload(&r));
            match out {
                Ok(v) => println!("{}", serde_json::to_string_pretty(&v)?),
                Err(e) => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&pipeline::failure_payload(&e))?
                    );
                    anyhow::bail!("x_search failed");
                }
            }
        }
        Commands::Doctor(args) => {
            let cfg = XaiConfig::from_env();
            let mut v = serde_json::json!({
                "kind": "doctor",
                "name": "xsearch",
                "version": env!("CARGO_PKG_VERSION"),
                "ok": cfg.is_ok(),
                // Presence only; never the value.
                "api_key_configured": xai_api_key_from_env().is_some(),
            });
            match &cfg {
                Ok(c) => {
                    v["base_url"] = serde_json::json!(c.base_url);
                    v["endpoint"] = serde_json::json!(c.endpoint_responses());
                    v["model"] = serde_json::json!(c.model);
                    v["timeout_ms"] = serde_json::json!(c.timeout_ms);
                }
                Err(e) => v["config_error"] = serde_json::json!(e.to_string()),
            }
            match args.output.to_ascii_lowercase().as_str() {
                "text" => match &cfg {
                    Ok(c) => println!("ok: {} model={} timeout_ms={}", c.base_url, c.model, c.timeout_ms),
                    Err(e) => println!("not ok: {e}"),
                },
                _ => println!("{}", serde_json::to_string_pretty(&v)?),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "kind": "version",
                "ok": true,
                "name": "xsearch",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("xsearch {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }
    Ok(())
}
