//! harperbot HTTP server

use anyhow::Context;
use clap::Parser;
use harper_core::ModelFamily;
use harper_llm::providers::{AnthropicProvider, OpenAIProvider};
use harper_runtime::AgentRuntime;
use harper_server::{AppState, router};
use harper_utils::{Config, LogFormat, init_tracing_with};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "harperbot")]
#[command(about = "ReAct agent and chat pass-through over HTTP", long_about = None)]
struct Args {
    /// Interface to bind
    #[arg(long, env = "HARPER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "HARPER_PORT", default_value_t = 8000)]
    port: u16,

    /// Deployment environment name
    #[arg(long, env = "HARPER_ENV", default_value = "development")]
    environment: String,

    /// Model used by /react when the request names none
    #[arg(long, env = "HARPER_DEFAULT_MODEL", default_value = "gpt-4")]
    default_model: String,

    /// Iteration bound used by /react when the request names none
    #[arg(long, env = "HARPER_DEFAULT_MAX_ITERATIONS", default_value_t = 3)]
    default_max_iterations: u32,

    /// Largest iteration bound a request may ask for
    #[arg(long, env = "HARPER_MAX_ITERATIONS_LIMIT", default_value_t = 25)]
    max_iterations_limit: u32,

    /// Whole-request deadline in seconds
    #[arg(long, env = "HARPER_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    request_timeout_secs: u64,

    /// Per-tool deadline in seconds
    #[arg(long, env = "HARPER_TOOL_TIMEOUT_SECS", default_value_t = 30)]
    tool_timeout_secs: u64,

    /// Primary model for /chat
    #[arg(long, env = "HARPER_CHAT_MODEL", default_value = "gpt-5")]
    chat_model: String,

    /// Fallback model for /chat
    #[arg(long, env = "HARPER_CHAT_FALLBACK_MODEL", default_value = "gpt-4")]
    chat_fallback_model: String,

    /// Log output format (pretty or json)
    #[arg(long, env = "HARPER_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Use provider-native tool calling in the ReAct loop
    #[arg(long, env = "HARPER_NATIVE_TOOLS")]
    native_tools: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing_with(args.log_format);

    let config = Config::builder()
        .host(args.host)
        .port(args.port)
        .environment(args.environment)
        .default_model(args.default_model)
        .default_max_iterations(args.default_max_iterations)
        .max_iterations_limit(args.max_iterations_limit)
        .request_timeout(Duration::from_secs(args.request_timeout_secs))
        .tool_timeout(Duration::from_secs(args.tool_timeout_secs))
        .chat_model(args.chat_model)
        .chat_fallback_model(args.chat_fallback_model)
        .log_format(args.log_format)
        .build()?;

    let mut builder = AgentRuntime::builder()
        .config(config.clone())
        .native_tools(args.native_tools);

    match OpenAIProvider::from_env() {
        Ok(provider) => builder = builder.provider(ModelFamily::OpenAI, Arc::new(provider)),
        Err(e) => warn!("OpenAI models disabled: {e}"),
    }

    match AnthropicProvider::from_env() {
        Ok(provider) => builder = builder.provider(ModelFamily::Anthropic, Arc::new(provider)),
        Err(e) => warn!("Anthropic models disabled: {e}"),
    }

    let runtime = builder.build()?;
    let app = router(Arc::new(AppState::new(runtime)));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        %addr,
        environment = %config.environment,
        default_model = %config.default_model,
        "Starting harperbot"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
