//! Server entrypoint for studio-concierge
//!
//! This is the main binary that wires together all layers using
//! dependency injection and serves the chat endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use concierge_application::ChatTurnUseCase;
use concierge_infrastructure::upstream::HttpAuthApi;
use concierge_infrastructure::{
    FunctionSchemaConverter, OpenRouterGateway, ResponseCache, Settings, StudioToolProvider,
    TokenManager, UpstreamGateway, ValidatingExecutor,
};
use concierge_presentation::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "studio-concierge")]
#[command(about = "Conversational concierge for a fitness studio's management API")]
struct Cli {
    /// Path to a configuration file (merged over concierge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides configuration)
    #[arg(short, long)]
    bind: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Fail fast on missing credentials, naming the variable.
    let settings = Settings::load(cli.config.as_deref())?;
    let bind = cli.bind.unwrap_or_else(|| settings.server.bind.clone());

    info!("Starting studio-concierge");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.server.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    // === Dependency Injection ===
    // Upstream side: token lifecycle, cache, gateway, tool executor
    let auth = Arc::new(HttpAuthApi::new(
        http.clone(),
        settings.upstream.base_url.clone(),
        settings.upstream.api_key.clone(),
        settings.upstream.site_id.clone(),
    ));
    let tokens = Arc::new(TokenManager::new(
        auth,
        settings.upstream.username.clone(),
        settings.upstream.password.clone(),
        settings.upstream.static_token.clone(),
    ));
    let cache = Arc::new(ResponseCache::new());
    cache.spawn_sweeper();
    let gateway = Arc::new(UpstreamGateway::new(
        http.clone(),
        settings.upstream.base_url.clone(),
        settings.upstream.api_key.clone(),
        settings.upstream.site_id.clone(),
        tokens,
        cache,
    ));
    let executor = Arc::new(ValidatingExecutor::new(Arc::new(StudioToolProvider::new(
        gateway,
    ))));

    // LLM side: one gateway serves the main and selection calls
    let llm = Arc::new(OpenRouterGateway::new(
        http,
        settings.llm.base_url.clone(),
        settings.llm.api_key.clone(),
        settings.llm.model.clone(),
    ));

    let chat = Arc::new(ChatTurnUseCase::new(
        llm,
        executor,
        Arc::new(FunctionSchemaConverter),
    ));

    let state = Arc::new(AppState {
        chat,
        max_tool_steps: settings.chat.max_tool_steps,
    });
    let router = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            settings.server.request_timeout_secs,
        )));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("Listening on {bind}");
    axum::serve(listener, router).await?;

    Ok(())
}
