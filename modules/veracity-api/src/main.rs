use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::{JinaClient, OpenRouterClient, PerplexityClient};
use firecrawl_client::FirecrawlClient;
use veracity_common::Settings;
use veracity_core::providers::{FirecrawlSearch, JinaGrounding, OpenRouterChat, PerplexityChat};
use veracity_core::strategies::{ClaimGrounding, DeepResearch, QuickSearch, Research};
use veracity_core::{
    Analyzer, ChatApi, MemoryCache, MemoryLedger, MemoryProgressStore, Orchestrator,
    SessionDirectory, TokioRunner, UsageLedger,
};

mod content;
mod rest;

use content::InlineContentStore;

pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub ledger: Arc<dyn UsageLedger>,
    pub content: Arc<InlineContentStore>,
}

fn build_analyzers(settings: &Settings) -> Vec<Arc<dyn Analyzer>> {
    let mut openrouter = OpenRouterClient::new(&settings.openrouter_api_key)
        .with_app_name(&settings.site_name);
    if !settings.site_url.is_empty() {
        openrouter = openrouter.with_site_url(&settings.site_url);
    }
    let openrouter_chat: Arc<dyn ChatApi> =
        Arc::new(OpenRouterChat::new(openrouter, &settings.openrouter_model));

    let perplexity_chat: Arc<dyn ChatApi> = Arc::new(PerplexityChat::new(
        PerplexityClient::new(&settings.perplexity_api_key),
        &settings.perplexity_model,
    ));

    let search = Arc::new(FirecrawlSearch::new(FirecrawlClient::new(
        &settings.firecrawl_api_key,
    )));
    let grounding = Arc::new(JinaGrounding::new(JinaClient::new(&settings.jina_api_key)));

    vec![
        Arc::new(QuickSearch::new(openrouter_chat.clone())),
        Arc::new(DeepResearch::new(
            openrouter_chat,
            search,
            settings.max_claims,
            settings.searches_per_claim,
        )),
        Arc::new(ClaimGrounding::new(grounding, settings.max_claims)),
        Arc::new(Research::new(perplexity_chat)),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("veracity=info".parse()?))
        .init();

    let settings = Settings::from_env();
    let host = settings.web_host.clone();
    let port = settings.web_port;
    let mode = settings.mode;

    let content = Arc::new(InlineContentStore::new());
    let ledger: Arc<dyn UsageLedger> = Arc::new(MemoryLedger::new(settings.free_limit));
    let analyzers = build_analyzers(&settings);

    let orchestrator = Arc::new(Orchestrator::new(
        settings,
        content.clone(),
        Arc::new(SessionDirectory),
        Arc::new(MemoryCache::new()),
        ledger.clone(),
        Arc::new(MemoryProgressStore::new()),
        Arc::new(TokioRunner),
        analyzers,
    ));

    let state = Arc::new(AppState {
        orchestrator,
        ledger,
        content,
    });

    let app = Router::new()
        .route("/health", get(rest::health))
        .route("/api/check", post(rest::api_check))
        .route("/api/progress/{task_id}", get(rest::api_progress))
        .route("/api/email", post(rest::api_email))
        .route("/api/register", post(rest::api_register))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Progress records change every poll; nothing here may be cached
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{host}:{port}");
    info!(%mode, "Veracity API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
