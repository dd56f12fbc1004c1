//! Entry point: load configuration, wire the orchestrator's
//! collaborators together, serve the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use veritas_audit::AuditChain;
use veritas_config::{load_settings, Settings};
use veritas_learning::LearningRing;
use veritas_llm::{CircuitBreaker, GeminiBackend, LlmProvider, SharedProvider};
use veritas_orchestrator::Orchestrator;
use veritas_registry::PatternRegistry;
use veritas_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("VERITAS_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("warning: failed to load config: {e}. Using defaults.");
            Settings::default()
        }
    };

    init_tracing(&settings);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting detection engine server");

    let registry = PatternRegistry::new();

    let audit = Arc::new(AuditChain::connect(&settings.audit.database_url).await?);
    tracing::info!(database_url = %settings.audit.database_url, "audit chain connected");

    let learning = match LearningRing::connect(
        &settings.audit.database_url,
        Arc::clone(&audit),
        settings.learning.activation_threshold,
        settings.learning.fp_limit,
    )
    .await
    {
        Ok(ring) => Some(ring),
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize learning ring, proceeding without it");
            None
        }
    };

    let provider: Option<SharedProvider> = match GeminiBackend::new(settings.llm.clone()) {
        Ok(backend) => {
            let breaker = CircuitBreaker::new(backend, &settings.llm.circuit_breaker);
            let provider: Arc<dyn LlmProvider> = Arc::new(breaker);
            tracing::info!(model = %settings.llm.model, "LLM provider configured");
            Some(provider)
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM provider not configured, deep/full scans will degrade to local-only");
            None
        }
    };

    let orchestrator = Orchestrator::new(registry, provider, audit, learning);
    let state = AppState::new(orchestrator, settings.clone());

    let app = create_router(state);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>().unwrap_or([0, 0, 0, 0].into()),
        settings.server.port,
    ));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}

fn init_tracing(settings: &Settings) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| settings.observability.log_filter.clone().into());

    let fmt_layer = if settings.observability.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}
