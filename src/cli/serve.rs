//! Serve command implementation

use crate::agent::factory::create_agent;
use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::{ChatrouteConfig, LogFormat};
use crate::feedback::FeedbackStore;
use crate::metrics::{detached_handle, setup_metrics, MetricsCollector};
use crate::orchestrator::ChatService;
use crate::ratelimit::RateLimits;
use crate::registry::{Backend, Registry};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(args: &ServeArgs) -> anyhow::Result<ChatrouteConfig> {
    let mut config = if args.config.exists() {
        ChatrouteConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        ChatrouteConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if let Some(ref db) = args.feedback_db {
        config.feedback.database_path = Some(db.clone());
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(config: &crate::config::LoggingConfig) -> anyhow::Result<()> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    if config.enable_content_logging {
        eprintln!("WARNING: Content logging is enabled. User messages will appear in logs.");
    }

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Shared HTTP client for every agent.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(10)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("failed to build HTTP client")
}

/// Build the registry from `[[backends]]`, in declaration order.
pub fn load_backends_from_config(
    config: &ChatrouteConfig,
    client: Arc<reqwest::Client>,
) -> anyhow::Result<Registry> {
    let registry = Registry::new();
    for backend_config in &config.backends {
        let agent = create_agent(backend_config, Arc::clone(&client));
        let limits = RateLimits::new(
            backend_config.requests_per_minute(),
            backend_config.requests_per_day(),
        );
        let backend = Backend::new(agent, backend_config.priority, limits)
            .with_timeout(backend_config.timeout());

        registry.add_backend(backend)?;
        tracing::info!(
            name = %backend_config.name,
            backend_type = %backend_config.backend_type,
            model = %backend_config.model(),
            priority = backend_config.priority,
            "Loaded backend from config"
        );
    }

    Ok(registry)
}

/// Assemble the service graph for an already-validated configuration.
pub fn build_app_state(
    config: ChatrouteConfig,
    prometheus: metrics_exporter_prometheus::PrometheusHandle,
) -> anyhow::Result<Arc<AppState>> {
    let client = Arc::new(build_http_client()?);
    let registry = Arc::new(load_backends_from_config(&config, client)?);
    if registry.is_empty() {
        tracing::warn!("No backends configured; every chat turn will be refused");
    }

    let feedback = Arc::new(
        FeedbackStore::from_config(config.feedback.clone())
            .context("failed to open feedback storage")?,
    );
    let service = Arc::new(ChatService::new(
        Arc::clone(&registry),
        feedback,
        config.style_catalog()?,
        config.recommendation.clone(),
    ));
    let metrics = Arc::new(MetricsCollector::new(registry, prometheus));

    Ok(Arc::new(AppState::new(service, metrics, Arc::new(config))))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    init_tracing(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting chatroute");
    tracing::debug!(?config, "Loaded configuration");

    let prometheus = setup_metrics().unwrap_or_else(|e| {
        tracing::debug!("Metrics recorder already installed, using detached handle: {}", e);
        detached_handle()
    });

    let addr = config.server.bind_address();
    let state = build_app_state(config, prometheus)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(addr = %addr, "chatroute API server listening");

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    tracing::info!("chatroute server stopped");
    Ok(())
}
