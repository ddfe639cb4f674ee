use anyhow::{Context, Result};
use listing_watch::api::HttpClient;
use listing_watch::core::logging::init_logging;
use listing_watch::core::{Config, HealthChecker};
use listing_watch::monitoring::{snapshot, ListingMonitor, Notifier};
use listing_watch::scanner::SourceRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config.service)?;

    tracing::info!("🚀 Listing watch starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.monitor.data_dir.display());

    let client = HttpClient::new(config.monitor.http_timeout)
        .context("failed to build HTTP client")?;

    snapshot::ensure_dir(&config.monitor.data_dir)
        .await
        .with_context(|| {
            format!(
                "cannot create data directory {}",
                config.monitor.data_dir.display()
            )
        })?;

    let registry = SourceRegistry::from_config(&config, &client);
    if registry.is_empty() {
        tracing::warn!("⚠️  No sources enabled, cycles will do nothing");
    }

    let notifier = Notifier::from_config(&config.email, &client);
    tracing::info!(
        "📧 Email backend: {} (to: {})",
        notifier.backend_name(),
        config.email.to
    );

    let health_checker = HealthChecker::new();

    // Start health check endpoint
    if config.service.health_port > 0 {
        let health_clone = health_checker.clone();
        let health_port = config.service.health_port;
        tokio::spawn(async move { start_health_server(health_clone, health_port).await });

        tracing::info!("✅ Health endpoint running on port {}", health_port);
    }

    let monitor = ListingMonitor::new(
        registry,
        notifier,
        health_checker,
        config.monitor.clone(),
    );

    // Listen from before the startup cycle so an early signal still lets it finish
    let shutdown = tokio::spawn(shutdown_signal());
    monitor
        .run(async move {
            if let Err(e) = shutdown.await {
                tracing::error!("Signal listener stopped: {}", e);
            }
        })
        .await;

    tracing::info!("👋 Listing watch stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn start_health_server(health_checker: HealthChecker, port: u16) {
    use warp::Filter;

    let health = warp::path("health")
        .and(warp::any().map(move || health_checker.clone()))
        .and_then(|checker: HealthChecker| async move {
            let status = checker.get_status().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&status))
        });

    warp::serve(health).run(([0, 0, 0, 0], port)).await;
}
