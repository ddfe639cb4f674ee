use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::ServiceConfig;

// scraper and the HTTP stack are chatty at debug
const QUIET_DEPENDENCIES: &str = "hyper=warn,reqwest=warn,warp=warn,html5ever=warn,selectors=warn";

/// `RUST_LOG` wins over the configured level when set.
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},{QUIET_DEPENDENCIES}")))
}

pub fn init_logging(service: &ServiceConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(&service.log_level));

    if service.log_compact {
        registry
            .with(fmt::layer().compact().with_target(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }

    tracing::info!(
        "Logging initialized at level: {} ({})",
        service.log_level,
        if service.log_compact { "compact" } else { "full" }
    );
    Ok(())
}
