pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use error::{MonitorError, MonitorResult};
pub use health::HealthChecker;
