use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::MonitorError;
use crate::api::Exchange;

#[derive(Debug, Clone)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub listings: Vec<SourceConfig>,
    pub announcements: Vec<SourceConfig>,
    pub email: EmailConfig,
    pub service: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub data_dir: PathBuf,
    pub check_interval: Duration,
    pub http_timeout: Duration,
    pub digest_mode: DigestMode,
    pub notify_on_first_run: bool,
    /// 0 keeps every announcement ever seen.
    pub announcement_history_limit: usize,
}

/// One pollable source: enablement, URL, snapshot path.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub exchange: Exchange,
    pub enabled: bool,
    pub url: String,
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub backend: EmailBackend,
    pub sendgrid_api_key: Option<String>,
    pub from: String,
    pub to: String,
    pub subject_prefix: String,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 0 disables the health endpoint.
    pub health_port: u16,
    pub log_level: String,
    /// `LOG_FORMAT=compact` for single-line output.
    pub log_compact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    SendGrid,
    Log,
}

impl FromStr for EmailBackend {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sendgrid" => Ok(EmailBackend::SendGrid),
            "log" | "none" | "dry-run" => Ok(EmailBackend::Log),
            other => Err(MonitorError::Config(format!("unknown EMAIL_BACKEND: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMode {
    /// One email per source with new items, sent before that source is saved.
    PerSource,
    /// One combined email at the end of the cycle.
    PerCycle,
}

impl FromStr for DigestMode {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_source" | "source" => Ok(DigestMode::PerSource),
            "per_cycle" | "cycle" => Ok(DigestMode::PerCycle),
            other => Err(MonitorError::Config(format!("unknown DIGEST_MODE: {other}"))),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_dir = PathBuf::from(var("DATA_DIR", "./data"));

        let interval_minutes: u64 = var("CHECK_INTERVAL_MINUTES", "15")
            .parse()
            .context("CHECK_INTERVAL_MINUTES must be a whole number of minutes")?;
        if interval_minutes == 0 {
            return Err(MonitorError::Config("CHECK_INTERVAL_MINUTES must be > 0".into()).into());
        }

        let timeout_secs: u64 = var("HTTP_TIMEOUT_SECS", "30")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        let listings_enabled = parse_enabled(&var("LISTINGS_ENABLED", "all"))?;
        let announcements_enabled = parse_enabled(&var("ANNOUNCEMENTS_ENABLED", "all"))?;

        let listings = Exchange::ALL
            .iter()
            .map(|&exchange| {
                let url = lookup(&format!("{}_LISTINGS_URL", exchange.env_prefix()))
                    .unwrap_or_else(|| exchange.default_listings_url().to_string());
                SourceConfig {
                    exchange,
                    enabled: listings_enabled.contains(&exchange),
                    url,
                    data_file: data_dir.join(format!("{exchange}_symbols.json")),
                }
            })
            .collect();

        let announcements = Exchange::WITH_ANNOUNCEMENTS
            .iter()
            .filter_map(|&exchange| {
                let url = lookup(&format!("{}_ANNOUNCEMENTS_URL", exchange.env_prefix()))
                    .or_else(|| exchange.default_announcements_url().map(str::to_string))?;
                Some(SourceConfig {
                    exchange,
                    enabled: announcements_enabled.contains(&exchange),
                    url,
                    data_file: data_dir.join(format!("{exchange}_announcements.json")),
                })
            })
            .collect();

        let sendgrid_api_key = lookup("SENDGRID_API_KEY").filter(|k| !k.trim().is_empty());
        let backend = match lookup("EMAIL_BACKEND") {
            Some(raw) => raw.parse::<EmailBackend>()?,
            None if sendgrid_api_key.is_some() => EmailBackend::SendGrid,
            None => EmailBackend::Log,
        };

        Ok(Config {
            monitor: MonitorConfig {
                data_dir,
                check_interval: Duration::from_secs(interval_minutes * 60),
                http_timeout: Duration::from_secs(timeout_secs),
                digest_mode: var("DIGEST_MODE", "per_source").parse()?,
                notify_on_first_run: parse_bool(&var("NOTIFY_ON_FIRST_RUN", "true")),
                announcement_history_limit: var("ANNOUNCEMENT_HISTORY_LIMIT", "500")
                    .parse()
                    .context("ANNOUNCEMENT_HISTORY_LIMIT must be a number")?,
            },
            listings,
            announcements,
            email: EmailConfig {
                backend,
                sendgrid_api_key,
                from: var("EMAIL_FROM", "listing-watch@localhost"),
                to: var("EMAIL_TO", "ops@localhost"),
                subject_prefix: var("EMAIL_SUBJECT_PREFIX", "[listing-watch]"),
            },
            service: ServiceConfig {
                health_port: var("HEALTH_PORT", "0")
                    .parse()
                    .context("HEALTH_PORT must be a port number")?,
                log_level: var("LOG_LEVEL", "info"),
                log_compact: var("LOG_FORMAT", "full").trim().eq_ignore_ascii_case("compact"),
            },
        })
    }

    pub fn enabled_listings(&self) -> impl Iterator<Item = &SourceConfig> {
        self.listings.iter().filter(|s| s.enabled)
    }

    pub fn enabled_announcements(&self) -> impl Iterator<Item = &SourceConfig> {
        self.announcements.iter().filter(|s| s.enabled)
    }
}

/// `all`, `none`, or a comma list of exchange names.
fn parse_enabled(raw: &str) -> Result<Vec<Exchange>, MonitorError> {
    match raw.trim().to_lowercase().as_str() {
        "all" | "*" => Ok(Exchange::ALL.to_vec()),
        "" | "none" => Ok(Vec::new()),
        list => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<Exchange>())
            .collect(),
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.monitor.check_interval, Duration::from_secs(15 * 60));
        assert_eq!(config.monitor.http_timeout, Duration::from_secs(30));
        assert_eq!(config.monitor.digest_mode, DigestMode::PerSource);
        assert_eq!(config.email.backend, EmailBackend::Log);
        assert_eq!(config.listings.len(), Exchange::ALL.len());
        assert_eq!(config.announcements.len(), Exchange::WITH_ANNOUNCEMENTS.len());
        assert_eq!(
            config.listings[0].data_file,
            PathBuf::from("./data").join("binance_symbols.json")
        );
    }

    #[test]
    fn test_enablement_and_url_override() {
        let config = config_from(&[
            ("LISTINGS_ENABLED", "binance, okx"),
            ("ANNOUNCEMENTS_ENABLED", "none"),
            ("OKX_LISTINGS_URL", "http://localhost/okx"),
            ("DATA_DIR", "/var/lib/lw"),
        ])
        .unwrap();

        let enabled: Vec<Exchange> = config.enabled_listings().map(|s| s.exchange).collect();
        assert_eq!(enabled, vec![Exchange::Binance, Exchange::Okx]);
        assert_eq!(config.enabled_announcements().count(), 0);

        let okx = config.listings.iter().find(|s| s.exchange == Exchange::Okx).unwrap();
        assert_eq!(okx.url, "http://localhost/okx");
        assert_eq!(okx.data_file, PathBuf::from("/var/lib/lw/okx_symbols.json"));
    }

    #[test]
    fn test_sendgrid_selected_when_key_present() {
        let config = config_from(&[("SENDGRID_API_KEY", "SG.x")]).unwrap();
        assert_eq!(config.email.backend, EmailBackend::SendGrid);

        let forced = config_from(&[("SENDGRID_API_KEY", "SG.x"), ("EMAIL_BACKEND", "log")]).unwrap();
        assert_eq!(forced.email.backend, EmailBackend::Log);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("EMAIL_BACKEND", "pigeon")]).is_err());
        assert!(config_from(&[("DIGEST_MODE", "hourly")]).is_err());
        assert!(config_from(&[("LISTINGS_ENABLED", "binance,ftx")]).is_err());
        assert!(config_from(&[("CHECK_INTERVAL_MINUTES", "0")]).is_err());
        assert!(config_from(&[("CHECK_INTERVAL_MINUTES", "soon")]).is_err());
    }

    #[test]
    fn test_digest_mode_spellings() {
        assert_eq!("per-cycle".parse::<DigestMode>().unwrap(), DigestMode::PerCycle);
        assert_eq!("PER_SOURCE".parse::<DigestMode>().unwrap(), DigestMode::PerSource);
    }
}
