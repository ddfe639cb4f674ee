use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Okx,
    Kucoin,
    Gate,
    Coinbase,
    Bitget,
    Mexc,
}

impl Exchange {
    /// Fixed enumeration order used by every cycle.
    pub const ALL: [Exchange; 8] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Kucoin,
        Exchange::Gate,
        Exchange::Coinbase,
        Exchange::Bitget,
        Exchange::Mexc,
    ];

    /// Exchanges that publish a new-listing announcement feed we know how to read.
    pub const WITH_ANNOUNCEMENTS: [Exchange; 4] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Kucoin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Kucoin => "kucoin",
            Exchange::Gate => "gate",
            Exchange::Coinbase => "coinbase",
            Exchange::Bitget => "bitget",
            Exchange::Mexc => "mexc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
            Exchange::Okx => "OKX",
            Exchange::Kucoin => "KuCoin",
            Exchange::Gate => "Gate.io",
            Exchange::Coinbase => "Coinbase",
            Exchange::Bitget => "Bitget",
            Exchange::Mexc => "MEXC",
        }
    }

    pub fn default_listings_url(&self) -> &'static str {
        match self {
            Exchange::Binance => "https://api.binance.com/api/v3/exchangeInfo",
            Exchange::Bybit => "https://api.bybit.com/v5/market/instruments-info?category=spot",
            Exchange::Okx => "https://www.okx.com/api/v5/public/instruments?instType=SPOT",
            Exchange::Kucoin => "https://api.kucoin.com/api/v2/symbols",
            Exchange::Gate => "https://api.gateio.ws/api/v4/spot/currency_pairs",
            Exchange::Coinbase => "https://api.exchange.coinbase.com/products",
            Exchange::Bitget => "https://api.bitget.com/api/v2/spot/public/symbols",
            Exchange::Mexc => "https://api.mexc.com/api/v3/exchangeInfo",
        }
    }

    pub fn default_announcements_url(&self) -> Option<&'static str> {
        match self {
            Exchange::Binance => Some(
                "https://www.binance.com/bapi/composite/v1/public/cms/article/list/query?type=1&pageNo=1&pageSize=20&catalogId=48",
            ),
            Exchange::Bybit => Some(
                "https://api.bybit.com/v5/announcements/index?locale=en-US&type=new_crypto&limit=20",
            ),
            Exchange::Okx => Some("https://www.okx.com/help/section/announcements-new-listings"),
            Exchange::Kucoin => Some("https://www.kucoin.com/announcement/new-listings"),
            _ => None,
        }
    }

    /// Prefix for per-exchange environment overrides, e.g. `BINANCE_LISTINGS_URL`.
    pub fn env_prefix(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "okx" => Ok(Exchange::Okx),
            "kucoin" => Ok(Exchange::Kucoin),
            "gate" | "gateio" | "gate.io" => Ok(Exchange::Gate),
            "coinbase" => Ok(Exchange::Coinbase),
            "bitget" => Ok(Exchange::Bitget),
            "mexc" => Ok(Exchange::Mexc),
            other => Err(MonitorError::Config(format!("unknown exchange: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!(" OKX ".parse::<Exchange>().unwrap(), Exchange::Okx);
        assert_eq!("gate.io".parse::<Exchange>().unwrap(), Exchange::Gate);
        assert!("ftx".parse::<Exchange>().is_err());
    }

    #[test]
    fn test_serializes_as_identifier() {
        let json = serde_json::to_string(&Exchange::Kucoin).unwrap();
        assert_eq!(json, "\"kucoin\"");
        let back: Exchange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Exchange::Kucoin);
    }

    #[test]
    fn test_announcement_feeds_have_urls() {
        for exchange in Exchange::WITH_ANNOUNCEMENTS {
            assert!(exchange.default_announcements_url().is_some());
        }
        assert!(Exchange::Gate.default_announcements_url().is_none());
    }
}
