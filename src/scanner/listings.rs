use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::api::types::*;
use crate::api::{Exchange, HttpClient};
use crate::core::error::{MonitorError, MonitorResult};
use crate::monitoring::records::SymbolRecord;

/// A source of the tradable symbols on one exchange.
///
/// `fetch_listings` never fails: transport and shape errors are logged and
/// produce an empty list. The monitor calls `try_fetch_listings` so it can
/// record the error against the source before moving on.
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn exchange(&self) -> Exchange;
    fn data_file_path(&self) -> &Path;
    async fn try_fetch_listings(&self) -> MonitorResult<Vec<SymbolRecord>>;

    async fn fetch_listings(&self) -> Vec<SymbolRecord> {
        match self.try_fetch_listings().await {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::error!("❌ Failed to fetch {} listings: {}", self.exchange(), e);
                Vec::new()
            }
        }
    }
}

pub struct RestListingSource {
    exchange: Exchange,
    url: String,
    data_file: PathBuf,
    client: HttpClient,
}

impl RestListingSource {
    pub fn new(exchange: Exchange, url: String, data_file: PathBuf, client: HttpClient) -> Self {
        Self {
            exchange,
            url,
            data_file,
            client,
        }
    }
}

#[async_trait]
impl ListingSource for RestListingSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    fn data_file_path(&self) -> &Path {
        &self.data_file
    }

    async fn try_fetch_listings(&self) -> MonitorResult<Vec<SymbolRecord>> {
        let start = Instant::now();
        let body = self.client.get_text(&self.url).await?;
        let symbols = decode_listings(self.exchange, &self.url, &body)?;

        tracing::debug!(
            "⚡ {} listings fetched in {:.2}ms ({} symbols)",
            self.exchange,
            start.elapsed().as_secs_f64() * 1000.0,
            symbols.len()
        );
        Ok(symbols)
    }
}

/// Decode an exchange's instrument list into normalized, currently trading symbols.
pub fn decode_listings(
    exchange: Exchange,
    url: &str,
    body: &str,
) -> MonitorResult<Vec<SymbolRecord>> {
    let decode_err = |e: serde_json::Error| MonitorError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let api_err = |message: String| MonitorError::Api {
        exchange: exchange.to_string(),
        message,
    };

    let records = match exchange {
        Exchange::Binance => {
            let resp: ExchangeInfoResponse = serde_json::from_str(body).map_err(decode_err)?;
            resp.symbols
                .into_iter()
                .filter(|s| s.status == "TRADING")
                .map(|s| SymbolRecord::new(exchange, &s.symbol, &s.base_asset, &s.quote_asset))
                .collect()
        }
        Exchange::Mexc => {
            // "1" is online; older v3 responses say "ENABLED"
            let resp: ExchangeInfoResponse = serde_json::from_str(body).map_err(decode_err)?;
            resp.symbols
                .into_iter()
                .filter(|s| matches!(s.status.as_str(), "1" | "ENABLED"))
                .map(|s| SymbolRecord::new(exchange, &s.symbol, &s.base_asset, &s.quote_asset))
                .collect()
        }
        Exchange::Bybit => {
            let resp: BybitResponse<BybitInstrument> =
                serde_json::from_str(body).map_err(decode_err)?;
            if resp.ret_code != 0 {
                return Err(api_err(format!("retCode {} {}", resp.ret_code, resp.ret_msg)));
            }
            resp.result
                .list
                .into_iter()
                .filter(|s| s.status == "Trading")
                .map(|s| SymbolRecord::new(exchange, &s.symbol, &s.base_coin, &s.quote_coin))
                .collect()
        }
        Exchange::Okx => {
            let resp: OkxResponse<OkxInstrument> =
                serde_json::from_str(body).map_err(decode_err)?;
            if resp.code != "0" {
                return Err(api_err(format!("code {} {}", resp.code, resp.msg)));
            }
            resp.data
                .into_iter()
                .filter(|s| s.state == "live")
                .map(|s| SymbolRecord::new(exchange, &s.inst_id, &s.base_ccy, &s.quote_ccy))
                .collect()
        }
        Exchange::Kucoin => {
            let resp: CodeEnvelope<Vec<KucoinSymbol>> =
                serde_json::from_str(body).map_err(decode_err)?;
            if resp.code != "200000" {
                return Err(api_err(format!("code {}", resp.code)));
            }
            resp.data
                .into_iter()
                .filter(|s| s.enable_trading)
                .map(|s| {
                    SymbolRecord::new(exchange, &s.symbol, &s.base_currency, &s.quote_currency)
                })
                .collect()
        }
        Exchange::Bitget => {
            let resp: CodeEnvelope<Vec<BitgetSymbol>> =
                serde_json::from_str(body).map_err(decode_err)?;
            if resp.code != "00000" {
                return Err(api_err(format!(
                    "code {} {}",
                    resp.code,
                    resp.message.unwrap_or_default()
                )));
            }
            resp.data
                .into_iter()
                .filter(|s| s.status == "online")
                .map(|s| SymbolRecord::new(exchange, &s.symbol, &s.base_coin, &s.quote_coin))
                .collect()
        }
        Exchange::Gate => {
            let pairs: Vec<GatePair> = serde_json::from_str(body).map_err(decode_err)?;
            pairs
                .into_iter()
                .filter(|p| p.trade_status == "tradable")
                .map(|p| SymbolRecord::new(exchange, &p.id, &p.base, &p.quote))
                .collect()
        }
        Exchange::Coinbase => {
            let products: Vec<CoinbaseProduct> = serde_json::from_str(body).map_err(decode_err)?;
            products
                .into_iter()
                .filter(|p| p.status == "online")
                .map(|p| SymbolRecord::new(exchange, &p.id, &p.base_currency, &p.quote_currency))
                .collect()
        }
    };

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_binance_keeps_trading_only() {
        let body = r#"{"timezone":"UTC","symbols":[
            {"symbol":"ABCUSDT","baseAsset":"ABC","quoteAsset":"USDT","status":"TRADING"},
            {"symbol":"OLDBTC","baseAsset":"OLD","quoteAsset":"BTC","status":"BREAK"}
        ]}"#;
        let records = decode_listings(Exchange::Binance, "u", body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].symbol, "ABCUSDT");
        assert_eq!(records[0].exchange, Exchange::Binance);
    }

    #[test]
    fn test_decode_okx_normalizes_case() {
        let body = r#"{"code":"0","msg":"","data":[
            {"instId":"FOO-USDT","baseCcy":"foo","quoteCcy":"usdt","state":"live"},
            {"instId":"BAR-USDT","baseCcy":"BAR","quoteCcy":"USDT","state":"suspend"}
        ]}"#;
        let records = decode_listings(Exchange::Okx, "u", body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].base_asset, "FOO");
        assert_eq!(records[0].quote_asset, "USDT");
    }

    #[test]
    fn test_decode_bybit_rejects_error_envelope() {
        let body = r#"{"retCode":10001,"retMsg":"params error","result":{"list":[]}}"#;
        let err = decode_listings(Exchange::Bybit, "u", body).unwrap_err();
        assert!(matches!(err, MonitorError::Api { .. }));
    }

    #[test]
    fn test_decode_kucoin_and_bitget_envelopes() {
        let kucoin = r#"{"code":"200000","data":[
            {"symbol":"FOO-USDT","baseCurrency":"FOO","quoteCurrency":"USDT","enableTrading":true},
            {"symbol":"BAR-USDT","baseCurrency":"BAR","quoteCurrency":"USDT","enableTrading":false}
        ]}"#;
        assert_eq!(decode_listings(Exchange::Kucoin, "u", kucoin).unwrap().len(), 1);

        let bitget = r#"{"code":"00000","msg":"success","data":[
            {"symbol":"FOOUSDT","baseCoin":"FOO","quoteCoin":"USDT","status":"online"}
        ]}"#;
        assert_eq!(decode_listings(Exchange::Bitget, "u", bitget).unwrap().len(), 1);

        let bitget_err = r#"{"code":"40001","msg":"bad","data":[]}"#;
        assert!(decode_listings(Exchange::Bitget, "u", bitget_err).is_err());
    }

    #[test]
    fn test_decode_gate_and_coinbase_arrays() {
        let gate = r#"[{"id":"FOO_USDT","base":"FOO","quote":"USDT","trade_status":"tradable"},
                       {"id":"BAR_USDT","base":"BAR","quote":"USDT","trade_status":"untradable"}]"#;
        let records = decode_listings(Exchange::Gate, "u", gate).unwrap();
        assert_eq!(records[0].symbol, "FOO_USDT");
        assert_eq!(records.len(), 1);

        let coinbase = r#"[{"id":"FOO-USD","base_currency":"FOO","quote_currency":"USD","status":"online"}]"#;
        assert_eq!(decode_listings(Exchange::Coinbase, "u", coinbase).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_missing_field_is_decode_error() {
        let err = decode_listings(Exchange::Binance, "u", r#"{"foo":1}"#).unwrap_err();
        assert!(matches!(err, MonitorError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_empty_list() {
        let client = HttpClient::new(std::time::Duration::from_secs(2)).unwrap();
        let source = RestListingSource::new(
            Exchange::Binance,
            "http://127.0.0.1:9/api/v3/exchangeInfo".to_string(),
            PathBuf::from("/tmp/unused.json"),
            client,
        );
        assert!(source.fetch_listings().await.is_empty());
        assert!(source.try_fetch_listings().await.is_err());
        assert_eq!(source.data_file_path(), Path::new("/tmp/unused.json"));
    }

    #[test]
    fn test_binance_and_mexc_keep_their_own_trading_status() {
        let body = r#"{"symbols":[
            {"symbol":"AAAUSDT","baseAsset":"AAA","quoteAsset":"USDT","status":"TRADING"},
            {"symbol":"BBBUSDT","baseAsset":"BBB","quoteAsset":"USDT","status":"ENABLED"},
            {"symbol":"CCCUSDT","baseAsset":"CCC","quoteAsset":"USDT","status":"1"},
            {"symbol":"DDDUSDT","baseAsset":"DDD","quoteAsset":"USDT","status":"2"}
        ]}"#;

        let binance: Vec<String> = decode_listings(Exchange::Binance, "u", body)
            .unwrap()
            .into_iter()
            .map(|r| r.symbol)
            .collect();
        assert_eq!(binance, vec!["AAAUSDT"]);

        let mexc: Vec<String> = decode_listings(Exchange::Mexc, "u", body)
            .unwrap()
            .into_iter()
            .map(|r| r.symbol)
            .collect();
        assert_eq!(mexc, vec!["BBBUSDT", "CCCUSDT"]);
    }
}
