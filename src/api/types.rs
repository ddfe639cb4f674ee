use serde::Deserialize;

// ---- Listing endpoints ----

/// Binance and MEXC share the `exchangeInfo` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<ExchangeInfoSymbol>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfoSymbol {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitResponse<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    pub result: BybitList<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BybitList<T> {
    pub list: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitInstrument {
    pub symbol: String,
    pub base_coin: String,
    pub quote_coin: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OkxResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxInstrument {
    pub inst_id: String,
    pub base_ccy: String,
    pub quote_ccy: String,
    #[serde(default)]
    pub state: String,
}

/// Envelope shared by KuCoin (`200000`) and Bitget (`00000`).
#[derive(Debug, Clone, Deserialize)]
pub struct CodeEnvelope<T> {
    pub code: String,
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KucoinSymbol {
    pub symbol: String,
    pub base_currency: String,
    pub quote_currency: String,
    #[serde(default)]
    pub enable_trading: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitgetSymbol {
    pub symbol: String,
    pub base_coin: String,
    pub quote_coin: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatePair {
    pub id: String,
    pub base: String,
    pub quote: String,
    #[serde(default)]
    pub trade_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinbaseProduct {
    pub id: String,
    pub base_currency: String,
    pub quote_currency: String,
    #[serde(default)]
    pub status: String,
}

// ---- Announcement feeds ----

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceCmsResponse {
    pub code: String,
    #[serde(default)]
    pub success: bool,
    pub data: Option<BinanceCmsData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceCmsData {
    #[serde(default)]
    pub catalogs: Vec<BinanceCatalog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceCatalog {
    #[serde(default)]
    pub articles: Vec<BinanceArticle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceArticle {
    pub code: String,
    pub title: String,
    /// Milliseconds since epoch.
    #[serde(default)]
    pub release_date: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitAnnouncement {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date_timestamp: Option<i64>,
}
