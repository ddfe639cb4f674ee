use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::api::Exchange;

/// Anything stored in a snapshot has a natural key within its exchange.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub exchange: Exchange,
}

impl SymbolRecord {
    pub fn new(exchange: Exchange, symbol: &str, base: &str, quote: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            base_asset: base.to_uppercase(),
            quote_asset: quote.to_uppercase(),
            exchange,
        }
    }
}

impl Keyed for SymbolRecord {
    fn key(&self) -> &str {
        &self.symbol
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub link: String,
    pub date: DateTime<Utc>,
    pub exchange: Exchange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symbols: Vec<String>,
}

impl Announcement {
    pub fn new(
        exchange: Exchange,
        title: &str,
        link: &str,
        date: DateTime<Utc>,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            id: announcement_id(title, link),
            title: title.to_string(),
            link: link.to_string(),
            date,
            exchange,
            symbols,
        }
    }
}

impl Keyed for Announcement {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Stable content id: first 16 bytes of SHA-256 over `title|link`, hex encoded.
pub fn announcement_id(title: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.trim().as_bytes());
    hasher.update(b"|");
    hasher.update(link.trim().as_bytes());
    let digest = hasher.finalize();

    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

/// What the notifier receives.
#[derive(Debug, Clone, PartialEq)]
pub enum NewItem {
    Listing(SymbolRecord),
    Announcement(Announcement),
}

impl NewItem {
    pub fn exchange(&self) -> Exchange {
        match self {
            NewItem::Listing(record) => record.exchange,
            NewItem::Announcement(announcement) => announcement.exchange,
        }
    }
}

// ---- Snapshot file shapes ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    #[serde(default)]
    pub symbols: Vec<SymbolRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementSnapshot {
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

/// Common view over the two snapshot kinds so the store and diff engine stay generic.
pub trait Snapshot: Default + Serialize + serde::de::DeserializeOwned + Send {
    type Record: Keyed + Clone + Send + Sync;

    fn records(&self) -> &[Self::Record];
    fn records_mut(&mut self) -> &mut Vec<Self::Record>;
}

impl Snapshot for SymbolSnapshot {
    type Record = SymbolRecord;

    fn records(&self) -> &[SymbolRecord] {
        &self.symbols
    }

    fn records_mut(&mut self) -> &mut Vec<SymbolRecord> {
        &mut self.symbols
    }
}

impl Snapshot for AnnouncementSnapshot {
    type Record = Announcement;

    fn records(&self) -> &[Announcement] {
        &self.announcements
    }

    fn records_mut(&mut self) -> &mut Vec<Announcement> {
        &mut self.announcements
    }
}
