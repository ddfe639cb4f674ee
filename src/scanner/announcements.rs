use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::parser::{self, Candidate, ExtractionRules};
use crate::api::types::{BinanceCmsResponse, BybitAnnouncement, BybitResponse};
use crate::api::{Exchange, HttpClient};
use crate::core::error::{MonitorError, MonitorResult};
use crate::monitoring::records::Announcement;

const BINANCE_ARTICLE_BASE: &str = "https://www.binance.com/en/support/announcement/";

/// A source of new-listing announcements for one exchange.
///
/// Same error policy as listing sources: `fetch_announcements` logs failures
/// and yields nothing, `try_fetch_announcements` hands them to the monitor.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    fn exchange(&self) -> Exchange;
    fn data_file_path(&self) -> &Path;
    async fn try_fetch_announcements(&self) -> MonitorResult<Vec<Announcement>>;

    async fn fetch_announcements(&self) -> Vec<Announcement> {
        match self.try_fetch_announcements().await {
            Ok(announcements) => announcements,
            Err(e) => {
                tracing::error!("❌ Failed to fetch {} announcements: {}", self.exchange(), e);
                Vec::new()
            }
        }
    }
}

/// How a feed's body is turned into candidates.
#[derive(Debug, Clone)]
pub enum FeedFormat {
    /// Binance CMS article list (JSON).
    BinanceCms,
    /// Bybit v5 announcements (JSON).
    BybitApi,
    /// Plain HTML page scraped with the given rules.
    Html(ExtractionRules),
}

impl FeedFormat {
    pub fn for_exchange(exchange: Exchange) -> Option<Self> {
        match exchange {
            Exchange::Binance => Some(FeedFormat::BinanceCms),
            Exchange::Bybit => Some(FeedFormat::BybitApi),
            Exchange::Okx => Some(FeedFormat::Html(ExtractionRules {
                selectors: vec![
                    "a[class*='article-item']".to_string(),
                    "li[class*='article'] a".to_string(),
                ],
                path_fragments: vec!["/help/".to_string()],
                exclude_fragments: vec![
                    "/help/section/".to_string(),
                    "/help/category/".to_string(),
                ],
            })),
            Exchange::Kucoin => Some(FeedFormat::Html(ExtractionRules {
                selectors: vec![
                    "div[class*='item'] a[href*='/announcement/']".to_string(),
                    "a[class*='title']".to_string(),
                ],
                path_fragments: vec!["/announcement/".to_string()],
                exclude_fragments: vec![
                    "/announcement/new-listings".to_string(),
                    "/announcement/latest-announcements".to_string(),
                    "/announcement?".to_string(),
                ],
            })),
            _ => None,
        }
    }
}

pub struct FeedAnnouncementSource {
    exchange: Exchange,
    url: String,
    data_file: PathBuf,
    format: FeedFormat,
    client: HttpClient,
}

impl FeedAnnouncementSource {
    pub fn new(
        exchange: Exchange,
        url: String,
        data_file: PathBuf,
        format: FeedFormat,
        client: HttpClient,
    ) -> Self {
        Self {
            exchange,
            url,
            data_file,
            format,
            client,
        }
    }
}

#[async_trait]
impl AnnouncementSource for FeedAnnouncementSource {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    fn data_file_path(&self) -> &Path {
        &self.data_file
    }

    async fn try_fetch_announcements(&self) -> MonitorResult<Vec<Announcement>> {
        let body = self.client.get_text(&self.url).await?;
        let announcements = parse_feed(self.exchange, &self.format, &self.url, &body, Utc::now())?;

        tracing::debug!(
            "📰 {} announcements: {} listing candidates",
            self.exchange,
            announcements.len()
        );
        Ok(announcements)
    }
}

/// Turn a fetched body into filtered listing announcements.
///
/// `now` is the fallback date for items without one.
pub fn parse_feed(
    exchange: Exchange,
    format: &FeedFormat,
    url: &str,
    body: &str,
    now: DateTime<Utc>,
) -> MonitorResult<Vec<Announcement>> {
    let decode_err = |e: serde_json::Error| MonitorError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let candidates: Vec<Candidate> = match format {
        FeedFormat::BinanceCms => {
            let resp: BinanceCmsResponse = serde_json::from_str(body).map_err(decode_err)?;
            if resp.code != "000000" || !resp.success {
                return Err(MonitorError::Api {
                    exchange: exchange.to_string(),
                    message: format!("code {}", resp.code),
                });
            }
            resp.data
                .map(|d| d.catalogs)
                .unwrap_or_default()
                .into_iter()
                .flat_map(|c| c.articles)
                .map(|a| Candidate {
                    link: format!("{BINANCE_ARTICLE_BASE}{}", a.code),
                    title: a.title.trim().to_string(),
                    date: a.release_date.and_then(parser::from_millis),
                })
                .collect()
        }
        FeedFormat::BybitApi => {
            let resp: BybitResponse<BybitAnnouncement> =
                serde_json::from_str(body).map_err(decode_err)?;
            if resp.ret_code != 0 {
                return Err(MonitorError::Api {
                    exchange: exchange.to_string(),
                    message: format!("retCode {} {}", resp.ret_code, resp.ret_msg),
                });
            }
            resp.result
                .list
                .into_iter()
                .map(|a| Candidate {
                    title: a.title.trim().to_string(),
                    link: a.url,
                    date: a.date_timestamp.and_then(parser::from_millis),
                })
                .collect()
        }
        FeedFormat::Html(rules) => parser::extract_candidates(body, url, rules),
    };

    Ok(finalize(exchange, candidates, now))
}

/// Drop noise and delistings, de-duplicate by `(title, link)`, then assign ids.
pub fn finalize(
    exchange: Exchange,
    candidates: Vec<Candidate>,
    now: DateTime<Utc>,
) -> Vec<Announcement> {
    let mut kept: Vec<Candidate> = Vec::new();

    for candidate in candidates {
        if !parser::is_listing_relevant(&candidate.title) {
            continue;
        }
        if kept
            .iter()
            .any(|k| k.title == candidate.title && k.link == candidate.link)
        {
            continue;
        }
        kept.push(candidate);
    }

    kept.into_iter()
        .map(|c| {
            let symbols = parser::extract_symbols(&c.title);
            Announcement::new(exchange, &c.title, &c.link, c.date.unwrap_or(now), symbols)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_listing_kept_and_delisting_dropped() {
        let candidates = vec![
            Candidate {
                title: "Binance Will List New Token (FOO)".to_string(),
                link: "https://b/1".to_string(),
                date: None,
            },
            Candidate {
                title: "Binance Delists (BAR)".to_string(),
                link: "https://b/2".to_string(),
                date: None,
            },
        ];

        let result = finalize(Exchange::Binance, candidates, now());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Binance Will List New Token (FOO)");
        assert_eq!(result[0].symbols, vec!["FOO"]);
        assert_eq!(result[0].date, now());
    }

    #[test]
    fn test_finalize_dedupes_first_wins() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let candidates = vec![
            Candidate {
                title: "OKX will list FOO for spot trading".to_string(),
                link: "https://o/1".to_string(),
                date: Some(date),
            },
            Candidate {
                title: "OKX will list FOO for spot trading".to_string(),
                link: "https://o/1".to_string(),
                date: None,
            },
        ];

        let result = finalize(Exchange::Okx, candidates, now());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, date);
    }

    #[test]
    fn test_parse_binance_cms_feed() {
        let body = r#"{"code":"000000","success":true,"data":{"catalogs":[{
            "catalogName":"New Cryptocurrency Listing",
            "articles":[
              {"id":1,"code":"abc123","title":"Binance Will List Foo (FOO)","type":1,"releaseDate":1714521600000},
              {"id":2,"code":"def456","title":"Binance Will Delist BAR, BAZ","type":1,"releaseDate":1714521600000}
            ]}]}}"#;

        let result =
            parse_feed(Exchange::Binance, &FeedFormat::BinanceCms, "u", body, now()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].link, "https://www.binance.com/en/support/announcement/abc123");
        assert_eq!(result[0].date.timestamp_millis(), 1714521600000);
    }

    #[test]
    fn test_parse_bybit_feed() {
        let body = r#"{"retCode":0,"retMsg":"OK","result":{"total":2,"list":[
            {"title":"New Listing: FOO/USDT","url":"https://announcements.bybit.com/article/foo","dateTimestamp":1714521600000},
            {"title":"Delisting of BAR/USDT","url":"https://announcements.bybit.com/article/bar","dateTimestamp":1714521600000}
        ]}}"#;

        let result =
            parse_feed(Exchange::Bybit, &FeedFormat::BybitApi, "u", body, now()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].symbols, vec!["FOO"]);
        assert_eq!(result[0].exchange, Exchange::Bybit);
    }

    #[test]
    fn test_parse_binance_error_code() {
        let body = r#"{"code":"100001","success":false,"data":null}"#;
        assert!(parse_feed(Exchange::Binance, &FeedFormat::BinanceCms, "u", body, now()).is_err());
    }

    #[test]
    fn test_parse_html_page() {
        let html = r#"
            <div class="list">
              <div class="item"><a href="/announcement/en-kucoin-lists-foo">KuCoin Lists FOO (FOO) 2024-05-02</a></div>
              <div class="item"><a href="/announcement/en-bar-delisting">KuCoin will delist BAR</a></div>
              <a href="/announcement/new-listings">New Listings</a>
            </div>"#;
        let format = FeedFormat::for_exchange(Exchange::Kucoin).unwrap();
        let result = parse_feed(
            Exchange::Kucoin,
            &format,
            "https://www.kucoin.com/announcement/new-listings",
            html,
            now(),
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].link,
            "https://www.kucoin.com/announcement/en-kucoin-lists-foo"
        );
        assert_eq!(result[0].date.format("%Y-%m-%d").to_string(), "2024-05-02");
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_nothing() {
        let client = HttpClient::new(std::time::Duration::from_secs(2)).unwrap();
        let source = FeedAnnouncementSource::new(
            Exchange::Okx,
            "http://127.0.0.1:9/help".to_string(),
            PathBuf::from("unused.json"),
            FeedFormat::for_exchange(Exchange::Okx).unwrap(),
            client,
        );
        assert!(source.fetch_announcements().await.is_empty());
        assert!(source.try_fetch_announcements().await.is_err());
    }
}
