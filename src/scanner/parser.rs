use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// Titles shorter than this are navigation noise.
pub const MIN_TITLE_LEN: usize = 10;

const LISTING_KEYWORDS: [&str; 8] = [
    "list",
    "add",
    "will list",
    "support",
    "new crypto",
    "spot trading",
    "trading pair",
    "token",
];

const DELISTING_STEMS: [&str; 4] = ["delist", "remov", "deprecat", "discontinu"];

lazy_static! {
    // "(FOO)" style tickers in titles
    static ref PAREN_TICKER_REGEX: Regex = Regex::new(r"\(([A-Z0-9]{2,12})\)").unwrap();

    // "FOO/USDT"
    static ref PAIR_REGEX: Regex = Regex::new(r"\b([A-Z0-9]{2,10})/([A-Z0-9]{2,6})\b").unwrap();

    // "FOOUSDT"
    static ref PAIR_NO_SLASH_REGEX: Regex = Regex::new(
        r"\b([A-Z0-9]{2,10})(USDT|USDC|FDUSD|BTC|ETH|BNB)\b"
    ).unwrap();

    static ref ISO_DATE_REGEX: Regex = Regex::new(
        r"(\d{4}-\d{2}-\d{2})(?:[ T](\d{2}:\d{2}))?"
    ).unwrap();

    // "May 1, 2024" / "Sep 12, 2024"
    static ref MONTH_FIRST_REGEX: Regex = Regex::new(
        r"\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(\d{1,2}),\s+(\d{4})"
    ).unwrap();

    // "1 May 2024"
    static ref DAY_FIRST_REGEX: Regex = Regex::new(
        r"\b(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(\d{4})"
    ).unwrap();

    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

// ---- Title classification ----

pub fn is_delisting(title: &str) -> bool {
    let lower = title.to_lowercase();
    DELISTING_STEMS.iter().any(|stem| lower.contains(stem))
}

pub fn has_listing_keyword(title: &str) -> bool {
    let lower = title.to_lowercase();
    LISTING_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Long enough, carries a listing keyword, and is not about a removal.
pub fn is_listing_relevant(title: &str) -> bool {
    title.trim().chars().count() >= MIN_TITLE_LEN && has_listing_keyword(title) && !is_delisting(title)
}

// ---- Symbols and dates ----

/// Best-effort ticker extraction from a title. Order of first appearance, no duplicates.
pub fn extract_symbols(title: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    let mut push = |s: &str| {
        if !s.chars().all(|c| c.is_ascii_digit()) && !symbols.iter().any(|x| x == s) {
            symbols.push(s.to_string());
        }
    };

    for cap in PAREN_TICKER_REGEX.captures_iter(title) {
        push(&cap[1]);
    }
    for cap in PAIR_REGEX.captures_iter(title) {
        push(&cap[1]);
    }
    for cap in PAIR_NO_SLASH_REGEX.captures_iter(title) {
        push(&cap[1]);
    }

    symbols
}

pub fn extract_date(text: &str) -> Option<DateTime<Utc>> {
    if let Some(cap) = ISO_DATE_REGEX.captures(text) {
        let date = NaiveDate::parse_from_str(&cap[1], "%Y-%m-%d").ok()?;
        let time = cap
            .get(2)
            .and_then(|t| chrono::NaiveTime::parse_from_str(t.as_str(), "%H:%M").ok())
            .unwrap_or_default();
        return Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)));
    }

    let (day, month, year) = if let Some(cap) = MONTH_FIRST_REGEX.captures(text) {
        (cap[2].to_string(), cap[1].to_string(), cap[3].to_string())
    } else if let Some(cap) = DAY_FIRST_REGEX.captures(text) {
        (cap[1].to_string(), cap[2].to_string(), cap[3].to_string())
    } else {
        return None;
    };

    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %b %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// ---- HTML extraction ----

/// Per-page extraction rules.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRules {
    /// CSS selectors that match article anchors (or containers holding one).
    pub selectors: Vec<String>,
    /// `href` fragments that identify an article link.
    pub path_fragments: Vec<String>,
    /// `href` fragments that identify navigation (section/category) links.
    pub exclude_fragments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub date: Option<DateTime<Utc>>,
}

/// Run every strategy against the page and merge the results.
///
/// Strategies run in order (selectors, href fragments, anchor keywords). The
/// first strategy to produce a given `(title, link)` wins.
pub fn extract_candidates(html: &str, page_url: &str, rules: &ExtractionRules) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut candidates: Vec<Candidate> = Vec::new();

    let anchor = Selector::parse("a[href]").ok();

    // 1. configured selectors
    for raw in &rules.selectors {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Invalid selector {:?}: {:?}", raw, e);
                continue;
            }
        };

        for element in document.select(&selector) {
            let link_element = if element.value().name() == "a" {
                Some(element)
            } else {
                anchor.as_ref().and_then(|a| element.select(a).next())
            };

            if let Some(link_element) = link_element {
                let title = pick_title(element, link_element);
                push_candidate(&mut candidates, link_element, title, base.as_ref(), page_url, rules);
            }
        }
    }

    let Some(anchor) = anchor else {
        return candidates;
    };

    // 2. href fragments
    if !rules.path_fragments.is_empty() {
        for element in document.select(&anchor) {
            let href = element.value().attr("href").unwrap_or_default();
            if rules.path_fragments.iter().any(|f| href.contains(f.as_str())) {
                let title = collapse_text(element);
                push_candidate(&mut candidates, element, title, base.as_ref(), page_url, rules);
            }
        }
    }

    // 3. keyword scan over every anchor
    for element in document.select(&anchor) {
        let title = collapse_text(element);
        if has_listing_keyword(&title) {
            push_candidate(&mut candidates, element, title, base.as_ref(), page_url, rules);
        }
    }

    candidates
}

fn push_candidate(
    candidates: &mut Vec<Candidate>,
    link_element: ElementRef<'_>,
    title: String,
    base: Option<&Url>,
    page_url: &str,
    rules: &ExtractionRules,
) {
    if title.is_empty() {
        return;
    }

    let Some(href) = link_element.value().attr("href") else {
        return;
    };
    if href.starts_with('#') || href.starts_with("javascript:") {
        return;
    }
    if rules.exclude_fragments.iter().any(|f| href.contains(f.as_str())) {
        return;
    }

    let Some(link) = resolve_link(base, href) else {
        return;
    };
    if link.trim_end_matches('/') == page_url.trim_end_matches('/') {
        return;
    }

    if candidates.iter().any(|c| c.title == title && c.link == link) {
        return;
    }

    let date = extract_date(&title).or_else(|| {
        link_element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| extract_date(&collapse_text(parent)))
    });

    candidates.push(Candidate { title, link, date });
}

/// Prefer a heading inside the matched container, then the anchor text.
fn pick_title(container: ElementRef<'_>, link_element: ElementRef<'_>) -> String {
    if let Ok(heading) = Selector::parse("h1, h2, h3, h4, [class*='title']") {
        if let Some(h) = container.select(&heading).next() {
            let text = collapse_text(h);
            if !text.is_empty() {
                return text;
            }
        }
    }
    collapse_text(link_element)
}

fn collapse_text(element: ElementRef<'_>) -> String {
    let joined = element.text().collect::<Vec<_>>().join(" ");
    WHITESPACE_REGEX.replace_all(joined.trim(), " ").into_owned()
}

pub fn resolve_link(base: Option<&Url>, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_listing_relevance() {
        assert!(is_listing_relevant("Binance Will List New Token (FOO)"));
        assert!(is_listing_relevant("Bybit adds BAR/USDT spot trading pair"));
        assert!(!is_listing_relevant("Binance Delists (BAR)"));
        assert!(!is_listing_relevant("Removal of Spot Trading Pairs - 2024-05-01"));
        assert!(!is_listing_relevant("Notice on Deprecated token standard"));
        assert!(!is_listing_relevant("Discontinuation of support for XYZ"));
        // too short even though it says "list"
        assert!(!is_listing_relevant("List FOO"));
        // long enough but no keyword
        assert!(!is_listing_relevant("Weekly market recap and insights"));
    }

    #[test]
    fn test_extract_symbols() {
        assert_eq!(extract_symbols("Binance Will List New Token (FOO)"), vec!["FOO"]);
        assert_eq!(
            extract_symbols("OKX to list BAR/USDT and BAZUSDC (BAR)"),
            vec!["BAR", "BAZ"]
        );
        assert!(extract_symbols("Maintenance notice").is_empty());
        assert!(extract_symbols("Event (2024)").is_empty());
    }

    #[test]
    fn test_extract_date_formats() {
        let d = extract_date("Published 2024-05-01 10:30").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 5, 1));
        assert_eq!(d.format("%H:%M").to_string(), "10:30");

        let d = extract_date("Sep 12, 2024").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 9, 12));

        let d = extract_date("listed on 3 January 2025 (UTC)").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2025, 1, 3));

        assert!(extract_date("no date here").is_none());
    }

    #[test]
    fn test_extract_candidates_merges_strategies_without_duplicates() {
        let html = r##"
            <html><body>
              <nav><a href="/help/section/announcements-new-listings">New listings</a></nav>
              <ul>
                <li class="article-item">
                  <a href="/help/okx-to-list-foo">OKX to list FOO (FOO) for spot trading</a>
                  <span>May 1, 2024</span>
                </li>
                <li class="article-item">
                  <a href="/help/okx-to-delist-bar">OKX to delist BAR</a>
                </li>
              </ul>
              <a href="https://www.okx.com/help/okx-adds-baz">OKX adds BAZ/USDT trading pair</a>
              <a href="#top">Back to top of the token list</a>
            </body></html>
        "##;
        let rules = ExtractionRules {
            selectors: vec!["li.article-item".to_string()],
            path_fragments: vec!["/help/".to_string()],
            exclude_fragments: vec!["/help/section/".to_string()],
        };

        let candidates = extract_candidates(
            html,
            "https://www.okx.com/help/section/announcements-new-listings",
            &rules,
        );

        let links: Vec<&str> = candidates.iter().map(|c| c.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://www.okx.com/help/okx-to-list-foo",
                "https://www.okx.com/help/okx-to-delist-bar",
                "https://www.okx.com/help/okx-adds-baz",
            ]
        );
        assert_eq!(candidates[0].date.unwrap().month(), 5);
    }

    #[test]
    fn test_resolve_link() {
        let base = Url::parse("https://www.kucoin.com/announcement/new-listings").unwrap();
        assert_eq!(
            resolve_link(Some(&base), "/announcement/en-foo").as_deref(),
            Some("https://www.kucoin.com/announcement/en-foo")
        );
        assert_eq!(
            resolve_link(None, "https://x.io/a").as_deref(),
            Some("https://x.io/a")
        );
        assert_eq!(resolve_link(None, "/relative"), None);
    }
}
