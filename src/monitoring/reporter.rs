use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::records::{Announcement, NewItem, SymbolRecord};
use crate::api::Exchange;

#[derive(Debug, Default)]
struct ExchangeSection<'a> {
    listings: Vec<&'a SymbolRecord>,
    announcements: Vec<&'a Announcement>,
}

/// One digest email: new items grouped by exchange.
#[derive(Debug)]
pub struct DigestReport<'a> {
    generated_at: DateTime<Utc>,
    sections: BTreeMap<Exchange, ExchangeSection<'a>>,
    total_listings: usize,
    total_announcements: usize,
}

impl<'a> DigestReport<'a> {
    pub fn generate(items: &'a [NewItem], generated_at: DateTime<Utc>) -> Self {
        let mut sections: BTreeMap<Exchange, ExchangeSection<'a>> = BTreeMap::new();
        let mut total_listings = 0;
        let mut total_announcements = 0;

        for item in items {
            let section = sections.entry(item.exchange()).or_default();
            match item {
                NewItem::Listing(record) => {
                    section.listings.push(record);
                    total_listings += 1;
                }
                NewItem::Announcement(announcement) => {
                    section.announcements.push(announcement);
                    total_announcements += 1;
                }
            }
        }

        Self {
            generated_at,
            sections,
            total_listings,
            total_announcements,
        }
    }

    pub fn total(&self) -> usize {
        self.total_listings + self.total_announcements
    }

    pub fn subject(&self, prefix: &str) -> String {
        let mut parts = Vec::new();
        if self.total_listings > 0 {
            parts.push(plural(self.total_listings, "new listing", "new listings"));
        }
        if self.total_announcements > 0 {
            parts.push(plural(
                self.total_announcements,
                "new announcement",
                "new announcements",
            ));
        }

        let names: Vec<&str> = self.sections.keys().map(|e| e.display_name()).collect();
        format!("{} {} on {}", prefix, parts.join(", "), names.join(", "))
            .trim()
            .to_string()
    }

    pub fn to_text(&self) -> String {
        let mut report = String::new();
        report.push_str("NEW LISTINGS DIGEST\n");
        report.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        report.push_str(&format!(
            "New symbols: {} | New announcements: {}\n",
            self.total_listings, self.total_announcements
        ));

        for (exchange, section) in &self.sections {
            report.push_str(&format!("\n== {} ==\n", exchange.display_name()));

            if !section.listings.is_empty() {
                report.push_str("Symbols:\n");
                for record in &section.listings {
                    report.push_str(&format!(
                        "  • {:16} {}/{}\n",
                        record.symbol, record.base_asset, record.quote_asset
                    ));
                }
            }

            if !section.announcements.is_empty() {
                report.push_str("Announcements:\n");
                for a in &section.announcements {
                    report.push_str(&format!("  • [{}] {}\n", a.date.format("%Y-%m-%d"), a.title));
                    if !a.symbols.is_empty() {
                        report.push_str(&format!("    symbols: {}\n", a.symbols.join(", ")));
                    }
                    report.push_str(&format!("    {}\n", a.link));
                }
            }
        }

        report
    }

    pub fn to_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<h2>New listings digest</h2>");
        html.push_str(&format!(
            "<p>Generated {}. New symbols: {}. New announcements: {}.</p>",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.total_listings,
            self.total_announcements
        ));

        for (exchange, section) in &self.sections {
            html.push_str(&format!("<h3>{}</h3>", escape_html(exchange.display_name())));

            if !section.listings.is_empty() {
                html.push_str("<table><tr><th>Symbol</th><th>Base</th><th>Quote</th></tr>");
                for record in &section.listings {
                    html.push_str(&format!(
                        "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                        escape_html(&record.symbol),
                        escape_html(&record.base_asset),
                        escape_html(&record.quote_asset)
                    ));
                }
                html.push_str("</table>");
            }

            if !section.announcements.is_empty() {
                html.push_str("<ul>");
                for a in &section.announcements {
                    html.push_str(&format!(
                        "<li>{} <a href=\"{}\">{}</a></li>",
                        a.date.format("%Y-%m-%d"),
                        escape_html(&a.link),
                        escape_html(&a.title)
                    ));
                }
                html.push_str("</ul>");
            }
        }

        html
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
