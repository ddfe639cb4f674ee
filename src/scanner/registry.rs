use super::announcements::{AnnouncementSource, FeedAnnouncementSource, FeedFormat};
use super::listings::{ListingSource, RestListingSource};
use crate::api::HttpClient;
use crate::core::Config;

/// Every enabled source, in the fixed order a cycle visits them.
#[derive(Default)]
pub struct SourceRegistry {
    listings: Vec<Box<dyn ListingSource>>,
    announcements: Vec<Box<dyn AnnouncementSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build concrete sources for every enabled entry in the config.
    pub fn from_config(config: &Config, client: &HttpClient) -> Self {
        let mut registry = Self::new();

        for source in config.enabled_listings() {
            registry.add_listing_source(Box::new(RestListingSource::new(
                source.exchange,
                source.url.clone(),
                source.data_file.clone(),
                client.clone(),
            )));
        }

        for source in config.enabled_announcements() {
            match FeedFormat::for_exchange(source.exchange) {
                Some(format) => registry.add_announcement_source(Box::new(
                    FeedAnnouncementSource::new(
                        source.exchange,
                        source.url.clone(),
                        source.data_file.clone(),
                        format,
                        client.clone(),
                    ),
                )),
                None => tracing::warn!(
                    "No announcement parser for {}, skipping",
                    source.exchange
                ),
            }
        }

        registry
    }

    pub fn add_listing_source(&mut self, source: Box<dyn ListingSource>) {
        self.listings.push(source);
    }

    pub fn add_announcement_source(&mut self, source: Box<dyn AnnouncementSource>) {
        self.announcements.push(source);
    }

    pub fn listings(&self) -> &[Box<dyn ListingSource>] {
        &self.listings
    }

    pub fn announcements(&self) -> &[Box<dyn AnnouncementSource>] {
        &self.announcements
    }

    pub fn len(&self) -> usize {
        self.listings.len() + self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
