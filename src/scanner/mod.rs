pub mod announcements;
pub mod listings;
pub mod parser;
pub mod registry;

pub use announcements::{AnnouncementSource, FeedAnnouncementSource, FeedFormat};
pub use listings::{ListingSource, RestListingSource};
pub use registry::SourceRegistry;
