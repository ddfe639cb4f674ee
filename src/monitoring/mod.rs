pub mod diff;
pub mod notifier;
pub mod orchestrator;
pub mod records;
pub mod reporter;
pub mod snapshot;

pub use notifier::{Email, LogMailer, Mailer, Notifier, NotifyOutcome, SendGridMailer};
pub use orchestrator::{CycleReport, ListingMonitor};
pub use records::{Announcement, AnnouncementSnapshot, NewItem, SymbolRecord, SymbolSnapshot};
pub use reporter::DigestReport;
