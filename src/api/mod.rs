pub mod exchange;
pub mod http;
pub mod types;

pub use exchange::Exchange;
pub use http::HttpClient;
pub use types::*;
