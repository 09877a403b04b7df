pub mod client;
pub mod errors;
pub mod parser;
pub mod source;

pub use client::FeedClient;
pub use errors::{FeedError, RejectedRow};
pub use parser::{FetchOutcome, parse_ticks};
pub use source::TickSource;
