use async_trait::async_trait;

use crate::feed::errors::FeedError;
use crate::feed::parser::FetchOutcome;

/// Anything that can produce one batch of ticks per call.
#[async_trait]
pub trait TickSource: Send + Sync {
    async fn fetch(&self) -> Result<FetchOutcome, FeedError>;
}
