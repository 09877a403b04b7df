use async_trait::async_trait;

use crate::ticks::errors::PersistError;
use crate::ticks::model::Tick;

#[async_trait]
pub trait TickRepository: Send + Sync {
    /// Append one tick as a row. No retry, no read-back.
    async fn save(&self, tick: &Tick) -> Result<(), PersistError>;
}
