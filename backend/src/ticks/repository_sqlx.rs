use async_trait::async_trait;
use sqlx::PgPool;

use crate::ticks::errors::PersistError;
use crate::ticks::model::Tick;
use crate::ticks::repository::TickRepository;

const INSERT_TICK: &str = r#"
INSERT INTO ticks (
  time,
  pair,
  bidBig,
  bidPoints,
  offerBig,
  offerPoints,
  high,
  low
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
"#;

/// SQLx-backed implementation of TickRepository.
/// Responsible only for row mapping and the insert itself.
#[derive(Clone)]
pub struct SqlxTickRepository {
    pool: PgPool,
}

impl SqlxTickRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TickRepository for SqlxTickRepository {
    async fn save(&self, tick: &Tick) -> Result<(), PersistError> {
        let time = tick
            .time()
            .ok_or(PersistError::TimestampOutOfRange(tick.timestamp_ms))?;

        sqlx::query(INSERT_TICK)
            .bind(time)
            .bind(&tick.pair)
            .bind(tick.bid_big)
            .bind(tick.bid_points)
            .bind(tick.offer_big)
            .bind(tick.offer_points)
            .bind(tick.high)
            .bind(tick.low)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
