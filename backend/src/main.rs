use anyhow::Context;

use forex_ingest::{
    config::AppConfig,
    db::{Db, schema::SchemaManager},
    feed::FeedClient,
    logger::init_tracing,
    metrics::counters::Counters,
    scheduler::{Scheduler, SchedulerConfig},
    ticks::SqlxTickRepository,
};

/// Provisions the target database. Destructive when `reset_on_start` is set.
async fn init_schema(cfg: &AppConfig) -> anyhow::Result<()> {
    let schema = SchemaManager::from_config(cfg);
    schema.provision().await.context("schema provisioning")?;

    let snapshot = schema.describe().await.context("schema readback")?;
    tracing::info!(
        columns = snapshot.columns.len(),
        dimensions = ?snapshot.dimensions,
        "ticks hypertable ready"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("invalid configuration")?;

    init_tracing(cfg.json_logs);

    tracing::info!(
        feed = %cfg.feed_url,
        database = %cfg.target_database,
        every_secs = cfg.tick_interval.as_secs(),
        "Starting forex ingest..."
    );

    init_schema(&cfg).await?;

    let db = Db::connect(&cfg).await.context("connect target database")?;
    let repository = SqlxTickRepository::new(db.pool.clone());

    let client = FeedClient::new(cfg.feed_url.clone(), cfg.call_timeout)
        .context("build feed client")?;

    let scheduler = Scheduler::new(
        client,
        repository,
        SchedulerConfig::from_app(&cfg),
        Counters::default(),
    );

    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await;

    db.pool.close().await;

    Ok(())
}
