use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::feed::client::DEFAULT_FEED_URL;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// CSV rates endpoint polled every tick.
    pub feed_url: String,

    // =========================
    // Database connection
    // =========================
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,

    /// Database used for the bootstrap connection that creates (and,
    /// with `reset_on_start`, drops) the target database.
    pub admin_database: String,

    /// Database the ticks table lives in.
    pub target_database: String,

    /// Upper bound on pooled connections. Acquisition past this waits
    /// up to `acquire_timeout` instead of failing immediately.
    pub max_connections: u32,
    pub acquire_timeout: Duration,

    // =========================
    // Scheduling
    // =========================
    /// Gap between fetch cycles.
    pub tick_interval: Duration,

    /// Upper bound for a single feed request or a single insert.
    ///
    /// Keeps one stuck call from stalling every later cycle.
    pub call_timeout: Duration,

    // =========================
    // Provisioning
    // =========================
    /// DESTRUCTIVE when true: the target database is dropped and recreated
    /// on every start, discarding all stored ticks.
    pub reset_on_start: bool,

    /// Number of space partitions on `pair` for the hypertable.
    pub hypertable_partitions: i32,

    /// Emit JSON logs instead of pretty ones.
    pub json_logs: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let tick_interval = Duration::from_secs(1);

        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "dev".to_string(),
            password: "dev".to_string(),
            admin_database: "dev".to_string(),
            target_database: "forex".to_string(),
            max_connections: 20,
            acquire_timeout: Duration::from_secs(30),
            tick_interval,
            call_timeout: tick_interval * 5,
            reset_on_start: true,
            hypertable_partitions: 4,
            json_logs: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// anything unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let tick_secs: u64 =
            parse_or(&lookup, "FOREX_TICK_INTERVAL_SECS", d.tick_interval.as_secs())?;
        if tick_secs == 0 {
            bail!("FOREX_TICK_INTERVAL_SECS must be greater than zero");
        }
        let tick_interval = Duration::from_secs(tick_secs);

        let call_timeout = match lookup("FOREX_CALL_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("FOREX_CALL_TIMEOUT_SECS", &raw)?),
            None => tick_interval * 5,
        };
        if call_timeout.is_zero() {
            bail!("FOREX_CALL_TIMEOUT_SECS must be greater than zero");
        }

        let max_connections: u32 =
            parse_or(&lookup, "FOREX_DB_MAX_CONNECTIONS", d.max_connections)?;
        if max_connections == 0 {
            bail!("FOREX_DB_MAX_CONNECTIONS must be greater than zero");
        }

        let hypertable_partitions: i32 =
            parse_or(&lookup, "FOREX_HYPERTABLE_PARTITIONS", d.hypertable_partitions)?;
        if hypertable_partitions < 1 {
            bail!("FOREX_HYPERTABLE_PARTITIONS must be at least 1");
        }

        Ok(Self {
            feed_url: lookup("FOREX_FEED_URL").unwrap_or(d.feed_url),
            host: lookup("FOREX_DB_HOST").unwrap_or(d.host),
            port: parse_or(&lookup, "FOREX_DB_PORT", d.port)?,
            user: lookup("FOREX_DB_USER").unwrap_or(d.user),
            password: lookup("FOREX_DB_PASSWORD").unwrap_or(d.password),
            admin_database: lookup("FOREX_ADMIN_DATABASE").unwrap_or(d.admin_database),
            target_database: lookup("FOREX_TARGET_DATABASE").unwrap_or(d.target_database),
            max_connections,
            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "FOREX_DB_ACQUIRE_TIMEOUT_SECS",
                d.acquire_timeout.as_secs(),
            )?),
            tick_interval,
            call_timeout,
            reset_on_start: parse_or(&lookup, "FOREX_RESET_ON_START", d.reset_on_start)?,
            hypertable_partitions,
            json_logs: lookup("APP_ENV").is_some_and(|v| v == "production"),
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value {raw:?} for {key}"))
}
