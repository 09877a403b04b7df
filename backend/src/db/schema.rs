//! Provisioning of the target database and the `ticks` hypertable.
//!
//! With `reset_on_start` set (the default) this is DESTRUCTIVE: the target
//! database is dropped and recreated, and its `public` schema is dropped with
//! CASCADE, on every process start. Every statement is either guarded by
//! `IF [NOT] EXISTS` or preceded by a drop, so running it repeatedly converges
//! on the same schema.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db::connect_options;
use crate::error::ProvisionError;

const DROP_SCHEMA: &str = "DROP SCHEMA IF EXISTS public CASCADE;";

const CREATE_SCHEMA: &str = "CREATE SCHEMA public;";

const CREATE_EXTENSIONS: &str = "CREATE EXTENSION IF NOT EXISTS timescaledb;";

const CREATE_TICKS: &str = r#"
CREATE TABLE IF NOT EXISTS ticks (
  time TIMESTAMP NOT NULL,
  pair VARCHAR(7) NOT NULL,
  bidBig DOUBLE PRECISION NOT NULL,
  bidPoints DOUBLE PRECISION NOT NULL,
  offerBig DOUBLE PRECISION NOT NULL,
  offerPoints DOUBLE PRECISION NOT NULL,
  high DOUBLE PRECISION NOT NULL,
  low DOUBLE PRECISION NOT NULL
);
"#;

// Time dimension on `time`, space dimension hashed on `pair`.
const CREATE_HYPERTABLE: &str = r#"
SELECT create_hypertable(
  'ticks',
  time_column_name => 'time',
  partitioning_column => 'pair',
  number_partitions => $1::integer,
  if_not_exists => TRUE
);
"#;

const DESCRIBE_COLUMNS: &str = r#"
SELECT column_name::text AS column_name,
       data_type::text AS data_type,
       is_nullable::text AS is_nullable
FROM information_schema.columns
WHERE table_schema = 'public' AND table_name = 'ticks'
ORDER BY ordinal_position;
"#;

const DESCRIBE_DIMENSIONS: &str = r#"
SELECT column_name::text AS column_name
FROM timescaledb_information.dimensions
WHERE hypertable_name = 'ticks'
ORDER BY dimension_number;
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Observable shape of the provisioned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub columns: Vec<ColumnInfo>,
    pub dimensions: Vec<String>,
}

pub struct SchemaManager {
    admin: PgConnectOptions,
    target: PgConnectOptions,
    target_database: String,
    reset_on_start: bool,
    hypertable_partitions: i32,
}

impl SchemaManager {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            admin: connect_options(cfg, &cfg.admin_database),
            target: connect_options(cfg, &cfg.target_database),
            target_database: cfg.target_database.clone(),
            reset_on_start: cfg.reset_on_start,
            hypertable_partitions: cfg.hypertable_partitions,
        }
    }

    /// Bring the target database to the expected schema. Must succeed before
    /// any tick is written.
    pub async fn provision(&self) -> Result<(), ProvisionError> {
        let ident = quote_ident(&self.target_database)?;

        self.prepare_database(&ident).await?;
        self.prepare_schema().await?;

        info!(
            database = %self.target_database,
            reset = self.reset_on_start,
            "tick schema provisioned"
        );
        Ok(())
    }

    async fn prepare_database(&self, ident: &str) -> Result<(), ProvisionError> {
        let mut conn = PgConnection::connect_with(&self.admin)
            .await
            .map_err(ProvisionError::step("connect admin"))?;

        if self.reset_on_start {
            warn!(
                database = %self.target_database,
                "reset_on_start is enabled: dropping target database and all stored ticks"
            );

            sqlx::raw_sql(&format!("DROP DATABASE IF EXISTS {ident};"))
                .execute(&mut conn)
                .await
                .map_err(ProvisionError::step("dropdb"))?;

            sqlx::raw_sql(&format!("CREATE DATABASE {ident};"))
                .execute(&mut conn)
                .await
                .map_err(ProvisionError::step("createdb"))?;
        } else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
                    .bind(&self.target_database)
                    .fetch_one(&mut conn)
                    .await
                    .map_err(ProvisionError::step("lookupdb"))?;

            if !exists {
                sqlx::raw_sql(&format!("CREATE DATABASE {ident};"))
                    .execute(&mut conn)
                    .await
                    .map_err(ProvisionError::step("createdb"))?;
            }
        }

        conn.close()
            .await
            .map_err(ProvisionError::step("disconnect admin"))
    }

    async fn prepare_schema(&self) -> Result<(), ProvisionError> {
        let mut conn = PgConnection::connect_with(&self.target)
            .await
            .map_err(ProvisionError::step("connect target"))?;

        if self.reset_on_start {
            sqlx::raw_sql(DROP_SCHEMA)
                .execute(&mut conn)
                .await
                .map_err(ProvisionError::step("dropschema"))?;

            sqlx::raw_sql(CREATE_SCHEMA)
                .execute(&mut conn)
                .await
                .map_err(ProvisionError::step("createschema"))?;
        }

        sqlx::raw_sql(CREATE_EXTENSIONS)
            .execute(&mut conn)
            .await
            .map_err(ProvisionError::step("createextensions"))?;

        sqlx::raw_sql(CREATE_TICKS)
            .execute(&mut conn)
            .await
            .map_err(ProvisionError::step("migrate"))?;

        sqlx::query(CREATE_HYPERTABLE)
            .bind(self.hypertable_partitions)
            .execute(&mut conn)
            .await
            .map_err(ProvisionError::step("hypertable"))?;

        conn.close()
            .await
            .map_err(ProvisionError::step("disconnect target"))
    }

    /// Read back columns and hypertable dimensions of `ticks`.
    pub async fn describe(&self) -> Result<SchemaSnapshot, ProvisionError> {
        let mut conn = PgConnection::connect_with(&self.target)
            .await
            .map_err(ProvisionError::step("connect target"))?;

        let columns: Vec<ColumnInfo> = sqlx::query(DESCRIBE_COLUMNS)
            .fetch_all(&mut conn)
            .await
            .map_err(ProvisionError::step("describe columns"))?
            .iter()
            .map(|r| ColumnInfo {
                name: r.get("column_name"),
                data_type: r.get("data_type"),
                nullable: r.get::<String, _>("is_nullable") == "YES",
            })
            .collect();

        let dimensions: Vec<String> = sqlx::query_scalar(DESCRIBE_DIMENSIONS)
            .fetch_all(&mut conn)
            .await
            .map_err(ProvisionError::step("describe dimensions"))?;

        conn.close()
            .await
            .map_err(ProvisionError::step("disconnect target"))?;

        Ok(SchemaSnapshot {
            columns,
            dimensions,
        })
    }
}

/// Double-quote a database name for DDL. Only plain identifiers are
/// accepted since the name cannot be bound as a parameter.
pub fn quote_ident(name: &str) -> Result<String, ProvisionError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest || name.len() > 63 {
        return Err(ProvisionError::InvalidIdentifier(name.to_string()));
    }

    Ok(format!("\"{name}\""))
}
