pub mod config;
pub mod db;
pub mod feed;
pub mod metrics;
pub mod scheduler;
pub mod ticks;

pub mod error;
pub mod logger;
pub mod time;
