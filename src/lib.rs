//! REST settings service for the APSViz job supervisor.
//!
//! Reads and writes workflow-orchestration settings (job execution order,
//! job image versions, run status flags) held in PostgreSQL. All ordering
//! logic lives in stored procedures on the database side; this service
//! formats one `SELECT public.<procedure>(...)` per operation, runs it
//! through the named-handle database layer, and shapes the returned JSON.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logs;
pub mod settings;
pub mod versions;

pub use config::Config;
pub use db::{DbError, DbRegistry, ProcResult, RetryPolicy};
pub use settings::SettingsRepo;
