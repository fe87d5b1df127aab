//! Named-handle database access layer.
//!
//! Every logical database the service talks to is registered once at startup
//! under a short name ("asgs", "apsviz", ...) and owns its own pool, commit
//! mode, and reconnect policy. Handlers never hold a connection directly;
//! they dispatch statements through the registry by name.

pub mod handle;
pub mod outcome;
pub mod registry;
pub mod retry;

pub use handle::{BatchGuard, DbHandle};
pub use outcome::ProcResult;
pub use registry::DbRegistry;
pub use retry::RetryPolicy;

/// Errors the database layer can surface to callers.
///
/// Statement execution failures are deliberately NOT here: those are caught,
/// logged, and reported through [`ProcResult::Failed`] so callers must check
/// them explicitly. These variants cover programmer errors (unknown handle
/// name) and a bounded reconnect policy running out of attempts.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("no database handle registered under '{0}'")]
    UnknownHandle(String),

    #[error("could not reach database '{name}' after {attempts} attempts")]
    Unreachable { name: String, attempts: u32 },

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
