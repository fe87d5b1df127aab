use std::collections::HashMap;

use crate::db::handle::{BatchGuard, DbHandle};
use crate::db::outcome::ProcResult;
use crate::db::retry::RetryPolicy;
use crate::db::DbError;

/// One connection wrapper per named logical database.
///
/// Built once at startup by the composition root and shared (behind an `Arc`)
/// with every handler; no hidden global state. Dispatch is by name, and an
/// unregistered name is a deterministic error, never a silent no-op.
#[derive(Default)]
pub struct DbRegistry {
    handles: HashMap<String, DbHandle>,
}

impl DbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and store a handle under `name`. Called once per logical
    /// database at startup.
    pub fn register(
        &mut self,
        name: &str,
        url: &str,
        auto_commit: bool,
        retry: RetryPolicy,
    ) -> Result<(), DbError> {
        let handle = DbHandle::new(name, url, auto_commit, retry)?;
        self.handles.insert(name.to_string(), handle);
        Ok(())
    }

    fn handle(&self, name: &str) -> Result<&DbHandle, DbError> {
        self.handles
            .get(name)
            .ok_or_else(|| DbError::UnknownHandle(name.to_string()))
    }

    pub async fn exec_sql(
        &self,
        name: &str,
        sql: &str,
        expect_rows: bool,
    ) -> Result<ProcResult, DbError> {
        self.handle(name)?.exec_sql(sql, expect_rows).await
    }

    /// Exclusive batch transaction on the named handle. The handle's
    /// transaction lock is held until the returned guard commits or drops.
    pub async fn begin_batch(&self, name: &str) -> Result<BatchGuard<'_>, DbError> {
        self.handle(name)?.begin_batch().await
    }

    /// Explicit transaction commit on the named handle. Meaningful only for
    /// handles registered with `auto_commit = false`.
    pub async fn commit(&self, name: &str) -> Result<(), DbError> {
        self.handle(name)?.commit().await
    }

    /// Dispose every registered handle: roll back open batch transactions
    /// and close the pools.
    pub async fn close_all(&self) {
        for handle in self.handles.values() {
            handle.close().await;
        }
    }
}
