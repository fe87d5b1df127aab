use std::time::Duration;

use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::db::outcome::ProcResult;
use crate::db::retry::{self, RetryPolicy};
use crate::db::DbError;

/// A single named database handle.
///
/// Owns a lazily-connected pool, so statements check a connection out per
/// call rather than sharing one cursor across concurrent requests.
///
/// `auto_commit = false` puts the handle in batch mode: every statement runs
/// inside one open transaction that only [`DbHandle::commit`] finishes.
/// Dropping the handle (or calling [`DbHandle::close`]) rolls back anything
/// uncommitted, which is what gives batch callers all-or-nothing semantics.
pub struct DbHandle {
    name: String,
    pool: PgPool,
    auto_commit: bool,
    retry: RetryPolicy,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl DbHandle {
    pub fn new(
        name: &str,
        url: &str,
        auto_commit: bool,
        retry: RetryPolicy,
    ) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(url)?;

        Ok(Self {
            name: name.to_string(),
            pool,
            auto_commit,
            retry,
            tx: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Liveness probe: false on any error.
    async fn check_connection(&self) -> bool {
        sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Block until the database answers the liveness probe, sleeping between
    /// attempts per the retry policy. With an unbounded policy this never
    /// returns an error; connectivity loss shows up to callers only as
    /// latency. A bounded policy surfaces [`DbError::Unreachable`] once the
    /// ceiling is hit.
    pub async fn acquire(&self) -> Result<(), DbError> {
        let mut attempt: u32 = 0;

        loop {
            if self.check_connection().await {
                return Ok(());
            }

            attempt += 1;
            if let Some(max) = self.retry.max_attempts {
                if attempt >= max {
                    return Err(DbError::Unreachable {
                        name: self.name.clone(),
                        attempts: attempt,
                    });
                }
            }

            let delay = retry::next_delay_seconds(attempt, &self.retry, &mut rand::thread_rng());
            tracing::error!(
                db = %self.name,
                attempt,
                delay_seconds = delay,
                "database connection failed, retrying"
            );
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }

    /// Execute one statement, self-healing the connection first.
    ///
    /// Execution failures never propagate as errors from here: they are
    /// logged and folded into [`ProcResult::Failed`], which callers must
    /// check. The `Err` side is reserved for an exhausted bounded reconnect
    /// policy.
    pub async fn exec_sql(&self, sql: &str, expect_rows: bool) -> Result<ProcResult, DbError> {
        self.acquire().await?;

        let outcome = if self.auto_commit {
            run_statement(&self.pool, sql, expect_rows).await
        } else {
            let mut guard = self.tx.lock().await;
            let mut tx = match guard.take() {
                Some(tx) => tx,
                None => self.pool.begin().await?,
            };
            let outcome = run_statement(&mut *tx, sql, expect_rows).await;
            *guard = Some(tx);
            outcome
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(db = %self.name, error = %e, sql, "error executing SQL");
                Ok(ProcResult::Failed(e.to_string()))
            }
        }
    }

    /// Exclusive use of this handle's batch transaction for a multi-statement
    /// operation. The transaction lock is held for the guard's whole
    /// lifetime: no other caller can run a statement on this handle or commit
    /// a partial batch until the guard commits or drops. The guard takes over
    /// any transaction already open on the handle; dropping it without
    /// [`BatchGuard::commit`] rolls the whole batch back.
    pub async fn begin_batch(&self) -> Result<BatchGuard<'_>, DbError> {
        self.acquire().await?;
        Ok(BatchGuard {
            handle: self,
            tx: self.tx.lock().await,
        })
    }

    /// Commit the open batch transaction, if any. On an auto-commit handle
    /// this is a no-op.
    pub async fn commit(&self) -> Result<(), DbError> {
        let mut guard = self.tx.lock().await;
        match guard.take() {
            Some(tx) => tx.commit().await?,
            None => {
                tracing::debug!(db = %self.name, "commit requested with no open transaction");
            }
        }
        Ok(())
    }

    /// Roll back anything uncommitted and close the pool.
    pub async fn close(&self) {
        if let Some(tx) = self.tx.lock().await.take() {
            if let Err(e) = tx.rollback().await {
                tracing::error!(db = %self.name, error = %e, "error rolling back open transaction");
            }
        }
        self.pool.close().await;
    }
}

/// Holds a batch handle's transaction lock across an entire multi-statement
/// operation, so concurrent callers cannot interleave statements into the
/// transaction or commit someone else's half-finished batch.
pub struct BatchGuard<'a> {
    handle: &'a DbHandle,
    tx: MutexGuard<'a, Option<Transaction<'static, Postgres>>>,
}

impl BatchGuard<'_> {
    /// Run one statement inside the held transaction. Execution failures fold
    /// into [`ProcResult::Failed`], same as [`DbHandle::exec_sql`].
    pub async fn exec_sql(&mut self, sql: &str, expect_rows: bool) -> Result<ProcResult, DbError> {
        let mut tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.handle.pool.begin().await?,
        };
        let outcome = run_statement(&mut *tx, sql, expect_rows).await;
        *self.tx = Some(tx);

        match outcome {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(db = %self.handle.name, error = %e, sql, "error executing SQL");
                Ok(ProcResult::Failed(e.to_string()))
            }
        }
    }

    /// Commit the batch and release the lock.
    pub async fn commit(mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        // a transaction still present here means the batch aborted; dropping
        // it queues a rollback when the connection returns to the pool
        if let Some(tx) = self.tx.take() {
            drop(tx);
            tracing::debug!(db = %self.handle.name, "uncommitted batch rolled back");
        }
    }
}

async fn run_statement<'e, E>(
    executor: E,
    sql: &str,
    expect_rows: bool,
) -> Result<ProcResult, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    if expect_rows {
        let rows = sqlx::query(sql).fetch_all(executor).await?;
        if rows.is_empty() {
            return Ok(ProcResult::Empty);
        }
        Ok(ProcResult::Rows(rows.iter().map(decode_scalar).collect()))
    } else {
        let done = sqlx::query(sql).execute(executor).await?;
        Ok(ProcResult::Done(done.rows_affected()))
    }
}

/// The stored procedures here return a single scalar column: json, an
/// integer status code, or text. Decode whichever shape came back.
fn decode_scalar(row: &PgRow) -> Value {
    if let Ok(v) = row.try_get::<Value, _>(0) {
        return v;
    }
    if let Ok(n) = row.try_get::<i64, _>(0) {
        return Value::from(n);
    }
    if let Ok(n) = row.try_get::<i32, _>(0) {
        return Value::from(n);
    }
    if let Ok(b) = row.try_get::<bool, _>(0) {
        return Value::Bool(b);
    }
    if let Ok(s) = row.try_get::<String, _>(0) {
        return Value::String(s);
    }
    Value::Null
}
