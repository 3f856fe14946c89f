// SQLite ExecutionEngine Implementation (engine inbox)

use async_trait::async_trait;
use pushbridge_core::domain::{QueueMessage, QueueName};
use pushbridge_core::error::{AppError, Result};
use pushbridge_core::port::{
    EngineReceipt, EnqueueOptions, ExecutionEngine, IdProvider, TimeProvider,
};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::debug;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) if code == "5" => {
                AppError::Database(format!("Database locked (SQLITE_BUSY): {}", db_err.message()))
            }
            Some(code) if code == "13" => {
                AppError::Database(format!("Database full: {}", db_err.message()))
            }
            Some(code) => {
                AppError::Database(format!("Database error [{}]: {}", code, db_err.message()))
            }
            None => AppError::Database(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

/// Job state in the inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxState {
    Queued,
    Claimed,
}

impl InboxState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboxState::Queued => "QUEUED",
            InboxState::Claimed => "CLAIMED",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "QUEUED" => Ok(InboxState::Queued),
            "CLAIMED" => Ok(InboxState::Claimed),
            other => Err(AppError::Database(format!("unknown inbox state '{}'", other))),
        }
    }
}

/// A job sitting in the inbox
#[derive(Debug, Clone, PartialEq)]
pub struct InboxJob {
    pub id: String,
    pub queue_name: QueueName,
    pub message: QueueMessage,
    pub idempotency_key: Option<String>,
    pub message_id: Option<String>,
    pub state: InboxState,
    pub enqueued_at: i64,
    pub claimed_at: Option<i64>,
}

/// Engine inbox backed by SQLite.
///
/// `enqueue` is the bridge-facing side; the engine pulls with `claim_next`.
/// A (queue name, idempotency key) pair maps to at most one job.
pub struct SqliteExecutionEngine {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteExecutionEngine {
    pub fn new(
        pool: SqlitePool,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            id_provider,
            time_provider,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<InboxJob>> {
        let row = sqlx::query(
            r#"
            SELECT id, queue_name, kind, payload, trace_id, idempotency_key, message_id,
                   state, enqueued_at, claimed_at
            FROM engine_jobs WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| row_to_job(&r)).transpose()
    }

    /// Oldest queued job, optionally restricted to one queue; marks it claimed
    pub async fn claim_next(&self, queue_name: Option<&QueueName>) -> Result<Option<InboxJob>> {
        let now = self.time_provider.now_millis();
        let queue_filter = queue_name.map(|q| q.to_string());

        let row = sqlx::query(
            r#"
            UPDATE engine_jobs
            SET state = 'CLAIMED', claimed_at = ?
            WHERE id = (
                SELECT id FROM engine_jobs
                WHERE state = 'QUEUED' AND (? IS NULL OR queue_name = ?)
                ORDER BY enqueued_at ASC, id ASC
                LIMIT 1
            )
            RETURNING id, queue_name, kind, payload, trace_id, idempotency_key, message_id,
                      state, enqueued_at, claimed_at
            "#,
        )
        .bind(now)
        .bind(&queue_filter)
        .bind(&queue_filter)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|r| row_to_job(&r)).transpose()
    }

    pub async fn count_by_state(&self, state: InboxState) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM engine_jobs WHERE state = ?")
            .bind(state.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ExecutionEngine for SqliteExecutionEngine {
    async fn enqueue(
        &self,
        queue: &QueueName,
        message: &QueueMessage,
        options: &EnqueueOptions,
    ) -> Result<EngineReceipt> {
        let job_id = self.id_provider.generate_id().to_string();
        let payload = serde_json::to_string(&message.payload)?;
        let queue_name = queue.to_string();

        let inserted = sqlx::query(
            r#"
            INSERT INTO engine_jobs (
                id, queue_name, kind, payload, trace_id, idempotency_key, message_id,
                state, enqueued_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 'QUEUED', ?)
            ON CONFLICT(queue_name, idempotency_key) DO NOTHING
            "#,
        )
        .bind(&job_id)
        .bind(&queue_name)
        .bind(message.kind.as_str())
        .bind(&payload)
        .bind(&message.trace_id)
        .bind(&options.idempotency_key)
        .bind(options.message_id.as_ref().map(|id| id.as_str()))
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .rows_affected();

        if inserted == 1 {
            debug!(queue = %queue_name, job_id = %job_id, "Job enqueued");
            return Ok(EngineReceipt {
                job_id,
                deduplicated: false,
            });
        }

        // Conflict: only possible with a key
        let existing: String = sqlx::query_scalar(
            "SELECT id FROM engine_jobs WHERE queue_name = ? AND idempotency_key = ?",
        )
        .bind(&queue_name)
        .bind(&options.idempotency_key)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(queue = %queue_name, job_id = %existing, "Duplicate key, existing job kept");
        Ok(EngineReceipt {
            job_id: existing,
            deduplicated: true,
        })
    }
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<InboxJob> {
    let queue_name: String = row.try_get("queue_name").map_err(map_sqlx_error)?;
    let kind: String = row.try_get("kind").map_err(map_sqlx_error)?;
    let payload: String = row.try_get("payload").map_err(map_sqlx_error)?;
    let state: String = row.try_get("state").map_err(map_sqlx_error)?;

    let message = QueueMessage {
        kind: kind.parse().map_err(AppError::from)?,
        payload: serde_json::from_str(&payload)?,
        trace_id: row.try_get("trace_id").map_err(map_sqlx_error)?,
    };

    Ok(InboxJob {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        queue_name: QueueName::parse(&queue_name)?,
        message,
        idempotency_key: row.try_get("idempotency_key").map_err(map_sqlx_error)?,
        message_id: row.try_get("message_id").map_err(map_sqlx_error)?,
        state: InboxState::parse(&state)?,
        enqueued_at: row.try_get("enqueued_at").map_err(map_sqlx_error)?,
        claimed_at: row.try_get("claimed_at").map_err(map_sqlx_error)?,
    })
}
