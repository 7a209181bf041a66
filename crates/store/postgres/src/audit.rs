use async_trait::async_trait;
use chrono::{DateTime, Utc};

use requeue_audit::error::AuditError;
use requeue_audit::record::{AuditQuery, AuditRecord};
use requeue_audit::store::AuditStore;

use crate::store::PostgresReplayStore;

type AuditRow = (
    String,
    String,
    String,
    String,
    i32,
    i32,
    i32,
    serde_json::Value,
    DateTime<Utc>,
);

const AUDIT_COLUMNS: &str = "id, actor, action, scope, target_count, success_count, \
     failure_count, metadata, created_at";

fn storage(e: sqlx::Error) -> AuditError {
    AuditError::Storage(e.to_string())
}

fn count(value: u32) -> Result<i32, AuditError> {
    i32::try_from(value).map_err(|_| AuditError::Serialization(format!("{value} overflows i32")))
}

fn record_from_row(row: AuditRow) -> Result<AuditRecord, AuditError> {
    let (id, actor, action, scope, target, success, failure, metadata, created_at) = row;
    let unsigned = |v: i32| {
        u32::try_from(v).map_err(|_| AuditError::Serialization(format!("negative count {v}")))
    };
    Ok(AuditRecord {
        id,
        actor,
        action,
        scope,
        target_count: unsigned(target)?,
        success_count: unsigned(success)?,
        failure_count: unsigned(failure)?,
        metadata,
        created_at,
    })
}

#[async_trait]
impl AuditStore for PostgresReplayStore {
    async fn record(&self, entry: AuditRecord) -> Result<(), AuditError> {
        let table = self.config.audit_log_table();
        let query = format!(
            "INSERT INTO {table} ({AUDIT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&query)
            .bind(&entry.id)
            .bind(&entry.actor)
            .bind(&entry.action)
            .bind(&entry.scope)
            .bind(count(entry.target_count)?)
            .bind(count(entry.success_count)?)
            .bind(count(entry.failure_count)?)
            .bind(&entry.metadata)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AuditRecord>, AuditError> {
        let table = self.config.audit_log_table();
        let query = format!("SELECT {AUDIT_COLUMNS} FROM {table} WHERE id = $1");
        let row: Option<AuditRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        row.map(record_from_row).transpose()
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let table = self.config.audit_log_table();
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM {table} \
             WHERE ($1::text IS NULL OR actor = $1) \
               AND ($2::text IS NULL OR scope = $2) \
               AND ($3::text IS NULL OR action = $3) \
             ORDER BY created_at DESC \
             LIMIT $4"
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(query.actor.as_deref())
            .bind(query.scope.as_deref())
            .bind(query.action.as_deref())
            .bind(i64::from(query.effective_limit()))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        rows.into_iter().map(record_from_row).collect()
    }
}
