use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating required tables if they do not exist.
///
/// Every statement is idempotent, so this is safe to run on each startup and
/// from the `migrate` subcommand.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let dlq_items = config.dlq_items_table();
    let tasks = config.tasks_table();
    let tenant_controls = config.tenant_controls_table();
    let user_roles = config.user_roles_table();
    let memberships = config.company_memberships_table();
    let rate_limits = config.rate_limits_table();
    let replay_runs = config.replay_runs_table();
    let audit_log = config.audit_log_table();
    let prefix = &config.table_prefix;

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS {dlq_items} (
                id TEXT PRIMARY KEY,
                original_task_id TEXT NOT NULL,
                company_id TEXT NOT NULL,
                agent_name TEXT NOT NULL,
                error_type TEXT NOT NULL,
                error_message TEXT NOT NULL DEFAULT '',
                retry_count INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL DEFAULT 3,
                retry_after TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                priority INTEGER NOT NULL DEFAULT 0
            )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {prefix}dlq_items_eligibility_idx \
             ON {dlq_items} (priority, retry_after)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {tasks} (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                agent_name TEXT NOT NULL,
                task_type TEXT NOT NULL,
                payload JSONB NOT NULL DEFAULT '{{}}'::jsonb
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {tenant_controls} (
                company_id TEXT PRIMARY KEY,
                paused BOOLEAN NOT NULL DEFAULT FALSE
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {user_roles} (
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, role)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {memberships} (
                user_id TEXT NOT NULL,
                company_id TEXT NOT NULL,
                role TEXT NOT NULL,
                PRIMARY KEY (user_id, company_id)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {rate_limits} (
                key TEXT PRIMARY KEY,
                request_count INTEGER NOT NULL,
                window_start TIMESTAMPTZ NOT NULL,
                window_end TIMESTAMPTZ NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {replay_runs} (
                id TEXT PRIMARY KEY,
                idempotency_key TEXT NOT NULL,
                tenant_scope TEXT NOT NULL,
                requested_at TIMESTAMPTZ NOT NULL,
                requested_by TEXT NOT NULL,
                payload_hash TEXT NOT NULL,
                status TEXT NOT NULL,
                items_processed INTEGER NOT NULL DEFAULT 0,
                items_succeeded INTEGER NOT NULL DEFAULT 0,
                items_failed INTEGER NOT NULL DEFAULT 0,
                completed_at TIMESTAMPTZ
            )"
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {prefix}replay_runs_idempotency_idx \
             ON {replay_runs} (idempotency_key, tenant_scope)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {audit_log} (
                id TEXT PRIMARY KEY,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                scope TEXT NOT NULL,
                target_count INTEGER NOT NULL,
                success_count INTEGER NOT NULL,
                failure_count INTEGER NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL
            )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {prefix}audit_log_created_at_idx \
             ON {audit_log} (created_at DESC)"
        ),
    ];

    for statement in &statements {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::debug!(schema = %config.schema, prefix = %prefix, "postgres migrations applied");
    Ok(())
}
