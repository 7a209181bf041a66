use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use requeue_audit::{AuditRecord, AuditStore};
use requeue_core::{PreviewItem, ReplayRequest, ReplayRun, RunStatus, RunSummary};
use requeue_executor::{BatchReport, RetryExecutor};
use requeue_store::{DlqFilter, DlqSelection, ReplayStore};
use requeue_webhook::{Notifier, ReplayNotification};

use crate::config::ReplayConfig;
use crate::error::GatewayError;
use crate::outcome::ReplayOutcome;

/// An authorized, rate-limited replay request ready for execution.
#[derive(Debug, Clone)]
pub struct ReplayCommand {
    pub request: ReplayRequest,
    /// Actor string from the credential validator.
    pub actor: String,
    /// Hex SHA-256 of the raw request body.
    pub payload_hash: String,
}

/// Orchestrates one replay run: idempotency ledger, run record, selection,
/// safety rails, the retry loop, and the audit and notification side
/// effects.
pub struct ReplayGateway {
    pub(crate) store: Arc<dyn ReplayStore>,
    pub(crate) executor: RetryExecutor,
    pub(crate) audit: Option<Arc<dyn AuditStore>>,
    pub(crate) notifier: Option<Arc<dyn Notifier>>,
    pub(crate) config: ReplayConfig,
}

impl ReplayGateway {
    pub fn store(&self) -> &Arc<dyn ReplayStore> {
        &self.store
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Execute a replay request end to end.
    ///
    /// Terminal failures (store errors, oversized batches) mark the run
    /// `failed` when one was already created. Per-item failures are part of
    /// the [`ReplayOutcome::Completed`] report.
    #[instrument(skip_all, fields(actor = %command.actor, scope = %command.request.tenant_scope()))]
    pub async fn replay(&self, command: ReplayCommand) -> Result<ReplayOutcome, GatewayError> {
        let ReplayCommand {
            request,
            actor,
            payload_hash,
        } = command;
        let now = Utc::now();
        let scope = request.tenant_scope().to_owned();

        let idempotency_key = match request.supplied_idempotency_key() {
            Some(key) => {
                if let Some(existing) = self.store.find_run(key, &scope).await? {
                    return Self::replayed(existing);
                }
                key.to_owned()
            }
            None => format!("auto-{}", uuid::Uuid::now_v7()),
        };

        let mut run = ReplayRun::pending(
            uuid::Uuid::now_v7().to_string(),
            &idempotency_key,
            &scope,
            &actor,
            payload_hash,
            now,
        );
        if let Err(e) = self.store.create_run(&run).await {
            if !e.is_conflict() {
                return Err(e.into());
            }
            // Lost a race against an identical request.
            return match self.store.find_run(&idempotency_key, &scope).await? {
                Some(existing) => Self::replayed(existing),
                None => Err(e.into()),
            };
        }
        info!(replay_run_id = %run.id, idempotency_key = %idempotency_key, "replay run created");

        let selection = DlqSelection::new(
            DlqFilter::from_request(&request),
            request.force,
            request.effective_max(self.config.default_max),
            now,
        );
        let items = match self.store.select_dlq_items(&selection).await {
            Ok(items) => items,
            Err(e) => {
                error!(replay_run_id = %run.id, error = %e, "dlq selection failed");
                self.mark_failed(&mut run).await;
                return Err(e.into());
            }
        };
        let items_found = u32::try_from(items.len()).unwrap_or(u32::MAX);

        if items.is_empty() {
            run.finalize(RunStatus::Completed, RunSummary::default(), Utc::now());
            self.save_finished(&run).await;
            info!(replay_run_id = %run.id, "no eligible dlq items");
            return Ok(ReplayOutcome::NoItems { run_id: run.id });
        }

        let size = match serde_json::to_vec(&items) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                error!(replay_run_id = %run.id, error = %e, "failed to measure selected batch");
                self.mark_failed(&mut run).await;
                return Err(GatewayError::Serialization(e.to_string()));
            }
        };
        if size > self.config.payload_ceiling_bytes {
            warn!(replay_run_id = %run.id, size, limit = self.config.payload_ceiling_bytes, "selected batch too large");
            self.mark_failed(&mut run).await;
            return Err(GatewayError::PayloadTooLarge {
                size,
                limit: self.config.payload_ceiling_bytes,
            });
        }

        if request.dry_run {
            let summary = RunSummary {
                total_processed: items_found,
                ..RunSummary::default()
            };
            run.finalize(RunStatus::Completed, summary, Utc::now());
            self.save_finished(&run).await;
            let preview = items
                .iter()
                .take(self.config.preview_size)
                .map(PreviewItem::from)
                .collect();
            info!(replay_run_id = %run.id, items_found, "dry run completed");
            return Ok(ReplayOutcome::DryRun {
                run_id: run.id,
                items_found,
                preview,
            });
        }

        let report = self.executor.run(&items).await;
        run.finalize(RunStatus::Completed, report.summary, Utc::now());
        self.save_finished(&run).await;
        info!(
            replay_run_id = %run.id,
            processed = report.summary.total_processed,
            succeeded = report.summary.successful,
            failed = report.summary.failed,
            tripped = report.tripped,
            "replay run completed"
        );

        self.record_audit(&run, items_found, &report).await;
        self.notify(&run, &report).await;

        Ok(ReplayOutcome::Completed {
            run_id: run.id,
            report,
        })
    }

    /// Fetch a stored run by id.
    pub async fn get_run(&self, id: &str) -> Result<Option<ReplayRun>, GatewayError> {
        Ok(self.store.get_run(id).await?)
    }

    fn replayed(existing: ReplayRun) -> Result<ReplayOutcome, GatewayError> {
        if existing.status == RunStatus::Pending {
            return Err(GatewayError::InProgress {
                run_id: existing.id,
            });
        }
        info!(replay_run_id = %existing.id, "idempotent replay, returning stored run");
        Ok(ReplayOutcome::Idempotent { run: existing })
    }

    /// Persist a finished run. The outcome is reported to the caller even
    /// when the write fails.
    async fn save_finished(&self, run: &ReplayRun) {
        if let Err(e) = self.store.update_run(run).await {
            error!(replay_run_id = %run.id, error = %e, "failed to finalize replay run");
        }
    }

    async fn mark_failed(&self, run: &mut ReplayRun) {
        run.finalize(RunStatus::Failed, RunSummary::default(), Utc::now());
        if let Err(e) = self.store.update_run(run).await {
            warn!(replay_run_id = %run.id, error = %e, "failed to mark replay run as failed");
        }
    }

    async fn record_audit(&self, run: &ReplayRun, target_count: u32, report: &BatchReport) {
        let Some(audit) = &self.audit else {
            return;
        };
        let entry = AuditRecord::replay(
            uuid::Uuid::now_v7().to_string(),
            &run.id,
            &run.requested_by,
            &run.tenant_scope,
            target_count,
            report.summary,
            Utc::now(),
        );
        if let Err(e) = audit.record(entry).await {
            warn!(replay_run_id = %run.id, error = %e, "failed to write audit record");
        }
    }

    async fn notify(&self, run: &ReplayRun, report: &BatchReport) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let notification = ReplayNotification::new(
            &run.id,
            &run.requested_by,
            &run.tenant_scope,
            report.summary,
            report.tripped,
        );
        if let Err(e) = notifier.notify(&notification).await {
            warn!(replay_run_id = %run.id, error = %e, "replay notification failed");
        }
    }
}
