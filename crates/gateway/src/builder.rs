use std::sync::Arc;

use requeue_audit::AuditStore;
use requeue_executor::{ExecutorConfig, RetryExecutor};
use requeue_provider::TaskEngine;
use requeue_store::ReplayStore;
use requeue_webhook::Notifier;

use crate::config::ReplayConfig;
use crate::error::GatewayError;
use crate::gateway::ReplayGateway;

/// Fluent builder for constructing a [`ReplayGateway`].
///
/// A [`ReplayStore`] and a [`TaskEngine`] are required. Audit and
/// notification sinks are optional; without them the corresponding side
/// effects are skipped.
#[derive(Default)]
pub struct GatewayBuilder {
    store: Option<Arc<dyn ReplayStore>>,
    engine: Option<Arc<dyn TaskEngine>>,
    audit: Option<Arc<dyn AuditStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    executor_config: ExecutorConfig,
    replay_config: ReplayConfig,
}

impl GatewayBuilder {
    /// Create a new builder with all optional fields set to their defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transactional store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ReplayStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the execution engine receiving retry dispatches.
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn TaskEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    #[must_use]
    pub fn audit_store(mut self, audit: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(audit);
        self
    }

    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn executor_config(mut self, config: ExecutorConfig) -> Self {
        self.executor_config = config;
        self
    }

    #[must_use]
    pub fn replay_config(mut self, config: ReplayConfig) -> Self {
        self.replay_config = config;
        self
    }

    /// Consume the builder and produce a [`ReplayGateway`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the store or engine is
    /// missing, or the breaker ratio is outside `[0, 1]`.
    pub fn build(self) -> Result<ReplayGateway, GatewayError> {
        let store = self
            .store
            .ok_or_else(|| GatewayError::Configuration("replay store is required".into()))?;

        let engine = self
            .engine
            .ok_or_else(|| GatewayError::Configuration("task engine is required".into()))?;

        let ratio = self.executor_config.breaker_failure_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(GatewayError::Configuration(format!(
                "breaker failure ratio must be within [0, 1], got {ratio}"
            )));
        }

        let executor = RetryExecutor::new(Arc::clone(&store), engine, self.executor_config);

        Ok(ReplayGateway {
            store,
            executor,
            audit: self.audit,
            notifier: self.notifier,
            config: self.replay_config,
        })
    }
}
