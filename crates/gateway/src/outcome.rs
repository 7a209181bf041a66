use requeue_core::{PreviewItem, ReplayRun};
use requeue_executor::BatchReport;

/// Successful result of [`ReplayGateway::replay`](crate::ReplayGateway::replay).
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    /// A finished run already exists for the idempotency pair.
    Idempotent { run: ReplayRun },
    /// Nothing matched; the run was recorded as completed with zero counts.
    NoItems { run_id: String },
    /// Dry run: selection only, nothing mutated.
    DryRun {
        run_id: String,
        items_found: u32,
        preview: Vec<PreviewItem>,
    },
    /// The item loop ran (to the end or until the breaker tripped).
    Completed { run_id: String, report: BatchReport },
}

impl ReplayOutcome {
    /// Identifier of the run this outcome belongs to.
    pub fn run_id(&self) -> &str {
        match self {
            Self::Idempotent { run } => &run.id,
            Self::NoItems { run_id }
            | Self::DryRun { run_id, .. }
            | Self::Completed { run_id, .. } => run_id,
        }
    }
}
