use requeue_core::{ItemStatus, RunSummary};

/// Running (processed, succeeded, failed) accumulator for one batch.
///
/// The batch trips once `failed > ratio * batch_size`; the check is made
/// after every recorded item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerTally {
    batch_size: u32,
    ratio: f64,
    summary: RunSummary,
}

impl BreakerTally {
    pub fn new(batch_size: u32, ratio: f64) -> Self {
        Self {
            batch_size,
            ratio,
            summary: RunSummary::default(),
        }
    }

    /// Fold one item result into the tally.
    pub fn record(&mut self, status: ItemStatus) {
        self.summary.total_processed += 1;
        if status.is_failure() {
            self.summary.failed += 1;
        } else {
            self.summary.successful += 1;
        }
    }

    /// Whether the failure count has exceeded the allowed share of the batch.
    pub fn is_tripped(&self) -> bool {
        f64::from(self.summary.failed) > self.ratio * f64::from(self.batch_size)
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}
