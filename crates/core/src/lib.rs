pub mod dlq;
pub mod outcome;
pub mod ratelimit;
pub mod request;
pub mod run;
pub mod task;

pub use dlq::{DlqItem, PreviewItem};
pub use outcome::{ItemOutcome, ItemStatus};
pub use ratelimit::RateLimitWindow;
pub use request::{DEFAULT_MAX_ITEMS, MAX_ITEMS_CEILING, ReplayRequest, TENANT_SCOPE_ALL};
pub use run::{ReplayRun, RunStatus, RunSummary};
pub use task::TaskRecord;
