pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use error::AuditError;
pub use memory::MemoryAuditStore;
pub use record::{AuditQuery, AuditRecord, REPLAY_ACTION};
pub use store::AuditStore;
