use serde::{Deserialize, Serialize};

/// The original task a DLQ item points back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub company_id: String,
    pub agent_name: String,
    /// Engine-specific task kind.
    pub task_type: String,
    /// Input the engine needs to re-run the task.
    pub payload: serde_json::Value,
}
