pub mod engine;
pub mod error;
pub mod http;

pub use engine::{DispatchReceipt, RetryDispatch, TaskEngine};
pub use error::ProviderError;
pub use http::{HttpTaskEngine, HttpTaskEngineConfig};
