pub mod error;
pub mod selection;
pub mod store;
pub mod testing;

pub use error::StoreError;
pub use selection::{DlqFilter, DlqSelection};
pub use store::ReplayStore;
