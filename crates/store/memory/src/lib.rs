pub mod store;

pub use store::MemoryReplayStore;
