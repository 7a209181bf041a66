pub mod audit;
pub mod config;
pub mod migrations;
pub mod store;

pub use config::PostgresConfig;
pub use migrations::run_migrations;
pub use store::PostgresReplayStore;
