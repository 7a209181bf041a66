pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod store_factory;
pub mod telemetry;
