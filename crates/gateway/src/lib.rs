pub mod builder;
pub mod config;
pub mod error;
pub mod gateway;
pub mod outcome;

pub use builder::GatewayBuilder;
pub use config::{DEFAULT_PAYLOAD_CEILING_BYTES, DEFAULT_PREVIEW_SIZE, ReplayConfig};
pub use error::GatewayError;
pub use gateway::{ReplayCommand, ReplayGateway};
pub use outcome::ReplayOutcome;
