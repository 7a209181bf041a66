use requeue_core::DEFAULT_MAX_ITEMS;

/// 2 MiB.
pub const DEFAULT_PAYLOAD_CEILING_BYTES: usize = 2 * 1024 * 1024;

pub const DEFAULT_PREVIEW_SIZE: usize = 5;

/// Knobs for selection and the safety rails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// `max` used when the request omits it.
    pub default_max: u32,
    /// Serialized size above which a selected batch is refused.
    pub payload_ceiling_bytes: usize,
    /// Number of items echoed back by a dry run.
    pub preview_size: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            default_max: DEFAULT_MAX_ITEMS,
            payload_ceiling_bytes: DEFAULT_PAYLOAD_CEILING_BYTES,
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }
}
