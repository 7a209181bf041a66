use serde::{Deserialize, Serialize};

/// Tenant scope recorded for runs that are not restricted to one tenant.
pub const TENANT_SCOPE_ALL: &str = "all";

/// Number of items processed when the caller does not specify `max`.
pub const DEFAULT_MAX_ITEMS: u32 = 50;

/// Hard upper bound on `max`.
pub const MAX_ITEMS_CEILING: u32 = 500;

/// JSON body accepted by the replay endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReplayRequest {
    /// Explicit DLQ item identifiers to replay.
    #[serde(default)]
    pub dlq_ids: Option<Vec<String>>,
    /// Restrict the replay to one tenant (also used for authorization).
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(example = "company-42"))]
    pub company_id: Option<String>,
    /// Only replay items with this error classification.
    #[serde(default)]
    pub error_type: Option<String>,
    /// Ignore `retry_after` when selecting items.
    #[serde(default)]
    pub force: bool,
    /// Cap on the number of items processed (default 50).
    #[serde(default)]
    pub max: Option<i64>,
    /// Caller-supplied deduplication token.
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// Report what would be replayed without mutating anything.
    #[serde(default)]
    pub dry_run: bool,
}

impl ReplayRequest {
    /// Tenant scope recorded on the run (`"all"` when unscoped).
    pub fn tenant_scope(&self) -> &str {
        self.company_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(TENANT_SCOPE_ALL)
    }

    /// Resolve `max` against the given default, clamped to `1..=MAX_ITEMS_CEILING`.
    ///
    /// Non-positive values fall back to the default.
    pub fn effective_max(&self, default: u32) -> u32 {
        match self.max {
            Some(n) if n > 0 => u32::try_from(n)
                .unwrap_or(MAX_ITEMS_CEILING)
                .min(MAX_ITEMS_CEILING),
            _ => default.clamp(1, MAX_ITEMS_CEILING),
        }
    }

    /// The caller-supplied idempotency key, ignoring blank values.
    pub fn supplied_idempotency_key(&self) -> Option<&str> {
        self.idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
