use chrono::{DateTime, Utc};

use requeue_core::{DlqItem, ReplayRequest};

/// Which filter set drives DLQ selection.
///
/// Only one filter applies per request, in the precedence order of the
/// variants below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DlqFilter {
    /// Exactly these item identifiers, restricted to one tenant when the
    /// request is tenant-scoped.
    Ids {
        ids: Vec<String>,
        company_id: Option<String>,
    },
    /// All items owned by one tenant.
    Tenant(String),
    /// All items with a given error classification.
    ErrorType(String),
    /// No filter supplied.
    All,
}

impl DlqFilter {
    /// Pick the filter for a request: ids, then tenant, then error type.
    pub fn from_request(request: &ReplayRequest) -> Self {
        let company = request.company_id.as_ref().filter(|c| !c.is_empty());
        if let Some(ids) = request.dlq_ids.as_ref().filter(|ids| !ids.is_empty()) {
            return Self::Ids {
                ids: ids.clone(),
                company_id: company.cloned(),
            };
        }
        if let Some(company) = company {
            return Self::Tenant(company.clone());
        }
        if let Some(error_type) = request.error_type.as_ref().filter(|e| !e.is_empty()) {
            return Self::ErrorType(error_type.clone());
        }
        Self::All
    }

    fn matches(&self, item: &DlqItem) -> bool {
        match self {
            Self::Ids { ids, company_id } => {
                ids.iter().any(|id| *id == item.id)
                    && company_id.as_ref().is_none_or(|c| *c == item.company_id)
            }
            Self::Tenant(company) => item.company_id == *company,
            Self::ErrorType(error_type) => item.error_type == *error_type,
            Self::All => true,
        }
    }
}

/// A fully resolved DLQ selection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlqSelection {
    pub filter: DlqFilter,
    /// Skip the `retry_after <= now` check.
    pub force: bool,
    /// Maximum number of items returned.
    pub limit: u32,
    /// Reference instant for the `retry_after` check.
    pub now: DateTime<Utc>,
}

impl DlqSelection {
    pub fn new(filter: DlqFilter, force: bool, limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            filter,
            force,
            limit,
            now,
        }
    }

    /// Filter plus eligibility predicate, for backends that select in memory.
    pub fn matches(&self, item: &DlqItem) -> bool {
        self.filter.matches(item) && item.is_eligible(self.now, self.force)
    }

    /// Order by ascending priority and cap at `limit`.
    ///
    /// Ties are broken by `retry_after` then id so results are stable.
    pub fn order_and_truncate(&self, items: &mut Vec<DlqItem>) {
        items.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.retry_after.cmp(&b.retry_after))
                .then_with(|| a.id.cmp(&b.id))
        });
        items.truncate(self.limit as usize);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn item(id: &str, company: &str, error_type: &str, priority: i32) -> DlqItem {
        DlqItem {
            id: id.into(),
            original_task_id: format!("task-{id}"),
            company_id: company.into(),
            agent_name: "agent".into(),
            error_type: error_type.into(),
            error_message: "boom".into(),
            retry_count: 0,
            max_retries: 3,
            retry_after: Utc::now() - Duration::minutes(1),
            priority,
        }
    }

    #[test]
    fn ids_take_precedence_over_tenant_and_error_type() {
        let request = ReplayRequest {
            dlq_ids: Some(vec!["a".into()]),
            company_id: Some("c1".into()),
            error_type: Some("timeout".into()),
            ..ReplayRequest::default()
        };
        assert_eq!(
            DlqFilter::from_request(&request),
            DlqFilter::Ids {
                ids: vec!["a".into()],
                company_id: Some("c1".into()),
            }
        );
    }

    #[test]
    fn tenant_scoped_ids_skip_foreign_items() {
        let request = ReplayRequest {
            dlq_ids: Some(vec!["a".into(), "b".into()]),
            company_id: Some("c2".into()),
            ..ReplayRequest::default()
        };
        let selection = DlqSelection::new(DlqFilter::from_request(&request), true, 50, Utc::now());
        assert!(!selection.matches(&item("a", "c1", "timeout", 1)));
        assert!(selection.matches(&item("b", "c2", "timeout", 1)));
    }

    #[test]
    fn unscoped_ids_match_any_tenant() {
        let request = ReplayRequest {
            dlq_ids: Some(vec!["a".into()]),
            ..ReplayRequest::default()
        };
        let selection = DlqSelection::new(DlqFilter::from_request(&request), false, 50, Utc::now());
        assert!(selection.matches(&item("a", "c9", "timeout", 1)));
    }

    #[test]
    fn tenant_takes_precedence_over_error_type() {
        let request = ReplayRequest {
            company_id: Some("c1".into()),
            error_type: Some("timeout".into()),
            ..ReplayRequest::default()
        };
        assert_eq!(
            DlqFilter::from_request(&request),
            DlqFilter::Tenant("c1".into())
        );
    }

    #[test]
    fn empty_id_list_falls_through() {
        let request = ReplayRequest {
            dlq_ids: Some(vec![]),
            error_type: Some("timeout".into()),
            ..ReplayRequest::default()
        };
        assert_eq!(
            DlqFilter::from_request(&request),
            DlqFilter::ErrorType("timeout".into())
        );
        assert_eq!(
            DlqFilter::from_request(&ReplayRequest::default()),
            DlqFilter::All
        );
    }

    #[test]
    fn matches_applies_eligibility() {
        let now = Utc::now();
        let selection = DlqSelection::new(DlqFilter::Tenant("c1".into()), false, 50, now);
        let mut eligible = item("a", "c1", "timeout", 1);
        assert!(selection.matches(&eligible));

        eligible.retry_after = now + Duration::minutes(5);
        assert!(!selection.matches(&eligible));

        let other_tenant = item("b", "c2", "timeout", 1);
        assert!(!selection.matches(&other_tenant));
    }

    #[test]
    fn orders_by_priority_and_truncates() {
        let selection = DlqSelection::new(DlqFilter::All, false, 2, Utc::now());
        let mut items = vec![
            item("low", "c", "e", 9),
            item("high", "c", "e", 1),
            item("mid", "c", "e", 5),
        ];
        selection.order_and_truncate(&mut items);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid"]);
    }
}
