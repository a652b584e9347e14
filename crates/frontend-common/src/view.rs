//! Helpers for list pages

use medadmin_core::types::ReferralCode;

/// Identifies one issued list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Tracks the most recently issued request parameters
///
/// A response is applied only if its ticket belongs to the latest issued
/// parameters, so a slow response for an old search cannot overwrite a
/// newer one regardless of arrival order.
#[derive(Debug, Clone)]
pub struct LatestRequest<P> {
    next: u64,
    latest: Option<(Ticket, P)>,
}

impl<P> Default for LatestRequest<P> {
    fn default() -> Self {
        Self {
            next: 0,
            latest: None,
        }
    }
}

impl<P: PartialEq> LatestRequest<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new request for `params`
    pub fn issue(&mut self, params: P) -> Ticket {
        self.next += 1;
        let ticket = Ticket(self.next);
        self.latest = Some((ticket, params));
        ticket
    }

    /// Whether a response carrying `ticket` may be applied
    pub fn accept(&self, ticket: Ticket) -> bool {
        self.latest.as_ref().is_some_and(|(latest, _)| *latest == ticket)
    }

    /// Whether `params` are the latest requested ones
    pub fn is_current(&self, params: &P) -> bool {
        self.latest.as_ref().is_some_and(|(_, latest)| latest == params)
    }

    pub fn latest(&self) -> Option<&P> {
        self.latest.as_ref().map(|(_, params)| params)
    }
}

/// Codes whose code or description contains `term`, case-insensitively
pub fn filter_referral_codes<'a>(codes: &'a [ReferralCode], term: &str) -> Vec<&'a ReferralCode> {
    codes.iter().filter(|code| code.matches(term)).collect()
}

/// 1-based index range of the rows shown on `page`, if any
pub fn visible_range(page: u32, page_size: u32, total: u64) -> Option<(u64, u64)> {
    let page_size = u64::from(page_size.max(1));
    let first = u64::from(page.max(1) - 1) * page_size + 1;
    (first <= total).then(|| (first, (first + page_size - 1).min(total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medadmin_core::ListQuery;
    use serde_json::json;

    #[test]
    fn test_late_response_for_old_query_is_discarded() {
        let mut tracker = LatestRequest::new();

        let slow = tracker.issue(ListQuery::default().with_search("gr"));
        let fast = tracker.issue(ListQuery::default().with_search("grey"));

        assert!(tracker.accept(fast));
        assert!(!tracker.accept(slow));
        assert!(tracker.is_current(&ListQuery::default().with_search("grey")));
        assert_eq!(tracker.latest().and_then(ListQuery::search), Some("grey"));
    }

    #[test]
    fn test_reissuing_same_params_supersedes_older_ticket() {
        let mut tracker = LatestRequest::new();
        let first = tracker.issue(1u32);
        let second = tracker.issue(1u32);

        assert!(!tracker.accept(first));
        assert!(tracker.accept(second));
    }

    #[test]
    fn test_filter_referral_codes() {
        let codes: Vec<ReferralCode> = serde_json::from_value(json!([
            {"_id": "1", "code": "SPRING25", "description": "Spring promo"},
            {"_id": "2", "code": "WELCOME", "description": "New patients"},
            {"_id": "3", "code": "FALL10"}
        ]))
        .unwrap();

        let hits = filter_referral_codes(&codes, "spring");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "SPRING25");

        assert_eq!(filter_referral_codes(&codes, "patients")[0].id, "2");
        assert_eq!(filter_referral_codes(&codes, "  ").len(), 3);
    }

    #[test]
    fn test_visible_range() {
        assert_eq!(visible_range(1, 10, 23), Some((1, 10)));
        assert_eq!(visible_range(3, 10, 23), Some((21, 23)));
        assert_eq!(visible_range(4, 10, 23), None);
        assert_eq!(visible_range(1, 10, 0), None);
    }
}
