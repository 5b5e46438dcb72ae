//! Result storage and filtered projection for the active check session

use crate::session::models::{Aggregate, CheckResult, CheckStatus, FilterMode};

/// Ordered results received for one session id
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    session_id: Option<String>,
    results: Vec<CheckResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all results and scope the store to a new session
    pub fn reset(&mut self, session_id: &str) {
        self.session_id = Some(session_id.to_string());
        self.results.clear();
    }

    /// Drop all results, keeping the current session scope
    pub fn clear(&mut self) {
        self.results.clear();
    }

    #[cfg(test)]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Append a result in arrival order. Returns false, leaving the store
    /// untouched, when the result was emitted under a different session.
    pub fn append(&mut self, session_id: &str, result: CheckResult) -> bool {
        if self.session_id.as_deref() != Some(session_id) {
            return false;
        }
        self.results.push(result);
        true
    }

    /// Counts recomputed from the stored sequence
    pub fn aggregate(&self) -> Aggregate {
        let valid_count = self.count(CheckStatus::Valid);
        let invalid_count = self.count(CheckStatus::Invalid);

        Aggregate {
            valid_count,
            invalid_count,
            total: self.results.len(),
        }
    }

    /// Results admitted by `mode`, in arrival order
    pub fn project(&self, mode: FilterMode) -> Vec<&CheckResult> {
        self.results.iter().filter(|r| mode.admits(r)).collect()
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(session: &str, results: Vec<CheckResult>) -> ResultStore {
        let mut store = ResultStore::new();
        store.reset(session);
        for result in results {
            assert!(store.append(session, result));
        }
        store
    }

    #[test]
    fn test_empty_store() {
        let store = ResultStore::new();
        assert!(store.is_empty());
        assert_eq!(store.aggregate(), Aggregate::default());
        assert!(store.project(FilterMode::All).is_empty());
    }

    #[test]
    fn test_append_preserves_arrival_order() {
        let store = store_with(
            "s1",
            vec![
                CheckResult::invalid("c:3"),
                CheckResult::valid("a:1", 5),
                CheckResult::invalid("b:2"),
            ],
        );

        let proxies: Vec<_> = store.results().iter().map(|r| r.proxy.as_str()).collect();
        assert_eq!(proxies, vec!["c:3", "a:1", "b:2"]);
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let store = store_with(
            "s1",
            vec![CheckResult::valid("a:1", 5), CheckResult::valid("a:1", 5)],
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_rejects_other_session() {
        let mut store = store_with("s1", vec![CheckResult::valid("a:1", 5)]);
        assert!(!store.append("s0", CheckResult::invalid("b:2")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.aggregate().invalid_count, 0);
    }

    #[test]
    fn test_append_without_session_is_rejected() {
        let mut store = ResultStore::new();
        assert!(!store.append("s1", CheckResult::valid("a:1", 5)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_aggregate_matches_sequence() {
        let mut store = store_with("s1", Vec::new());
        let statuses = [true, false, false, true, true, false, true];

        for (i, valid) in statuses.iter().enumerate() {
            let proxy = format!("10.0.0.{}:80", i);
            let result = if *valid {
                CheckResult::valid(proxy, 10)
            } else {
                CheckResult::invalid(proxy)
            };
            store.append("s1", result);

            let agg = store.aggregate();
            assert_eq!(agg.total, agg.valid_count + agg.invalid_count);
            assert_eq!(agg.total, store.len());
        }

        assert_eq!(store.aggregate().valid_count, 4);
        assert_eq!(store.aggregate().invalid_count, 3);
    }

    #[test]
    fn test_project_partitions_all() {
        let mut store = store_with(
            "s1",
            vec![
                CheckResult::valid("a:1", 5),
                CheckResult::invalid("b:2"),
                CheckResult::valid("c:3", 7),
            ],
        );

        let all = store.project(FilterMode::All).len();
        let valid = store.project(FilterMode::Valid).len();
        let invalid = store.project(FilterMode::Invalid).len();
        assert_eq!(all, valid + invalid);
        assert_eq!(valid, 2);

        // Projection reflects appends made after an earlier projection.
        store.append("s1", CheckResult::valid("d:4", 1));
        assert_eq!(store.project(FilterMode::Valid).len(), 3);

        let valid_order: Vec<_> = store
            .project(FilterMode::Valid)
            .iter()
            .map(|r| r.proxy.as_str())
            .collect();
        assert_eq!(valid_order, vec!["a:1", "c:3", "d:4"]);
    }

    #[test]
    fn test_reset_clears_results() {
        let mut store = store_with("s1", vec![CheckResult::valid("a:1", 5)]);
        store.reset("s2");
        assert_eq!(store.aggregate().total, 0);
        assert_eq!(store.session_id(), Some("s2"));
        assert!(!store.append("s1", CheckResult::valid("a:1", 5)));
    }

    #[test]
    fn test_clear_keeps_session() {
        let mut store = store_with("s1", vec![CheckResult::valid("a:1", 5)]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.append("s1", CheckResult::invalid("b:2")));
    }
}
