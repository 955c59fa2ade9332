//! Auto-advance trigger
//!
//! Some actions are system-generated continuations that must fire without a
//! paired response or human input. The backend flags them with
//! `force_proceed` on the step that is currently `RESPONDING`.

use ondc_core::{FlowMap, Step};
use tracing::warn;

use crate::directory::TransactionDirectory;

/// First `RESPONDING` step of the sequence, if it is flagged `force_proceed`
pub fn force_proceed_step(flow_map: &FlowMap) -> Option<&Step> {
    flow_map
        .sequence
        .iter()
        .find(|s| s.is_responding())
        .filter(|s| s.forces_proceed())
}

/// Transaction id to advance without payload, or `None` to keep waiting
pub fn should_auto_proceed(
    flow_map: &FlowMap,
    session_id: &str,
    flow_id: &str,
    directory: &dyn TransactionDirectory,
) -> Option<String> {
    let step = force_proceed_step(flow_map)?;

    match directory.transaction_id(session_id, flow_id) {
        Some(transaction_id) => Some(transaction_id),
        None => {
            warn!(
                session_id,
                flow_id,
                step = %step.key(),
                "force_proceed step but no transaction id for flow yet"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;

    fn directory() -> InMemoryDirectory {
        let dir = InMemoryDirectory::new();
        dir.upsert("s1", "f1", "txn-1");
        dir
    }

    fn responding(force: Option<bool>) -> FlowMap {
        let mut step = Step::new("on_search", 1, "RESPONDING");
        step.force_proceed = force;
        FlowMap::new(vec![Step::new("search", 0, "COMPLETE"), step])
    }

    #[test]
    fn test_force_proceed_returns_transaction() {
        let map = responding(Some(true));
        assert_eq!(
            should_auto_proceed(&map, "s1", "f1", &directory()),
            Some("txn-1".to_string())
        );
    }

    #[test]
    fn test_without_force_proceed_waits() {
        assert_eq!(should_auto_proceed(&responding(Some(false)), "s1", "f1", &directory()), None);
        assert_eq!(should_auto_proceed(&responding(None), "s1", "f1", &directory()), None);
    }

    #[test]
    fn test_unresolvable_transaction_waits() {
        let map = responding(Some(true));
        assert_eq!(should_auto_proceed(&map, "s1", "f9", &directory()), None);
        assert_eq!(should_auto_proceed(&map, "s2", "f1", &directory()), None);
    }

    #[test]
    fn test_only_first_responding_step_counts() {
        let map = FlowMap::new(vec![
            Step::new("on_search", 1, "RESPONDING"),
            Step::new("on_select", 3, "RESPONDING").with_force_proceed(true),
        ]);
        assert!(force_proceed_step(&map).is_none());
    }

    #[test]
    fn test_decision_is_idempotent() {
        let map = responding(Some(true));
        let dir = directory();
        let first = should_auto_proceed(&map, "s1", "f1", &dir);
        let second = should_auto_proceed(&map, "s1", "f1", &dir);
        assert_eq!(first, second);
    }
}
