//! Transaction directory - session → flow → transaction id
//!
//! The engine only reads from the directory. The session layer that owns it
//! fills it from the backend's session record.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::debug;

/// Read-only view of the session → flow → transaction id map
pub trait TransactionDirectory: Send + Sync {
    /// Transaction id routing proceed calls for `flow_id` in `session_id`
    fn transaction_id(&self, session_id: &str, flow_id: &str) -> Option<String>;
}

/// In-memory directory backed by DashMap
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    sessions: DashMap<String, HashMap<String, String>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the transaction id of one flow
    pub fn upsert(
        &self,
        session_id: impl Into<String>,
        flow_id: impl Into<String>,
        transaction_id: impl Into<String>,
    ) {
        self.sessions
            .entry(session_id.into())
            .or_default()
            .insert(flow_id.into(), transaction_id.into());
    }

    /// Replace everything known about a session
    pub fn load_session(&self, session_id: impl Into<String>, flows: HashMap<String, String>) {
        let session_id = session_id.into();
        debug!(session_id = %session_id, flows = flows.len(), "Loaded session transactions");
        self.sessions.insert(session_id, flows);
    }

    /// Flows of a session with their transaction ids
    pub fn flows(&self, session_id: &str) -> HashMap<String, String> {
        self.sessions
            .get(session_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl TransactionDirectory for InMemoryDirectory {
    fn transaction_id(&self, session_id: &str, flow_id: &str) -> Option<String> {
        self.sessions
            .get(session_id)
            .and_then(|flows| flows.get(flow_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_lookup() {
        let dir = InMemoryDirectory::new();
        assert!(dir.is_empty());

        dir.upsert("s1", "f1", "t1");
        dir.upsert("s1", "f2", "t2");
        dir.upsert("s1", "f1", "t1b");

        assert_eq!(dir.transaction_id("s1", "f1").as_deref(), Some("t1b"));
        assert_eq!(dir.transaction_id("s1", "f2").as_deref(), Some("t2"));
        assert_eq!(dir.transaction_id("s1", "f3"), None);
        assert_eq!(dir.transaction_id("s2", "f1"), None);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_load_session_replaces_flows() {
        let dir = InMemoryDirectory::new();
        dir.upsert("s1", "old", "t0");

        let mut flows = HashMap::new();
        flows.insert("f1".to_string(), "t1".to_string());
        dir.load_session("s1", flows);

        assert_eq!(dir.transaction_id("s1", "old"), None);
        assert_eq!(dir.flows("s1").len(), 1);
        assert!(dir.flows("s2").is_empty());
    }
}
