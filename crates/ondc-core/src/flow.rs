// ONDC Core - Flow step model
//
// A flow is one scripted protocol scenario (search → on_search → select → ...).
// The session backend reports its execution history as a FlowMap: the steps
// that occurred or are pending, plus the steps it decided were skipped. The
// engine treats every FlowMap as an immutable snapshot.
//
// Wire shape (as sent by the backend):
//
// ```json
// {
//   "sequence": [
//     { "actionId": "search", "index": 0, "status": "COMPLETE" },
//     { "actionId": "on_search", "pairActionId": "search", "index": 1, "status": "COMPLETE" },
//     { "actionId": "select", "index": 2, "status": "INPUT-REQUIRED", "input": [ ... ] }
//   ],
//   "missedSteps": [],
//   "reference_data": { ... },
//   "activeFlow": "flow-1"
// }
// ```

use crate::form::FormConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status tag of a step
///
/// Only `INPUT-REQUIRED` and `RESPONDING` drive engine decisions. Any other
/// tag the backend emits is kept verbatim so it renders and serializes back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepStatus {
    /// Waiting for a human to fill the step's input form
    InputRequired,
    /// Request sent, waiting on the counterparty
    Responding,
    /// Step finished
    Complete,
    /// Any other tag reported by the backend
    Other(String),
}

impl StepStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InputRequired => "INPUT-REQUIRED",
            Self::Responding => "RESPONDING",
            Self::Complete => "COMPLETE",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for StepStatus {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "INPUT-REQUIRED" => Self::InputRequired,
            "RESPONDING" => Self::Responding,
            "COMPLETE" => Self::Complete,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for StepStatus {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<StepStatus> for String {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a step occurrence: `(actionId, index)`
///
/// The same action id can occur at several indices (a retried action); each
/// occurrence is distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepKey {
    pub action_id: String,
    pub index: i64,
}

impl StepKey {
    pub fn new(action_id: impl Into<String>, index: i64) -> Self {
        Self {
            action_id: action_id.into(),
            index,
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.action_id, self.index)
    }
}

/// One occurrence of a protocol action within a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Action identifier of this occurrence (e.g. "on_search")
    pub action_id: String,

    /// Counterpart action this step answers or is answered by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_action_id: Option<String>,

    /// Chronological position; not necessarily contiguous or sorted
    pub index: i64,

    /// Backend status tag
    pub status: StepStatus,

    /// Form a human must fill before the step's request can be sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<FormConfig>,

    /// Advance without waiting for a paired response
    #[serde(
        default,
        rename = "force_proceed",
        skip_serializing_if = "Option::is_none"
    )]
    pub force_proceed: Option<bool>,

    /// Remaining backend fields (actionType, description, ...), passed through
    #[serde(flatten, default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Step {
    pub fn new(action_id: impl Into<String>, index: i64, status: impl Into<StepStatus>) -> Self {
        Self {
            action_id: action_id.into(),
            pair_action_id: None,
            index,
            status: status.into(),
            input: None,
            force_proceed: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_pair(mut self, pair_action_id: impl Into<String>) -> Self {
        self.pair_action_id = Some(pair_action_id.into());
        self
    }

    pub fn with_input(mut self, input: FormConfig) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_force_proceed(mut self, force: bool) -> Self {
        self.force_proceed = Some(force);
        self
    }

    pub fn key(&self) -> StepKey {
        StepKey::new(self.action_id.clone(), self.index)
    }

    pub fn is_input_required(&self) -> bool {
        self.status == StepStatus::InputRequired
    }

    pub fn is_responding(&self) -> bool {
        self.status == StepStatus::Responding
    }

    pub fn forces_proceed(&self) -> bool {
        self.force_proceed == Some(true)
    }
}

/// Snapshot of a flow's execution history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMap {
    /// Steps that occurred or are pending
    #[serde(default, deserialize_with = "null_as_default")]
    pub sequence: Vec<Step>,

    /// Steps the backend determined were skipped
    #[serde(
        default,
        rename = "missedSteps",
        alias = "missed_steps",
        deserialize_with = "null_as_default"
    )]
    pub missed_steps: Vec<Step>,

    /// Opaque context handed to the input form (e.g. captured catalogs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_data: Option<serde_json::Value>,

    /// Flow currently live for auto-submit decisions
    #[serde(
        default,
        rename = "activeFlow",
        alias = "active_flow",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_flow: Option<String>,
}

impl FlowMap {
    pub fn new(sequence: Vec<Step>) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    pub fn with_missed_steps(mut self, missed: Vec<Step>) -> Self {
        self.missed_steps = missed;
        self
    }

    pub fn with_active_flow(mut self, flow_id: impl Into<String>) -> Self {
        self.active_flow = Some(flow_id.into());
        self
    }

    pub fn with_reference_data(mut self, data: serde_json::Value) -> Self {
        self.reference_data = Some(data);
        self
    }

    /// Parse a FlowMap from backend JSON
    pub fn from_json_str(json: &str) -> crate::OndcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `sequence` followed by `missedSteps`, in input order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.sequence.iter().chain(self.missed_steps.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty() && self.missed_steps.is_empty()
    }

    /// Whether `flow_id` is the flow this snapshot reports as live
    pub fn is_active(&self, flow_id: &str) -> bool {
        self.active_flow.as_deref() == Some(flow_id)
    }
}

/// One row of the rendered timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedStep {
    /// Primary element, by convention the request-like action
    pub first: Step,

    /// Matched counterpart of `first`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<Step>,
}

impl PairedStep {
    /// Keys of the steps in this row
    pub fn keys(&self) -> Vec<StepKey> {
        let mut keys = vec![self.first.key()];
        if let Some(ref second) = self.second {
            keys.push(second.key());
        }
        keys
    }
}

/// Treat an explicit `null` the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags() {
        assert_eq!(StepStatus::from("INPUT-REQUIRED"), StepStatus::InputRequired);
        assert_eq!(StepStatus::from("RESPONDING"), StepStatus::Responding);
        assert_eq!(StepStatus::from("COMPLETE"), StepStatus::Complete);
        assert_eq!(
            StepStatus::from("LISTENING"),
            StepStatus::Other("LISTENING".to_string())
        );
        assert_eq!(StepStatus::from("LISTENING").to_string(), "LISTENING");
    }

    #[test]
    fn test_unknown_status_survives_serialization() {
        let step: Step =
            serde_json::from_str(r#"{"actionId":"init","index":3,"status":"WAITING-SUBMISSION"}"#)
                .unwrap();
        assert_eq!(step.status, StepStatus::Other("WAITING-SUBMISSION".into()));

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["status"], "WAITING-SUBMISSION");
        assert_eq!(json["actionId"], "init");
    }

    #[test]
    fn test_step_wire_fields() {
        let step: Step = serde_json::from_str(
            r#"{
                "actionId": "on_search",
                "pairActionId": "search",
                "index": 1,
                "status": "RESPONDING",
                "force_proceed": true,
                "actionType": "on_search",
                "unsolicited": false
            }"#,
        )
        .unwrap();

        assert_eq!(step.pair_action_id.as_deref(), Some("search"));
        assert!(step.is_responding());
        assert!(step.forces_proceed());
        assert!(step.input.is_none());
        assert_eq!(step.extra["actionType"], "on_search");
        assert_eq!(step.extra["unsolicited"], false);
        assert_eq!(step.key(), StepKey::new("on_search", 1));
    }

    #[test]
    fn test_flow_map_missing_collections() {
        let map: FlowMap = serde_json::from_str("{}").unwrap();
        assert!(map.is_empty());
        assert!(map.active_flow.is_none());

        let map: FlowMap =
            serde_json::from_str(r#"{"sequence": null, "missedSteps": null, "activeFlow": "f1"}"#)
                .unwrap();
        assert!(map.is_empty());
        assert!(map.is_active("f1"));
        assert!(!map.is_active("f2"));
    }

    #[test]
    fn test_steps_chain_order() {
        let map = FlowMap::new(vec![Step::new("search", 0, "COMPLETE")])
            .with_missed_steps(vec![Step::new("on_search", 1, "SKIPPED")]);

        let ids: Vec<&str> = map.steps().map(|s| s.action_id.as_str()).collect();
        assert_eq!(ids, vec!["search", "on_search"]);
    }

    #[test]
    fn test_step_key_display() {
        assert_eq!(StepKey::new("select", 4).to_string(), "select#4");
        assert_eq!(Step::new("select", 4, "COMPLETE").key(), StepKey::new("select", 4));
    }
}
