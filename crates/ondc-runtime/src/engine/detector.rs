//! Input-requirement detector
//!
//! Finds the step a human has to fill before the flow can move on. The first
//! chronological entry is the initiating action and never asks for input, so
//! it is skipped even when tagged `INPUT-REQUIRED`.

use ondc_core::{FlowMap, FormConfig, Step, StepKey};
use serde::Serialize;
use tracing::debug;

/// What the flow is waiting on, if anything
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PendingInput {
    /// Step the decision is keyed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepKey>,

    /// Form to render; `None` when no human input is needed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_config: Option<FormConfig>,

    /// Context handed to the form alongside its configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_data: Option<serde_json::Value>,

    /// Step has nothing to fill and belongs to the active flow: acknowledge it
    /// with an empty submission
    pub should_auto_submit: bool,
}

impl PendingInput {
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a form must be shown to a human
    pub fn requires_form(&self) -> bool {
        self.form_config.is_some()
    }

    pub fn is_none(&self) -> bool {
        self.step.is_none()
    }
}

/// Inspect a snapshot for a step waiting on human input
///
/// `flow_id` is the flow being evaluated; zero-field steps are only
/// auto-acknowledged when it matches the snapshot's `activeFlow`.
pub fn find_pending_input(flow_map: &FlowMap, flow_id: &str) -> PendingInput {
    let Some(step) = first_input_step(flow_map) else {
        return PendingInput::none();
    };

    match step.input.as_ref().filter(|config| !config.is_empty()) {
        Some(config) => {
            debug!(flow_id, step = %step.key(), fields = config.len(), "Step requires input");
            PendingInput {
                step: Some(step.key()),
                form_config: Some(config.clone()),
                reference_data: flow_map.reference_data.clone(),
                should_auto_submit: false,
            }
        }
        None if flow_map.is_active(flow_id) => {
            debug!(flow_id, step = %step.key(), "Zero-field input step, auto-acknowledging");
            PendingInput {
                step: Some(step.key()),
                should_auto_submit: true,
                ..PendingInput::default()
            }
        }
        None => {
            debug!(
                flow_id,
                active_flow = ?flow_map.active_flow,
                "Zero-field input step on inactive flow, ignoring"
            );
            PendingInput::none()
        }
    }
}

fn first_input_step(flow_map: &FlowMap) -> Option<&Step> {
    let mut ordered: Vec<&Step> = flow_map.sequence.iter().collect();
    ordered.sort_by_key(|s| s.index);
    ordered.into_iter().skip(1).find(|s| s.is_input_required())
}
