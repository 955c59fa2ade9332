//! Pairing & ordering resolver
//!
//! Turns the unordered `sequence` + `missedSteps` of a FlowMap into timeline
//! rows of request/response pairs sorted by the request's index.
//!
//! Pairing follows `pairActionId`. A step that names a counterpart takes the
//! first unclaimed step with that action id. A step that names nothing (the
//! usual shape of a request) takes the first unclaimed step whose
//! `pairActionId` names it. Every `(actionId, index)` occurrence lands in
//! exactly one row.

use std::collections::HashSet;

use ondc_core::{FlowMap, PairedStep, Step, StepKey};
use tracing::trace;

/// Resolve a FlowMap into ordered timeline rows
pub fn resolve(flow_map: &FlowMap) -> Vec<PairedStep> {
    let steps: Vec<&Step> = flow_map.steps().collect();
    let mut visited: HashSet<StepKey> = HashSet::with_capacity(steps.len());
    let mut rows = Vec::new();

    for step in &steps {
        if !visited.insert(step.key()) {
            continue;
        }

        let partner = find_partner(&steps, step, &visited);
        if let Some(partner) = partner {
            visited.insert(partner.key());
            trace!(first = %step.key(), second = %partner.key(), "Paired steps");
        }

        rows.push(PairedStep {
            first: (*step).clone(),
            second: partner.cloned(),
        });
    }

    // Stable: input order breaks index ties
    rows.sort_by_key(|row| row.first.index);
    rows
}

fn find_partner<'a>(
    steps: &[&'a Step],
    step: &Step,
    visited: &HashSet<StepKey>,
) -> Option<&'a Step> {
    let unclaimed = |candidate: &Step| !visited.contains(&candidate.key());

    match step.pair_action_id.as_deref() {
        Some(pair_id) => steps
            .iter()
            .copied()
            .find(|c| c.action_id == pair_id && unclaimed(*c)),
        None => steps
            .iter()
            .copied()
            .find(|c| {
                c.pair_action_id.as_deref() == Some(step.action_id.as_str()) && unclaimed(*c)
            }),
    }
}
