use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use ondc_core::EngineConfig;
use ondc_runtime::FlowController;
use serde_json::Value;

use super::LiveFlow;
use crate::output::{self, ConsoleNotifier};

/// Fill the form the flow is currently waiting on
pub async fn execute(
    config: &EngineConfig,
    session_id: &str,
    flow_id: &str,
    data: &str,
) -> Result<()> {
    let answers: Value =
        serde_json::from_str(data).context("--data must be a JSON object of form answers")?;

    let live = LiveFlow::connect(config, session_id, flow_id).await?;
    let controller = FlowController::new(
        session_id,
        live.directory.clone(),
        live.backend.clone(),
        Arc::new(ConsoleNotifier),
    );

    let flow_map = live
        .snapshot(session_id)
        .await
        .with_context(|| format!("Failed to fetch flow for transaction '{}'", live.transaction_id))?;
    let evaluation = controller.observe(flow_id, &flow_map);
    let Some(step) = evaluation.pending.step.as_ref().filter(|_| evaluation.pending.requires_form())
    else {
        bail!("Flow '{}' is not waiting for input", flow_id);
    };

    let outcome = controller.submit_answers(flow_id, step, &answers).await;

    let summary = output::render_outcome(&outcome);
    if !outcome.is_advanced() {
        bail!("Submission for {} not sent: {}", step, summary);
    }
    println!("✓ {} {}", step, summary);
    Ok(())
}
