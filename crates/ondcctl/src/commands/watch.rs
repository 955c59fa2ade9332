use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ondc_core::{EngineConfig, PairedStep};
use ondc_runtime::{DispatchOutcome, FlowController, PendingInput};
use tracing::{info, warn};

use super::LiveFlow;
use crate::output::{self, ConsoleNotifier};

/// Poll a flow, print what changed, and let the controller auto-advance it
pub async fn execute(
    config: &EngineConfig,
    session_id: &str,
    flow_id: &str,
    interval_secs: u64,
    read_only: bool,
) -> Result<()> {
    let live = LiveFlow::connect(config, session_id, flow_id).await?;
    let controller = FlowController::new(
        session_id,
        live.directory.clone(),
        live.backend.clone(),
        Arc::new(ConsoleNotifier),
    );

    info!(session_id, flow_id, transaction_id = %live.transaction_id, "Watching flow");
    println!(
        "{}",
        output::header(&format!("Watching {} ({})", flow_id, live.transaction_id))
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    let mut last_timeline: Option<Vec<PairedStep>> = None;
    let mut last_pending: Option<PendingInput> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching {}", flow_id);
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let flow_map = match live.snapshot(session_id).await {
            Ok(flow_map) => flow_map,
            Err(e) if e.is_transient() => {
                warn!(flow_id, error = %e, "Snapshot fetch failed, retrying");
                continue;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "Failed to fetch flow for transaction '{}'",
                    live.transaction_id
                )));
            }
        };

        let evaluation = controller.observe(flow_id, &flow_map);

        if last_timeline.as_ref() != Some(&evaluation.timeline) {
            println!();
            println!("{}", output::render_timeline(&evaluation.timeline));
            last_timeline = Some(evaluation.timeline.clone());
        }

        if last_pending.as_ref() != Some(&evaluation.pending) {
            if let Some(pending) = output::render_pending(&evaluation.pending) {
                println!("{}", pending);
                if evaluation.pending.requires_form() {
                    println!(
                        "  submit with: ondcctl submit --session {} --flow {} --data '{{...}}'",
                        session_id, flow_id
                    );
                }
            }
            last_pending = Some(evaluation.pending.clone());
        }

        if read_only {
            continue;
        }

        match controller.dispatch(&evaluation).await {
            DispatchOutcome::Idle => {}
            outcome => println!("→ {}", output::render_outcome(&outcome)),
        }
    }
}
