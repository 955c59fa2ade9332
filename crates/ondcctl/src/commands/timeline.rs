use std::path::Path;

use anyhow::{Context as _, Result};
use ondc_core::FlowMap;
use ondc_runtime::{find_pending_input, resolve};

use crate::cli::OutputFormat;
use crate::output;

/// Render the timeline and pending input of a FlowMap file
pub fn execute(file: &Path, flow: Option<&str>, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let flow_map = FlowMap::from_json_str(&content)
        .with_context(|| format!("Failed to parse FlowMap from {}", file.display()))?;

    let flow_id = flow
        .map(str::to_string)
        .or_else(|| flow_map.active_flow.clone())
        .unwrap_or_default();

    let timeline = resolve(&flow_map);
    let pending = find_pending_input(&flow_map, &flow_id);

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "flowId": flow_id,
                "timeline": timeline,
                "pending": pending,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            println!("{}", output::header(&format!("Timeline {}", flow_id)));
            println!("{}", output::render_timeline(&timeline));
            if let Some(pending) = output::render_pending(&pending) {
                println!();
                println!("{}", pending);
            }
        }
    }

    Ok(())
}
