use anyhow::{Context as _, Result};
use ondc_core::EngineConfig;
use ondc_runtime::{FlowBackend, HttpFlowBackend};

use crate::cli::OutputFormat;
use crate::output;

/// Print the flows of a session and their transaction ids
pub async fn execute(config: &EngineConfig, session_id: &str, format: OutputFormat) -> Result<()> {
    let backend = HttpFlowBackend::new(&config.backend)?;
    let session = backend
        .session(session_id)
        .await
        .with_context(|| format!("Failed to load session '{}'", session_id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&session.transactions)?);
        }
        OutputFormat::Text => {
            println!("{}", output::header(&format!("Session {}", session_id)));
            if session.transactions.is_empty() {
                println!("(no flows started)");
                return Ok(());
            }
            let mut flows: Vec<_> = session.transactions.iter().collect();
            flows.sort();
            println!("{:<32} {}", "FLOW", "TRANSACTION");
            for (flow_id, transaction_id) in flows {
                println!("{:<32} {}", flow_id, transaction_id);
            }
        }
    }

    Ok(())
}
