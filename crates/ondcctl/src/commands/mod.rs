pub mod session;
pub mod submit;
pub mod timeline;
pub mod watch;

use std::sync::Arc;

use anyhow::Context as _;
use ondc_core::{EngineConfig, FlowMap, OndcResult};
use ondc_runtime::{FlowBackend, HttpFlowBackend, InMemoryDirectory};

/// Everything a live command needs to talk to one flow
pub(crate) struct LiveFlow {
    pub backend: Arc<HttpFlowBackend>,
    pub directory: Arc<InMemoryDirectory>,
    pub transaction_id: String,
}

impl LiveFlow {
    /// Look up the flow's transaction through its session
    pub async fn connect(config: &EngineConfig, session_id: &str, flow_id: &str) -> anyhow::Result<Self> {
        let backend = Arc::new(HttpFlowBackend::new(&config.backend)?);
        let directory = Arc::new(InMemoryDirectory::new());

        let session = backend
            .session(session_id)
            .await
            .with_context(|| format!("Failed to load session '{}'", session_id))?;
        let transaction_id = session.transactions.get(flow_id).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "Flow '{}' has no transaction in session '{}' (known flows: {:?})",
                flow_id,
                session_id,
                session.transactions.keys().collect::<Vec<_>>()
            )
        })?;
        directory.load_session(session_id, session.transactions);

        Ok(Self {
            backend,
            directory,
            transaction_id,
        })
    }

    pub async fn snapshot(&self, session_id: &str) -> OndcResult<FlowMap> {
        self.backend.flow_map(session_id, &self.transaction_id).await
    }
}
