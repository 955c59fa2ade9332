//! Session/flow backend client
//!
//! The backend owns sessions, transactions and the mock runner. The engine
//! talks to it through [`FlowBackend`]; [`HttpFlowBackend`] is the HTTP
//! implementation:
//!
//! - `GET  {base}/sessions/{session_id}` → session record with its flow map
//! - `GET  {base}/flows/{session_id}/{transaction_id}` → current FlowMap
//! - `POST {base}/flows/proceed` → advance a transaction

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use ondc_core::{BackendConfig, FieldValue, FlowMap, FormSubmission, OndcError, OndcResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of the proceed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceedRequest {
    pub session_id: String,
    pub transaction_id: String,
    /// JSONPath-keyed patches for the outgoing protocol request
    pub json_path_changes: BTreeMap<String, FieldValue>,
    /// Raw form input keyed by field name
    pub input_data: BTreeMap<String, FieldValue>,
}

impl ProceedRequest {
    pub fn new(session_id: &str, transaction_id: &str, submission: &FormSubmission) -> Self {
        Self {
            session_id: session_id.to_string(),
            transaction_id: transaction_id.to_string(),
            json_path_changes: submission.json_path.clone(),
            input_data: submission.raw.clone(),
        }
    }
}

/// Session record as far as the engine cares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Flow id → transaction id
    #[serde(default, rename = "flowMap", alias = "flow_map")]
    pub transactions: HashMap<String, String>,

    /// Everything else the backend stores on the session
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Backend operations used by the engine and its front ends
#[async_trait]
pub trait FlowBackend: Send + Sync {
    /// Advance a transaction; only the gateway calls this
    async fn proceed(&self, request: &ProceedRequest) -> OndcResult<()>;

    /// Fetch a session record
    async fn session(&self, session_id: &str) -> OndcResult<SessionData>;

    /// Fetch the current snapshot of a transaction's flow
    async fn flow_map(&self, session_id: &str, transaction_id: &str) -> OndcResult<FlowMap>;
}

/// HTTP implementation of [`FlowBackend`]
pub struct HttpFlowBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlowBackend {
    pub fn new(config: &BackendConfig) -> OndcResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OndcError::backend(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> OndcResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| OndcError::backend(format!("GET {} failed: {}", url, e)))?;
        let response = check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| OndcError::backend(format!("Invalid response from {}: {}", url, e)))
    }
}

async fn check_status(response: reqwest::Response) -> OndcResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(OndcError::not_found(message));
    }
    Err(OndcError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl FlowBackend for HttpFlowBackend {
    async fn proceed(&self, request: &ProceedRequest) -> OndcResult<()> {
        let url = self.url("flows/proceed");
        debug!(
            url = %url,
            transaction_id = %request.transaction_id,
            "POST proceed"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| OndcError::backend(format!("POST {} failed: {}", url, e)))?;
        check_status(response).await?;
        Ok(())
    }

    async fn session(&self, session_id: &str) -> OndcResult<SessionData> {
        self.get_json(&format!("sessions/{}", session_id)).await
    }

    async fn flow_map(&self, session_id: &str, transaction_id: &str) -> OndcResult<FlowMap> {
        self.get_json(&format!("flows/{}/{}", session_id, transaction_id))
            .await
    }
}
