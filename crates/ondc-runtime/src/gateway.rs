//! Flow advancement gateway
//!
//! The single path to the backend's proceed endpoint. Failures are handled
//! here: the user is notified and the outcome says what happened, so callers
//! never need their own error handling to clean up pending-input state.

use std::sync::Arc;

use ondc_core::{FormConfig, FormSubmission, OndcError};
use tracing::{error, info, warn};

use crate::backend::{FlowBackend, ProceedRequest};
use crate::notify::{Notification, Notifier};

/// Result of an advancement attempt
#[derive(Debug)]
pub enum AdvanceOutcome {
    /// Backend accepted the proceed call
    Advanced,
    /// Submission failed validation; nothing was sent
    Rejected(OndcError),
    /// Backend call failed
    Failed(OndcError),
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced)
    }

    pub fn error(&self) -> Option<&OndcError> {
        match self {
            Self::Advanced => None,
            Self::Rejected(e) | Self::Failed(e) => Some(e),
        }
    }
}

/// Gateway that submits form data to advance a transaction
#[derive(Clone)]
pub struct FlowGateway {
    backend: Arc<dyn FlowBackend>,
    notifier: Arc<dyn Notifier>,
}

impl FlowGateway {
    pub fn new(backend: Arc<dyn FlowBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self { backend, notifier }
    }

    /// Advance a transaction with a typed submission
    ///
    /// When `form_config` is given, raw answers must name declared fields.
    pub async fn advance(
        &self,
        session_id: &str,
        transaction_id: &str,
        submission: &FormSubmission,
        form_config: Option<&FormConfig>,
    ) -> AdvanceOutcome {
        if let Some(config) = form_config {
            if let Err(e) = submission.validate_against(config) {
                return self.reject(transaction_id, e);
            }
        }

        let request = ProceedRequest::new(session_id, transaction_id, submission);
        info!(
            session_id,
            transaction_id,
            json_path_fields = request.json_path_changes.len(),
            raw_fields = request.input_data.len(),
            "Proceeding flow"
        );

        match self.backend.proceed(&request).await {
            Ok(()) => AdvanceOutcome::Advanced,
            Err(e) => {
                error!(session_id, transaction_id, error = %e, "Proceed call failed");
                self.notifier
                    .notify(Notification::error("Failed to proceed flow", e.to_string()));
                AdvanceOutcome::Failed(e)
            }
        }
    }

    /// Advance a transaction from loose JSON form output
    ///
    /// Values must be strings, numbers or string arrays; anything else is
    /// rejected before dispatch.
    pub async fn advance_json(
        &self,
        session_id: &str,
        transaction_id: &str,
        json_path: &serde_json::Value,
        raw: &serde_json::Value,
        form_config: Option<&FormConfig>,
    ) -> AdvanceOutcome {
        match FormSubmission::from_json(json_path, raw) {
            Ok(submission) => {
                self.advance(session_id, transaction_id, &submission, form_config)
                    .await
            }
            Err(e) => self.reject(transaction_id, e),
        }
    }

    /// Report a submission that failed validation; nothing is sent
    pub fn reject(&self, context: &str, e: OndcError) -> AdvanceOutcome {
        warn!(context, error = %e, "Rejected form submission");
        self.notifier
            .notify(Notification::error("Invalid form submission", e.to_string()));
        AdvanceOutcome::Rejected(e)
    }
}
