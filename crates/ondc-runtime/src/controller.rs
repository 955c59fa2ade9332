//! Flow Controller - per-session snapshot pipeline
//!
//! The controller is fed every FlowMap snapshot the backend reports and
//! re-runs the resolver, detector and trigger on it. It also owns the state
//! that must survive between snapshots:
//!
//! - a per-flow snapshot sequence number; a decision taken on snapshot N is
//!   dropped if snapshot N+1 arrived before it was dispatched
//! - a per-flow in-flight flag; at most one proceed call per flow at a time
//! - the pending form, replaced on every snapshot and cleared after every
//!   submission whether or not it succeeded

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use ondc_core::{FlowMap, FormSubmission, OndcError, PairedStep, StepKey};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::FlowBackend;
use crate::directory::TransactionDirectory;
use crate::engine::{
    find_pending_input, force_proceed_step, resolve, should_auto_proceed, PendingInput,
};
use crate::gateway::{AdvanceOutcome, FlowGateway};
use crate::notify::Notifier;

/// Why the controller wants to advance without a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutoReason {
    /// Input step with nothing to fill on the active flow
    Acknowledge,
    /// `RESPONDING` step flagged `force_proceed`
    ForceProceed,
}

/// An advancement the controller will send on its own
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoAction {
    pub reason: AutoReason,
    pub step: StepKey,
    pub transaction_id: String,
}

/// Everything derived from one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub flow_id: String,
    /// Snapshot sequence number for `flow_id`
    pub seq: u64,
    pub timeline: Vec<PairedStep>,
    pub pending: PendingInput,
    pub auto_action: Option<AutoAction>,
}

/// What happened to a requested advancement
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Nothing to send
    Idle,
    /// A newer snapshot replaced the state this request was based on
    Superseded,
    /// Another proceed call for the flow is in flight
    Busy,
    /// No transaction id known for the flow yet
    Unresolved,
    /// The gateway was called
    Completed(AdvanceOutcome),
}

impl DispatchOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Completed(outcome) if outcome.is_advanced())
    }
}

#[derive(Default)]
struct FlowSlot {
    latest_seq: AtomicU64,
    in_flight: AtomicBool,
    pending: Mutex<PendingInput>,
}

impl FlowSlot {
    fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    fn is_current(&self, seq: u64) -> bool {
        self.latest_seq.load(Ordering::Acquire) == seq
    }
}

/// Releases the in-flight flag when the proceed call finishes
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Snapshot pipeline for one session
pub struct FlowController {
    session_id: String,
    directory: Arc<dyn TransactionDirectory>,
    gateway: FlowGateway,
    slots: DashMap<String, Arc<FlowSlot>>,
}

impl FlowController {
    pub fn new(
        session_id: impl Into<String>,
        directory: Arc<dyn TransactionDirectory>,
        backend: Arc<dyn FlowBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            directory,
            gateway: FlowGateway::new(backend, notifier),
            slots: DashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn gateway(&self) -> &FlowGateway {
        &self.gateway
    }

    fn slot(&self, flow_id: &str) -> Arc<FlowSlot> {
        if let Some(slot) = self.slots.get(flow_id) {
            return slot.value().clone();
        }
        self.slots.entry(flow_id.to_string()).or_default().value().clone()
    }

    /// Evaluate a new snapshot for `flow_id`
    ///
    /// Replaces the flow's pending form and bumps its sequence number, which
    /// invalidates any evaluation taken on an earlier snapshot.
    pub fn observe(&self, flow_id: &str, flow_map: &FlowMap) -> Evaluation {
        let slot = self.slot(flow_id);
        let seq = slot.latest_seq.fetch_add(1, Ordering::AcqRel) + 1;

        let timeline = resolve(flow_map);
        let pending = find_pending_input(flow_map, flow_id);
        let auto_action = self.auto_action(flow_id, flow_map, &pending);

        *slot.pending.lock() = if pending.requires_form() {
            pending.clone()
        } else {
            PendingInput::none()
        };

        debug!(
            flow_id,
            seq,
            rows = timeline.len(),
            requires_form = pending.requires_form(),
            auto = ?auto_action.as_ref().map(|a| a.reason),
            "Evaluated snapshot"
        );

        Evaluation {
            flow_id: flow_id.to_string(),
            seq,
            timeline,
            pending,
            auto_action,
        }
    }

    fn auto_action(
        &self,
        flow_id: &str,
        flow_map: &FlowMap,
        pending: &PendingInput,
    ) -> Option<AutoAction> {
        // A form waiting on a human blocks automatic advancement
        if pending.requires_form() {
            return None;
        }

        if !pending.should_auto_submit {
            let step = force_proceed_step(flow_map)?.key();
            let transaction_id =
                should_auto_proceed(flow_map, &self.session_id, flow_id, &*self.directory)?;
            return Some(AutoAction {
                reason: AutoReason::ForceProceed,
                step,
                transaction_id,
            });
        }

        let step = pending.step.clone()?;
        match self.directory.transaction_id(&self.session_id, flow_id) {
            Some(transaction_id) => Some(AutoAction {
                reason: AutoReason::Acknowledge,
                step,
                transaction_id,
            }),
            None => {
                warn!(
                    session_id = %self.session_id,
                    flow_id,
                    step = %step,
                    "No transaction id for flow, skipping acknowledge"
                );
                None
            }
        }
    }

    /// Send the evaluation's automatic advancement, if still current
    pub async fn dispatch(&self, evaluation: &Evaluation) -> DispatchOutcome {
        let Some(ref action) = evaluation.auto_action else {
            return DispatchOutcome::Idle;
        };

        let slot = self.slot(&evaluation.flow_id);
        if !slot.is_current(evaluation.seq) {
            debug!(
                flow_id = %evaluation.flow_id,
                seq = evaluation.seq,
                "Discarding stale evaluation"
            );
            return DispatchOutcome::Superseded;
        }

        let Some(_guard) = slot.try_acquire() else {
            debug!(flow_id = %evaluation.flow_id, "Proceed already in flight");
            return DispatchOutcome::Busy;
        };

        // A newer snapshot may have landed while acquiring
        if !slot.is_current(evaluation.seq) {
            return DispatchOutcome::Superseded;
        }

        info!(
            flow_id = %evaluation.flow_id,
            step = %action.step,
            reason = ?action.reason,
            "Auto-advancing flow"
        );
        let outcome = self
            .gateway
            .advance(
                &self.session_id,
                &action.transaction_id,
                &FormSubmission::empty(),
                None,
            )
            .await;
        Self::clear_pending(&slot, &action.step);

        DispatchOutcome::Completed(outcome)
    }

    /// Observe a snapshot and dispatch its automatic advancement
    pub async fn on_snapshot(
        &self,
        flow_id: &str,
        flow_map: &FlowMap,
    ) -> (Evaluation, DispatchOutcome) {
        let evaluation = self.observe(flow_id, flow_map);
        let outcome = self.dispatch(&evaluation).await;
        (evaluation, outcome)
    }

    /// Form currently waiting on a human for `flow_id`
    pub fn pending_input(&self, flow_id: &str) -> Option<PendingInput> {
        let slot = self.slots.get(flow_id)?.value().clone();
        let pending = slot.pending.lock().clone();
        pending.requires_form().then_some(pending)
    }

    /// Submit a human-filled form for the pending step `step`
    ///
    /// Discarded when the latest snapshot no longer asks for `step`. The
    /// pending form is cleared after the gateway call regardless of outcome;
    /// the next snapshot asks again if the backend still needs input.
    pub async fn submit(
        &self,
        flow_id: &str,
        step: &StepKey,
        submission: &FormSubmission,
    ) -> DispatchOutcome {
        let slot = self.slot(flow_id);
        let Some(pending) = Self::pending_for(&slot, step) else {
            debug!(flow_id, step = %step, "Submission for a step no longer pending");
            return DispatchOutcome::Superseded;
        };

        let Some(transaction_id) = self.directory.transaction_id(&self.session_id, flow_id) else {
            warn!(
                session_id = %self.session_id,
                flow_id,
                "No transaction id for flow, cannot submit"
            );
            return DispatchOutcome::Unresolved;
        };

        let Some(_guard) = slot.try_acquire() else {
            return DispatchOutcome::Busy;
        };

        // A newer snapshot may have replaced the form since the first check
        if Self::pending_for(&slot, step).as_ref() != Some(&pending) {
            debug!(flow_id, step = %step, "Pending form changed before submission");
            return DispatchOutcome::Superseded;
        }

        let outcome = self
            .gateway
            .advance(
                &self.session_id,
                &transaction_id,
                submission,
                pending.form_config.as_ref(),
            )
            .await;
        Self::clear_pending(&slot, step);

        DispatchOutcome::Completed(outcome)
    }

    /// Submit loose JSON form output for the pending step `step`
    ///
    /// Output that is not strings, numbers or string arrays is rejected
    /// without reaching the backend.
    pub async fn submit_json(
        &self,
        flow_id: &str,
        step: &StepKey,
        json_path: &serde_json::Value,
        raw: &serde_json::Value,
    ) -> DispatchOutcome {
        match FormSubmission::from_json(json_path, raw) {
            Ok(submission) => self.submit(flow_id, step, &submission).await,
            Err(e) => self.reject_pending(flow_id, step, e),
        }
    }

    /// Submit raw answers keyed by field name for the pending step `step`
    ///
    /// JSONPath patches are derived from the pending form's fields that
    /// declare a `jsonPath`.
    pub async fn submit_answers(
        &self,
        flow_id: &str,
        step: &StepKey,
        answers: &serde_json::Value,
    ) -> DispatchOutcome {
        let slot = self.slot(flow_id);
        let Some(form) = Self::pending_for(&slot, step).and_then(|p| p.form_config) else {
            debug!(flow_id, step = %step, "Answers for a step no longer pending");
            return DispatchOutcome::Superseded;
        };

        match FormSubmission::from_json(&serde_json::Value::Null, answers) {
            Ok(parsed) => {
                let submission = FormSubmission::from_form(parsed.raw, &form);
                self.submit(flow_id, step, &submission).await
            }
            Err(e) => self.reject_pending(flow_id, step, e),
        }
    }

    /// Report an unparseable submission and drop the pending form
    fn reject_pending(&self, flow_id: &str, step: &StepKey, e: OndcError) -> DispatchOutcome {
        let slot = self.slot(flow_id);
        if Self::pending_for(&slot, step).is_none() {
            return DispatchOutcome::Superseded;
        }
        let outcome = self.gateway.reject(flow_id, e);
        Self::clear_pending(&slot, step);
        DispatchOutcome::Completed(outcome)
    }

    /// Pending form of the slot, if it is the one for `step`
    fn pending_for(slot: &FlowSlot, step: &StepKey) -> Option<PendingInput> {
        let pending = slot.pending.lock();
        if pending.step.as_ref() == Some(step) && pending.requires_form() {
            Some(pending.clone())
        } else {
            None
        }
    }

    /// Clear the pending form if it is still the one for `step`
    fn clear_pending(slot: &FlowSlot, step: &StepKey) {
        let mut pending = slot.pending.lock();
        if pending.step.as_ref() == Some(step) {
            *pending = PendingInput::none();
        }
    }

    /// Latest snapshot sequence number observed for `flow_id`
    pub fn latest_seq(&self, flow_id: &str) -> u64 {
        self.slots
            .get(flow_id)
            .map(|s| s.latest_seq.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Whether a proceed call is in flight for `flow_id`
    pub fn is_in_flight(&self, flow_id: &str) -> bool {
        self.slots
            .get(flow_id)
            .map(|s| s.in_flight.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}
