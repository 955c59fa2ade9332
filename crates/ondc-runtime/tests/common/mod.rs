//! Shared fakes for runtime integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ondc_core::{FlowMap, FormConfig, FormField, OndcError, OndcResult, Step};
use ondc_runtime::{FlowBackend, ProceedRequest, SessionData};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

/// Backend recording every proceed call
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<ProceedRequest>>,
    pub fail_with: Mutex<Option<u16>>,
    pub sessions: Mutex<HashMap<String, SessionData>>,
    pub flows: Mutex<HashMap<String, FlowMap>>,
    /// When set, proceed reports entry and waits for `release`
    pub gate: Option<(mpsc::UnboundedSender<()>, Arc<Notify>)>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(status: u16) -> Self {
        let backend = Self::default();
        *backend.fail_with.lock() = Some(status);
        backend
    }

    /// Backend whose proceed blocks until the returned Notify fires
    pub fn gated() -> (Self, mpsc::UnboundedReceiver<()>, Arc<Notify>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        let backend = Self {
            gate: Some((tx, release.clone())),
            ..Self::default()
        };
        (backend, rx, release)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl FlowBackend for FakeBackend {
    async fn proceed(&self, request: &ProceedRequest) -> OndcResult<()> {
        self.calls.lock().push(request.clone());

        if let Some((ref entered, ref release)) = self.gate {
            let _ = entered.send(());
            release.notified().await;
        }

        let fail_with = *self.fail_with.lock();
        match fail_with {
            Some(status) => Err(OndcError::Http {
                status,
                message: "mock runner unavailable".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn session(&self, session_id: &str) -> OndcResult<SessionData> {
        self.sessions
            .lock()
            .get(session_id)
            .cloned()
            .ok_or_else(|| OndcError::not_found(format!("session {}", session_id)))
    }

    async fn flow_map(&self, _session_id: &str, transaction_id: &str) -> OndcResult<FlowMap> {
        self.flows
            .lock()
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| OndcError::not_found(format!("transaction {}", transaction_id)))
    }
}

pub fn select_form() -> FormConfig {
    FormConfig::new(vec![
        FormField::new("item_id", "select").with_json_path("$.message.order.items[0].id"),
        FormField::new("quantity", "text")
            .with_json_path("$.message.order.items[0].quantity.selected.count"),
    ])
}

/// search/on_search done, select waiting on a form
pub fn flow_waiting_for_select(active_flow: &str) -> FlowMap {
    FlowMap::new(vec![
        Step::new("search", 0, "COMPLETE"),
        Step::new("on_search", 1, "COMPLETE").with_pair("search"),
        Step::new("select", 2, "INPUT-REQUIRED").with_input(select_form()),
    ])
    .with_active_flow(active_flow)
}

/// search/on_search done, confirm needs acknowledging with nothing to fill
pub fn flow_with_zero_field_step(active_flow: &str) -> FlowMap {
    FlowMap::new(vec![
        Step::new("search", 0, "COMPLETE"),
        Step::new("on_search", 1, "COMPLETE").with_pair("search"),
        Step::new("confirm", 2, "INPUT-REQUIRED").with_input(FormConfig::default()),
    ])
    .with_active_flow(active_flow)
}

/// on_search responding with force_proceed set
pub fn flow_forcing_proceed(active_flow: &str) -> FlowMap {
    FlowMap::new(vec![
        Step::new("search", 0, "COMPLETE"),
        Step::new("on_search", 1, "RESPONDING")
            .with_pair("search")
            .with_force_proceed(true),
    ])
    .with_active_flow(active_flow)
}
