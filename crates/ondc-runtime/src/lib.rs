//! ONDC Runtime - Flow sequencing and advancement engine
//!
//! Every time the session backend reports a new [`FlowMap`] snapshot the
//! engine recomputes, from scratch:
//!
//! - the request/response timeline ([`engine::resolve`])
//! - whether a human must fill a form first ([`engine::find_pending_input`])
//! - whether the flow should advance on its own ([`engine::should_auto_proceed`])
//!
//! The [`FlowGateway`] is the only component that calls the backend's
//! "proceed" endpoint. The [`FlowController`] ties the pieces together per
//! session: it numbers snapshots, discards superseded decisions and keeps at
//! most one proceed call in flight per flow.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ondc_core::{EngineConfig, FlowMap};
//! use ondc_runtime::{FlowController, HttpFlowBackend, InMemoryDirectory, TracingNotifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let backend = Arc::new(HttpFlowBackend::new(&config.backend)?);
//! let directory = Arc::new(InMemoryDirectory::new());
//! directory.upsert("session-1", "flow-1", "txn-1");
//!
//! let controller = FlowController::new("session-1", directory, backend, Arc::new(TracingNotifier));
//! let snapshot = FlowMap::from_json_str(r#"{"sequence": [], "activeFlow": "flow-1"}"#)?;
//! let (evaluation, _outcome) = controller.on_snapshot("flow-1", &snapshot).await;
//! println!("{} timeline rows", evaluation.timeline.len());
//! # Ok(())
//! # }
//! ```
//!
//! [`FlowMap`]: ondc_core::FlowMap

pub mod backend;
pub mod controller;
pub mod directory;
pub mod engine;
pub mod gateway;
pub mod notify;

pub use backend::{FlowBackend, HttpFlowBackend, ProceedRequest, SessionData};
pub use controller::{AutoAction, AutoReason, DispatchOutcome, Evaluation, FlowController};
pub use directory::{InMemoryDirectory, TransactionDirectory};
pub use engine::{find_pending_input, resolve, should_auto_proceed, PendingInput};
pub use gateway::{AdvanceOutcome, FlowGateway};
pub use notify::{ChannelNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
