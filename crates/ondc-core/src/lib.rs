// ONDC Core - Foundation types for the ONDC workbench flow engine
//
// This crate holds the data shapes shared by the engine and its callers:
// protocol steps and flow maps as reported by the session backend, the input
// form descriptors that travel with them, and the typed form submissions sent
// back when a flow is advanced.

pub mod config;
pub mod error;
pub mod flow;
pub mod form;

// Re-export core types
pub use config::{BackendConfig, EngineConfig};
pub use error::{OndcError, OndcResult};
pub use flow::{FlowMap, PairedStep, Step, StepKey, StepStatus};
pub use form::{FieldValue, FormConfig, FormField, FormSubmission};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
