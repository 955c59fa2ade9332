//! Snapshot evaluation - pure functions of a FlowMap
//!
//! None of these functions perform I/O or keep state between calls; callers
//! re-run them for every snapshot the backend reports.

pub mod detector;
pub mod resolver;
pub mod trigger;

pub use detector::{find_pending_input, PendingInput};
pub use resolver::resolve;
pub use trigger::{force_proceed_step, should_auto_proceed};
