//! Terminal rendering for timelines, pending forms and notifications

use ondc_core::{PairedStep, Step, StepStatus};
use ondc_runtime::{
    AdvanceOutcome, DispatchOutcome, Notification, NotificationLevel, Notifier, PendingInput,
};

/// ANSI color codes for terminal styling
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

use colors::*;

/// Icon for a step status
pub fn status_icon(status: &StepStatus) -> &'static str {
    match status {
        StepStatus::Complete => "●",
        StepStatus::Responding => "◉",
        StepStatus::InputRequired => "◆",
        StepStatus::Other(tag) => {
            let tag = tag.to_ascii_uppercase();
            if tag.contains("FAIL") || tag.contains("ERROR") {
                "✖"
            } else if tag.contains("SKIP") || tag.contains("MISS") {
                "◌"
            } else {
                "○"
            }
        }
    }
}

fn render_step(step: &Step) -> String {
    format!(
        "{} {} #{} ({})",
        status_icon(&step.status),
        step.action_id,
        step.index,
        step.status
    )
}

/// One line per timeline row, pairs joined by a double arrow
pub fn render_timeline(rows: &[PairedStep]) -> String {
    if rows.is_empty() {
        return "(no steps)".to_string();
    }

    rows.iter()
        .map(|row| match row.second {
            Some(ref second) => format!("{}  ⇄  {}", render_step(&row.first), render_step(second)),
            None => render_step(&row.first),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Describe what the flow is waiting on, if anything
pub fn render_pending(pending: &PendingInput) -> Option<String> {
    let step = pending.step.as_ref()?;

    if pending.should_auto_submit {
        return Some(format!("{} needs no input, acknowledging", step));
    }

    let form = pending.form_config.as_ref()?;
    let mut lines = vec![format!("{} is waiting for input:", step)];
    for field in form.visible_fields() {
        let label = field.label.as_deref().unwrap_or(&field.name);
        let mut line = format!("  • {} [{}]", label, field.kind);
        if field.name != label {
            line.push_str(&format!(" name={}", field.name));
        }
        if !field.options.is_empty() {
            let options: Vec<String> = field
                .options
                .iter()
                .map(|o| o.as_str().map(str::to_string).unwrap_or_else(|| o.to_string()))
                .collect();
            line.push_str(&format!(" options: {}", options.join(", ")));
        }
        lines.push(line);
    }
    Some(lines.join("\n"))
}

/// Short description of a dispatch result
pub fn render_outcome(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Idle => "nothing to send".to_string(),
        DispatchOutcome::Superseded => "superseded by a newer snapshot".to_string(),
        DispatchOutcome::Busy => "another proceed call is in flight".to_string(),
        DispatchOutcome::Unresolved => "no transaction id for this flow yet".to_string(),
        DispatchOutcome::Completed(AdvanceOutcome::Advanced) => "flow advanced".to_string(),
        DispatchOutcome::Completed(AdvanceOutcome::Rejected(e)) => format!("rejected: {}", e),
        DispatchOutcome::Completed(AdvanceOutcome::Failed(e)) => format!("failed: {}", e),
    }
}

/// Section header in bold cyan
pub fn header(title: &str) -> String {
    format!("{}{}━━━ {} ━━━{}", BOLD, CYAN, title, RESET)
}

/// Prints notifications to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let (color, icon) = match n.level {
            NotificationLevel::Info => (GREEN, "ℹ"),
            NotificationLevel::Warning => (YELLOW, "⚠"),
            NotificationLevel::Error => (RED, "✗"),
        };
        eprintln!(
            "{}{} {}{}: {} {}{}{}",
            color,
            icon,
            n.title,
            RESET,
            n.message,
            DIM,
            n.timestamp.format("%H:%M:%S"),
            RESET
        );
    }
}
