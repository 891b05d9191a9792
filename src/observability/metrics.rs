//! Metrics collection.
//!
//! # Metrics
//! - `console_commands_total` (counter): dispatched lines by registered
//!   command name; unknown names share the `<unknown>` label
//! - `console_sessions_active` (gauge): open operator sessions
//! - `console_shutdown_triggers_total` (counter): rendezvous requests by
//!   reason and whether the slot accepted them

use metrics::{counter, gauge};

/// Label for lines whose first token resolved to no command.
pub const UNKNOWN_COMMAND: &str = "<unknown>";

/// Record one dispatched console line. `None` means the name was not found;
/// operator input never becomes a label value.
pub fn record_command(command: Option<&str>) {
    let command = command.unwrap_or(UNKNOWN_COMMAND).to_string();
    counter!("console_commands_total", "command" => command).increment(1);
}

/// Record an operator session opening (`true`) or closing (`false`).
pub fn record_session(opened: bool) {
    let g = gauge!("console_sessions_active");
    if opened {
        g.increment(1.0);
    } else {
        g.decrement(1.0);
    }
}

/// Record a shutdown request placed on (or bounced off) the rendezvous.
pub fn record_shutdown_trigger(reason: &'static str, accepted: bool) {
    counter!(
        "console_shutdown_triggers_total",
        "reason" => reason,
        "accepted" => if accepted { "true" } else { "false" }
    )
    .increment(1);
}
