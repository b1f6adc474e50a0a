//! Error severity policy
//!
//! How a rejection affects the connection that caused it:
//!
//! | Severity      | Notice | Counted | Closes                       |
//! |---------------|--------|---------|------------------------------|
//! | `Security`    | yes    | no      | always                       |
//! | `Recoverable` | yes    | yes     | when the limit is reached    |
//! | `Routing`     | yes    | no      | never                        |
//!
//! Fatal transport errors never reach this module; the reactor drops the
//! connection directly.

use std::fmt;

use tracing::{debug, warn};

use crate::connection::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Identity spoofing
    Security,
    /// Malformed or invalid content
    Recoverable,
    /// Missing, unknown, or self destination
    Routing,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorSeverity::Security => "security",
            ErrorSeverity::Recoverable => "recoverable",
            ErrorSeverity::Routing => "routing",
        };
        f.write_str(name)
    }
}

/// Render the notice a peer receives
pub fn error_notice(text: &str) -> String {
    format!("ERROR|{}|", text)
}

/// Apply the policy for `severity` to `connection` and queue the notice.
///
/// The notice is queued before the connection is marked for closure so the
/// reactor never sees an empty queue on a closing connection too early.
pub fn report_error(connection: &Connection, text: &str, severity: ErrorSeverity) {
    let (notice, close) = match severity {
        ErrorSeverity::Security => {
            warn!(id = %connection.id(), reason = %text, "Security violation, closing connection");
            (error_notice(text), true)
        }
        ErrorSeverity::Recoverable => {
            let tally = connection.increment_error_count();
            if tally.limit_reached() {
                warn!(
                    id = %connection.id(),
                    reason = %text,
                    errors = tally.count,
                    "Error limit reached, closing connection"
                );
                let text = format!("{} (error limit reached: {}/{})", text, tally.count, tally.limit);
                (error_notice(&text), true)
            } else {
                debug!(id = %connection.id(), reason = %text, errors = tally.count, "Rejected message");
                let text = format!("{} (error {}/{})", text, tally.count, tally.limit);
                (error_notice(&text), false)
            }
        }
        ErrorSeverity::Routing => {
            debug!(id = %connection.id(), reason = %text, "Routing failure");
            (error_notice(text), false)
        }
    };

    if let Err(e) = connection.queue_message(&notice) {
        warn!(id = %connection.id(), error = %e, "Could not queue error notice");
    }
    if close {
        connection.mark_for_closure();
    }
    connection.request_write();
}
