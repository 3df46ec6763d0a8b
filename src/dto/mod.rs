//! Wire-format request and response shapes.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Commentary payloads.
pub mod commentary;
/// Health check payloads.
pub mod health;
/// Match payloads.
pub mod matches;
/// Validation helpers shared across DTOs.
pub mod validation;
/// WebSocket message shapes.
pub mod ws;

fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
