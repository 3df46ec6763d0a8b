//! Match lifecycle phase and the pure resolver deriving it from wall-clock time.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

/// Lifecycle phase of a match, derived from its scheduled window.
///
/// Phases are totally ordered in time (`scheduled → live → finished`) and
/// `Finished` is absorbing: the status sync job never re-evaluates a match
/// once it reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchPhase {
    /// The match has not started yet.
    Scheduled,
    /// The match is currently in progress.
    Live,
    /// The match window has elapsed.
    Finished,
}

impl MatchPhase {
    /// Canonical lowercase string form, matching the wire and storage format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Scheduled => "scheduled",
            MatchPhase::Live => "live",
            MatchPhase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the phase of a match from its window and a reference instant.
///
/// The end boundary is inclusive: a match whose `end` equals `now` is
/// already finished.
pub fn resolve_phase(start: OffsetDateTime, end: OffsetDateTime, now: OffsetDateTime) -> MatchPhase {
    if now < start {
        MatchPhase::Scheduled
    } else if now < end {
        MatchPhase::Live
    } else {
        MatchPhase::Finished
    }
}

/// Derive the phase from raw RFC 3339 strings.
///
/// Returns `None` when either instant cannot be parsed, independent of the
/// other value. Used by the write path, which receives the window as request
/// strings; the status sync job works on already-typed instants via
/// [`resolve_phase`].
pub fn resolve_phase_str(start: &str, end: &str, now: OffsetDateTime) -> Option<MatchPhase> {
    let start = OffsetDateTime::parse(start, &Rfc3339).ok()?;
    let end = OffsetDateTime::parse(end, &Rfc3339).ok()?;
    Some(resolve_phase(start, end, now))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const PAST: &str = "2020-01-01T00:00:00Z";
    const FUTURE: &str = "2030-01-01T00:00:00Z";
    const FAR_FUTURE: &str = "2035-01-01T00:00:00Z";

    fn reference_now() -> OffsetDateTime {
        datetime!(2025-06-01 00:00:00 UTC)
    }

    #[test]
    fn scheduled_when_now_is_before_start() {
        assert_eq!(
            resolve_phase_str(FUTURE, FAR_FUTURE, reference_now()),
            Some(MatchPhase::Scheduled)
        );
    }

    #[test]
    fn live_when_now_is_inside_the_window() {
        assert_eq!(
            resolve_phase_str(PAST, FAR_FUTURE, reference_now()),
            Some(MatchPhase::Live)
        );
    }

    #[test]
    fn finished_when_now_is_after_end() {
        assert_eq!(
            resolve_phase_str(PAST, "2024-01-01T00:00:00Z", reference_now()),
            Some(MatchPhase::Finished)
        );
    }

    #[test]
    fn finished_when_now_equals_end() {
        let end = datetime!(2025-06-01 00:00:00 UTC);
        assert_eq!(
            resolve_phase(datetime!(2020-01-01 00:00:00 UTC), end, end),
            MatchPhase::Finished
        );
    }

    #[test]
    fn live_when_now_equals_start() {
        let start = reference_now();
        assert_eq!(
            resolve_phase(start, datetime!(2035-01-01 00:00:00 UTC), start),
            MatchPhase::Live
        );
    }

    #[test]
    fn invalid_start_yields_none() {
        assert_eq!(resolve_phase_str("not-a-date", FUTURE, reference_now()), None);
    }

    #[test]
    fn invalid_end_yields_none() {
        assert_eq!(resolve_phase_str(PAST, "not-a-date", reference_now()), None);
    }

    #[test]
    fn both_invalid_yields_none() {
        assert_eq!(resolve_phase_str("bad", "bad", reference_now()), None);
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatchPhase::Scheduled).unwrap(),
            "\"scheduled\""
        );
        assert_eq!(
            serde_json::from_str::<MatchPhase>("\"finished\"").unwrap(),
            MatchPhase::Finished
        );
    }
}
