//! Entities shared between the storage backends and the service layer.

use time::OffsetDateTime;

use crate::state::phase::MatchPhase;

/// A tracked match as stored in persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Stable integer identifier allocated by the store.
    pub id: i64,
    /// Sport discipline (free-form, non-empty).
    pub sport: String,
    /// Home team display name.
    pub home_team: String,
    /// Away team display name.
    pub away_team: String,
    /// Persisted lifecycle phase.
    pub status: MatchPhase,
    /// Scheduled start of the match window.
    pub start_time: OffsetDateTime,
    /// Scheduled end of the match window.
    pub end_time: OffsetDateTime,
    /// Current home team score.
    pub home_score: i32,
    /// Current away team score.
    pub away_score: i32,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Fields required to create a match.
#[derive(Debug, Clone)]
pub struct NewMatch {
    /// Sport discipline.
    pub sport: String,
    /// Home team display name.
    pub home_team: String,
    /// Away team display name.
    pub away_team: String,
    /// Initial phase, derived from the window at creation time.
    pub status: MatchPhase,
    /// Scheduled start of the match window.
    pub start_time: OffsetDateTime,
    /// Scheduled end of the match window.
    pub end_time: OffsetDateTime,
    /// Initial home team score.
    pub home_score: i32,
    /// Initial away team score.
    pub away_score: i32,
}

/// Partial update applied to a stored match. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    /// New sport discipline.
    pub sport: Option<String>,
    /// New home team display name.
    pub home_team: Option<String>,
    /// New away team display name.
    pub away_team: Option<String>,
    /// New lifecycle phase.
    pub status: Option<MatchPhase>,
    /// New start of the match window.
    pub start_time: Option<OffsetDateTime>,
    /// New end of the match window.
    pub end_time: Option<OffsetDateTime>,
}

/// A commentary entry attached to a match.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentaryRecord {
    /// Stable integer identifier allocated by the store.
    pub id: i64,
    /// Identifier of the match this entry belongs to.
    pub match_id: i64,
    /// Minute of play the entry refers to.
    pub minute: Option<i32>,
    /// Ordering hint within a minute.
    pub sequence: Option<i32>,
    /// Period of play (e.g. "1st half").
    pub period: Option<String>,
    /// Kind of event (goal, card, substitution, ...).
    pub event_type: Option<String>,
    /// Player or official the entry is about.
    pub actor: Option<String>,
    /// Team the entry is about.
    pub team: Option<String>,
    /// Commentary text.
    pub message: String,
    /// Free-form structured payload attached by the writer.
    pub metadata: Option<serde_json::Value>,
    /// Free-form tags.
    pub tags: Option<Vec<String>>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Fields required to create a commentary entry.
#[derive(Debug, Clone)]
pub struct NewCommentary {
    /// Identifier of the match this entry belongs to.
    pub match_id: i64,
    /// Minute of play the entry refers to.
    pub minute: Option<i32>,
    /// Ordering hint within a minute.
    pub sequence: Option<i32>,
    /// Period of play.
    pub period: Option<String>,
    /// Kind of event.
    pub event_type: Option<String>,
    /// Player or official the entry is about.
    pub actor: Option<String>,
    /// Team the entry is about.
    pub team: Option<String>,
    /// Commentary text.
    pub message: String,
    /// Free-form structured payload.
    pub metadata: Option<serde_json::Value>,
    /// Free-form tags.
    pub tags: Option<Vec<String>>,
}
