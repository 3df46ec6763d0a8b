//! Request and response shapes for commentary endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{dao::models::CommentaryRecord, dto::format_timestamp};

/// Payload used to append a commentary entry to a match.
#[serde_as]
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentaryRequest {
    /// Minute of play (number or numeric string).
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[validate(range(min = 0))]
    #[schema(value_type = Option<i32>)]
    pub minute: Option<i32>,
    /// Ordering hint within a minute (number or numeric string).
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[validate(range(min = 0))]
    #[schema(value_type = Option<i32>)]
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
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
    /// Free-form structured payload.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    /// Free-form tags.
    pub tags: Option<Vec<String>>,
}

/// Query parameters accepted when listing commentary.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentaryQuery {
    /// Maximum number of rows returned.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// A commentary entry as returned to clients and carried by broadcast events.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentarySummary {
    /// Stable entry identifier.
    pub id: i64,
    /// Identifier of the match this entry belongs to.
    pub match_id: i64,
    /// Minute of play.
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
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    /// Free-form tags.
    pub tags: Option<Vec<String>>,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

impl From<CommentaryRecord> for CommentarySummary {
    fn from(value: CommentaryRecord) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            minute: value.minute,
            sequence: value.sequence,
            period: value.period,
            event_type: value.event_type,
            actor: value.actor,
            team: value.team,
            message: value.message,
            metadata: value.metadata,
            tags: value.tags,
            created_at: format_timestamp(value.created_at),
        }
    }
}
