//! WebSocket message shapes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{commentary::CommentarySummary, matches::MatchSummary},
    state::subscriptions::MatchKey,
};

/// Match identifier as sent by clients: either a JSON string or a number.
///
/// Both forms normalize to the same [`MatchKey`], so `7` and `"7"` subscribe
/// to the same match.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMatchId {
    /// String form, used verbatim after trimming.
    Text(String),
    /// Numeric form, converted to its decimal string.
    Number(serde_json::Number),
}

impl RawMatchId {
    /// Canonical subscription key, or `None` when the value is empty after
    /// trimming.
    pub fn normalize(&self) -> Option<MatchKey> {
        match self {
            RawMatchId::Text(raw) => MatchKey::normalize(raw),
            RawMatchId::Number(number) => MatchKey::normalize(&number.to_string()),
        }
    }
}

/// Control messages accepted from WebSocket clients.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Start receiving match-scoped events for a match.
    Subscribe {
        /// Target match identifier.
        #[serde(rename = "matchId")]
        #[schema(value_type = String)]
        match_id: RawMatchId,
    },
    /// Stop receiving match-scoped events for a match.
    Unsubscribe {
        /// Target match identifier.
        #[serde(rename = "matchId")]
        #[schema(value_type = String)]
        match_id: RawMatchId,
    },
    /// Any unrecognized message type; silently discarded.
    #[serde(other)]
    Unknown,
}

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once immediately after a connection is accepted.
    Welcome,
    /// Unicast acknowledgment of a subscribe command.
    Subscribed {
        /// Normalized key the client is now subscribed to.
        #[serde(rename = "matchId")]
        match_id: String,
    },
    /// Unicast acknowledgment of an unsubscribe command.
    Unsubscribed {
        /// Normalized key the client is no longer subscribed to.
        #[serde(rename = "matchId")]
        match_id: String,
    },
    /// Global broadcast: a match was created.
    MatchCreated {
        /// The stored match.
        data: MatchSummary,
    },
    /// Global broadcast: a match score changed.
    ScoreUpdate {
        /// The updated match.
        data: MatchSummary,
    },
    /// Global broadcast: a match transitioned to a new lifecycle phase.
    StatusChange {
        /// The updated match.
        data: MatchSummary,
    },
    /// Match-scoped broadcast: a commentary entry was added.
    CommentaryAdded {
        /// The stored commentary entry.
        data: CommentarySummary,
    },
}
